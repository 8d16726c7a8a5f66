pub mod config_value;
pub use config_value::ConfigExtendStrategy;
pub use config_value::ConfigSource;
pub use config_value::ConfigValue;

pub mod loader;
pub use loader::config_loader;
pub use loader::flush_config_loader;
pub use loader::global_config_loader;
pub use loader::ConfigLoader;

pub mod parser;
pub use parser::config;
pub use parser::flush_config;
pub use parser::global_config;
pub use parser::CacheConfig;
pub use parser::CdConfig;
pub use parser::CommandDefinition;
pub use parser::CommandSyntax;
pub use parser::ConfigCommandsConfig;
pub use parser::MakefileCommandsConfig;
pub use parser::MatchSkipPromptIfConfig;
pub use parser::OmniConfig;
pub use parser::OrgConfig;
pub use parser::PathConfig;
pub use parser::PathRepoUpdatesConfig;
pub use parser::PathRepoUpdatesPerRepoConfig;
pub use parser::PathRepoUpdatesSelfUpdateEnum;
pub use parser::SyntaxOptArg;

pub mod up;
pub use up::UpConfig;
pub use up::UpConfigAsdfBase;
pub use up::UpConfigBundler;
pub use up::UpConfigCustom;
pub use up::UpConfigHomebrew;
pub use up::UpConfigTool;
