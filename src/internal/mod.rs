pub(crate) mod utils;

pub mod cache;
pub use cache::get_cache;
pub use cache::Cache;

pub mod commands;
pub use commands::command_loader;
pub use commands::Command;
pub use commands::OMNIPATH;

pub mod config;
pub use config::config;
pub use config::config_loader;
pub use config::CacheConfig;
pub use config::CdConfig;
pub use config::CommandDefinition;
pub use config::CommandSyntax;
pub use config::ConfigCommandsConfig;
pub use config::ConfigExtendStrategy;
pub use config::ConfigLoader;
pub use config::ConfigSource;
pub use config::ConfigValue;
pub use config::MakefileCommandsConfig;
pub use config::MatchSkipPromptIfConfig;
pub use config::OmniConfig;
pub use config::OrgConfig;
pub use config::PathConfig;
pub use config::PathRepoUpdatesConfig;
pub use config::PathRepoUpdatesPerRepoConfig;
pub use config::SyntaxOptArg;
pub use config::UpConfig;
pub use config::UpConfigAsdfBase;
pub use config::UpConfigBundler;
pub use config::UpConfigCustom;
pub use config::UpConfigHomebrew;
pub use config::UpConfigTool;

pub mod env;
pub use env::git_env;
pub use env::workdir;
pub use env::workdir_or_init;
pub use env::ENV;
pub use env::GIT_ENV;

pub mod git;
pub use git::Org;
pub use git::ORG_LOADER;

pub mod user_interface;
pub use user_interface::StringColor;

pub mod dynenv;
