mod root;
pub(crate) use root::config;
pub(crate) use root::flush_config;
pub(crate) use root::global_config;

mod askpass;
pub(crate) use askpass::AskPassConfig;

mod cache;
pub(crate) use cache::CacheConfig;

mod cd;
pub(crate) use cd::CdConfig;

mod clone;
pub(crate) use clone::CloneConfig;

mod command_definition;
pub(crate) use command_definition::CommandDefinition;
pub(crate) use command_definition::CommandSyntax;
pub(crate) use command_definition::SyntaxOptArg;

mod config_commands;
pub(crate) use config_commands::ConfigCommandsConfig;

mod env;
pub(crate) use env::EnvConfig;
pub(crate) use env::EnvOperationConfig;
pub(crate) use env::EnvOperationEnum;

mod github;
pub(crate) use github::GithubAuthConfig;
pub(crate) use github::GithubConfig;

mod makefile_commands;
pub(crate) use makefile_commands::MakefileCommandsConfig;

mod match_skip_prompt_if_config;
pub(crate) use match_skip_prompt_if_config::MatchSkipPromptIfConfig;

mod omniconfig;
pub(crate) use omniconfig::OmniConfig;

mod org;
pub(crate) use org::OrgConfig;

mod path;
pub(crate) use path::PathConfig;
pub(crate) use path::PathEntryConfig;

mod path_repo_updates;
pub(crate) use path_repo_updates::PathRepoUpdatesConfig;

mod prompts;
pub(crate) use prompts::PromptsConfig;

mod shell_aliases;

pub(crate) use shell_aliases::ShellAliasesConfig;

mod suggest_clone;
pub(crate) use suggest_clone::SuggestCloneConfig;

mod suggest_config;
pub(crate) use suggest_config::SuggestConfig;

mod up_command;
pub(crate) use up_command::UpCommandConfig;
