pub(crate) mod base;
pub(crate) use base::HookCommand;

pub(crate) mod env;
pub(crate) use env::HookEnvCommand;

pub(crate) mod init;
pub(crate) use init::HookInitCommand;

pub(crate) mod uuid;
pub(crate) use uuid::HookUuidCommand;
