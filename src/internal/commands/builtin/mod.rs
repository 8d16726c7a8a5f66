pub mod cd;
pub use cd::CdCommand;

pub mod clone;
pub use clone::CloneCommand;

pub mod help;
pub use help::HelpCommand;

pub mod hook;
pub use hook::HookCommand;

pub mod scope;
pub use scope::ScopeCommand;

pub mod status;
pub use status::StatusCommand;

pub mod tidy;
pub use tidy::TidyCommand;

pub mod up;
pub use up::UpCommand;
