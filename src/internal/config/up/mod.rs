pub mod base;
pub use base::UpConfig;

pub mod tool;
pub use tool::UpConfigTool;

pub mod bundler;
pub use bundler::UpConfigBundler;

pub mod custom;
pub use custom::UpConfigCustom;

pub mod golang;
pub use golang::UpConfigGolang;

pub mod nodejs;
pub use nodejs::UpConfigNodejs;

pub mod homebrew;
pub use homebrew::UpConfigHomebrew;

pub mod asdf_base;
pub use asdf_base::UpConfigAsdfBase;
pub use asdf_base::ASDF_BIN;
pub use asdf_base::ASDF_PATH;

pub mod error;
pub use error::UpError;

pub mod utils;
pub use utils::run_progress;
pub use utils::ProgressHandler;
pub use utils::SpinnerProgressHandler;
