mod org;
pub use org::Org;
pub use org::ORG_LOADER;

mod utils;
pub use utils::format_path;
pub use utils::format_path_with_template;
pub use utils::full_git_url_parse;
pub use utils::package_path_from_git_url;
pub use utils::package_path_from_handle;
pub use utils::package_root_path;
pub use utils::path_entry_config;
pub use utils::safe_git_url_parse;
pub use utils::safe_normalize_url;

mod updater;
pub use updater::auto_path_update;
pub use updater::auto_update_on_command_not_found;
pub use updater::exec_update;
pub use updater::exec_update_and_log_on_error;
pub use updater::update_git_repo;
