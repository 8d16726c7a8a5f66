pub(crate) mod askpass;
pub(crate) use askpass::AskPassListener;
pub(crate) use askpass::AskPassRequest;

mod command_ext;
pub(crate) use command_ext::CommandExt;

pub(crate) mod directory;
pub(crate) use directory::cleanup_path;
pub(crate) use directory::data_path_dir_hash;
pub(crate) use directory::force_remove_dir_all;
pub(crate) use directory::get_config_mod_times;

mod listener_manager;
pub(crate) use listener_manager::EventHandlerFn;
pub(crate) use listener_manager::Listener;
pub(crate) use listener_manager::ListenerManager;

mod fifo_handler;
pub(crate) use fifo_handler::FifoReader;

pub(crate) mod print_progress_handler;
pub(crate) use print_progress_handler::PrintProgressHandler;

pub(crate) mod progress_handler;
pub(crate) use progress_handler::get_command_output;
pub(crate) use progress_handler::run_command_with_handler;
pub(crate) use progress_handler::run_progress;
pub(crate) use progress_handler::ProgressHandler;

pub(crate) mod run_config;
pub(crate) use run_config::RunConfig;

pub(crate) mod shims;
pub(crate) use shims::handle_shims;
pub(crate) use shims::reshim;

pub(crate) mod spinner_progress_handler;
pub(crate) use spinner_progress_handler::SpinnerProgressHandler;

pub(crate) mod up_progress_handler;
pub(crate) use up_progress_handler::SyncUpdateInit;
pub(crate) use up_progress_handler::SyncUpdateInitOption;
pub(crate) use up_progress_handler::SyncUpdateListener;
pub(crate) use up_progress_handler::SyncUpdateOperation;
pub(crate) use up_progress_handler::UpProgressHandler;

pub(crate) mod version;
pub(crate) use version::VersionMatcher;
pub(crate) use version::VersionParser;
pub(crate) use version::VersionParserOptions;

pub(crate) mod void_progress_handler;
#[allow(unused_imports)]
pub(crate) use void_progress_handler::VoidProgressHandler;
