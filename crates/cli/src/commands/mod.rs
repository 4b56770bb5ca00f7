pub mod config;
pub mod download;
pub mod info;
pub mod library;
pub mod lists;
pub mod progress;
pub mod read;
pub mod search;
pub mod settings;
pub mod stats;

pub use config::handle_config_command;
pub use download::handle_download_command;
pub use info::handle_info_command;
pub use library::handle_library_command;
pub use lists::handle_list_command;
pub use progress::{handle_continue_command, handle_history_command};
pub use read::handle_read_command;
pub use search::handle_search_command;
pub use settings::handle_settings_command;
pub use stats::handle_stats_command;
