pub mod cache;
pub mod config;
pub mod read;
pub mod utils;

pub use cache::{handle_cache_command, CacheCommands};
pub use config::{handle_config_command, ConfigCommands};
pub use read::{handle_read_command, ReadArgs};
