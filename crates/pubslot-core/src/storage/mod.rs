mod config;
pub mod database;
pub mod lock;

pub use config::{Config, OwnerConfig, SchedulerConfig};
pub use database::{ItemRecord, ItemStore, StatusCounts, STATUS_FUTURE, STATUS_PUBLISHED};
pub use lock::RunLock;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the pubslot data directory, creating it if needed.
///
/// `PUBSLOT_HOME` wins when set. Otherwise `~/.config/pubslot[-dev]/`,
/// with `PUBSLOT_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("PUBSLOT_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("PUBSLOT_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pubslot-dev")
            } else {
                base_dir.join("pubslot")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
