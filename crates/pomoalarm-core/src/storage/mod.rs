mod config;
pub mod database;
mod records;
pub mod tables;

pub use config::{Config, DataConfig, DefaultsConfig, LogConfig};
pub use database::Database;
pub use tables::{IndexDef, Table};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `POMOALARM_DATA_DIR` wins when set. Otherwise `~/.config/pomoalarm[-dev]/`
/// depending on `POMOALARM_ENV` (set it to `dev` for a development copy).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMOALARM_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMOALARM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomoalarm-dev")
            } else {
                base_dir.join("pomoalarm")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
