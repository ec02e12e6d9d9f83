mod config;
pub mod database;

pub use config::Config;
pub use database::{Activity, Database, FocusSessionRecord};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/coindrop[-dev]/` based on COINDROP_ENV.
///
/// Set COINDROP_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("COINDROP_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("coindrop-dev")
    } else {
        base_dir.join("coindrop")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
