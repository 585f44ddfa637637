mod config;
pub mod database;
mod memory;
pub mod migrations;
mod store;

pub use config::{ActivityConfig, Config};
pub use database::Database;
pub use memory::MemoryStore;
pub use store::{InsertOutcome, RewardStore};

use std::path::PathBuf;

/// Returns `~/.config/pacepoint[-dev]/` based on PACEPOINT_ENV.
///
/// Set PACEPOINT_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("PACEPOINT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pacepoint-dev")
    } else {
        base_dir.join("pacepoint")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
