mod config;
pub mod keys;
pub mod store;

pub use config::{Config, WalletConfig, WindowConfig};
pub use store::SharedStore;

use std::path::PathBuf;

/// Returns `~/.config/timebank[-dev]/` based on TIMEBANK_ENV.
///
/// Set TIMEBANK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TIMEBANK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("timebank-dev")
    } else {
        base_dir.join("timebank")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
