//! TOML-based application configuration.
//!
//! Stores the fixed catalogs and thresholds the app ships with:
//! - Monitoring window bounds (daily, midnight to 23:59 by default)
//! - Wallet minimum balance and deposit presets
//! - The priced unlock-option catalog
//!
//! Configuration is stored at `~/.config/timebank/config.toml`.

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::monitor::DailyWindow;
use crate::wallet::UnlockOption;
use std::path::PathBuf;

/// Monitoring window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default)]
    pub start_hour: u8,
    #[serde(default)]
    pub start_minute: u8,
    #[serde(default = "default_end_hour")]
    pub end_hour: u8,
    #[serde(default = "default_end_minute")]
    pub end_minute: u8,
}

/// Wallet configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Below this balance the app steers the user to a deposit first.
    #[serde(default = "default_minimum_balance")]
    pub minimum_balance: f64,
    #[serde(default = "default_deposit_presets")]
    pub deposit_presets: Vec<f64>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/timebank/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    /// Priced durations offered on the unlock screen.
    #[serde(default = "default_unlock_options")]
    pub unlock_options: Vec<UnlockOption>,
}

fn default_end_hour() -> u8 {
    23
}
fn default_end_minute() -> u8 {
    59
}
fn default_minimum_balance() -> f64 {
    1.0
}
fn default_deposit_presets() -> Vec<f64> {
    vec![5.0, 10.0, 20.0]
}
fn default_unlock_options() -> Vec<UnlockOption> {
    vec![
        UnlockOption::new(5, 0.25),
        UnlockOption::new(15, 0.50),
        UnlockOption::new(30, 1.00),
    ]
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start_hour: 0,
            start_minute: 0,
            end_hour: default_end_hour(),
            end_minute: default_end_minute(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            minimum_balance: default_minimum_balance(),
            deposit_presets: default_deposit_presets(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            wallet: WalletConfig::default(),
            unlock_options: default_unlock_options(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// The recurring observation window limits are monitored under.
    pub fn monitoring_window(&self) -> DailyWindow {
        DailyWindow {
            start: (self.window.start_hour, self.window.start_minute),
            end: (self.window.end_hour, self.window.end_minute),
            repeats: true,
        }
    }
}
