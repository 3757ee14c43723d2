//! TOML-based engine configuration.
//!
//! Stores operational tunables:
//! - the weekly-shift soft limit enforced by the conflict checker
//! - the monitor refresh interval driven by the embedding application
//!
//! Configuration is stored at `~/.config/guardpost/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::storage::data_dir;

/// Assignment rule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentConfig {
    /// Weekly shift count at which a new assignment requires explicit
    /// confirmation. Advisory, never a hard block.
    #[serde(default = "default_weekly_soft_limit")]
    pub weekly_soft_limit: usize,
}

/// Monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// How often the embedding application should call `tick()`.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/guardpost/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assignment: AssignmentConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

fn default_weekly_soft_limit() -> usize {
    5
}
fn default_refresh_interval_secs() -> u64 {
    30
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            weekly_soft_limit: default_weekly_soft_limit(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assignment: AssignmentConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl Config {
    /// Path to the config file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed, or
    /// if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }
}
