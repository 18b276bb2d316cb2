//! User configuration file support for traceview.
//!
//! Loads configuration from `traceview/config.toml` in the platform config
//! directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// User-level configuration loaded from `config.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ViewerConfig {
    /// Root directory holding one subdirectory per project
    pub projects_dir: Option<PathBuf>,
    /// Log level filter (e.g. "warn", "traceview=debug")
    pub log_level: Option<String>,
    /// Console log format: pretty, json or compact
    pub log_format: Option<String>,
    /// Directory for rotated log files; file logging is off when unset
    pub log_dir: Option<PathBuf>,
}

/// The config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default log level when neither flag nor config sets one
pub const DEFAULT_LOG_LEVEL: &str = "warn";

impl ViewerConfig {
    /// Path of the config file in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("traceview").join(CONFIG_FILE_NAME))
    }

    /// Load configuration from `path`.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: ViewerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(config))
    }

    /// Get the effective projects directory.
    /// Priority: flag > config > None (store default)
    pub fn projects_dir(&self, flag: Option<&Path>) -> Option<PathBuf> {
        flag.map(Path::to_path_buf).or_else(|| self.projects_dir.clone())
    }

    /// Get the effective log level.
    /// Priority: flag > config > DEFAULT_LOG_LEVEL
    pub fn log_level<'a>(&'a self, flag: Option<&'a str>) -> &'a str {
        flag.or(self.log_level.as_deref()).unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Get the effective log format name.
    /// Priority: flag > config > None
    pub fn log_format<'a>(&'a self, flag: Option<&'a str>) -> Option<&'a str> {
        flag.or(self.log_format.as_deref())
    }
}
