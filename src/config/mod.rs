//! Configuration module for roster
//!
//! Tunables for the record browser: debounce delay, page size, suggestion
//! cap and rollback policy. Configuration is read from the user's config
//! directory (`~/.config/roster/config.toml` on Linux) and can be
//! overridden with `ROSTER_*` environment variables.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Browser configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BrowserConfig {
    /// Delay between the last keystroke and the search fetch
    pub debounce_ms: u64,

    /// Records per page
    pub page_size: usize,

    /// Most suggestions shown under the search box
    pub max_suggestions: usize,

    /// Page buttons shown around the current page
    pub page_window: usize,

    /// How long error and success notifications stay visible
    pub notification_ttl_secs: u64,

    /// Refetch a group after any failed reorder, not only after conflicts
    pub refetch_on_rollback: bool,

    /// Page size used when loading a whole group for reordering
    pub group_fetch_limit: usize,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 450,
            page_size: 10,
            max_suggestions: 8,
            page_window: 5,
            notification_ttl_secs: 5,
            refetch_on_rollback: true,
            group_fetch_limit: 100,
        }
    }
}

impl BrowserConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;

        Ok(config_dir.join("roster").join("config.toml"))
    }

    /// Load configuration from the user config file, falling back to defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be parsed, or the
    /// resulting values are invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        Self::build(Some(config_path.as_path()).filter(|p| p.exists()))
    }

    /// Load configuration from an explicit file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, cannot be parsed, or the
    /// resulting values are invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Message(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        Self::build(Some(path))
    }

    fn build(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        let settings = builder
            .add_source(Environment::with_prefix("ROSTER").try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the directory cannot be created, the
    /// configuration cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Save configuration to the user config file
    ///
    /// # Errors
    ///
    /// See `save_to`.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::config_path()?)
    }

    /// Reject values the browser cannot work with
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("page_size", self.page_size),
            ("max_suggestions", self.max_suggestions),
            ("page_window", self.page_window),
            ("group_fetch_limit", self.group_fetch_limit),
        ];
        for (key, value) in checks {
            if value == 0 {
                return Err(ConfigError::Message(format!("{key} must be at least 1")));
            }
        }
        Ok(())
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub const fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs)
    }
}
