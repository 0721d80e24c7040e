//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{CellsyncError, Result};
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(CellsyncError::UserError)` - Parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            CellsyncError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from `path`, falling back to defaults when the file is absent.
    ///
    /// A file that exists but fails to parse or validate is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty map
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| {
                CellsyncError::UserError(format!("failed to parse config YAML: {}", e))
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            CellsyncError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `lock_stale_minutes` must be positive
    /// - `lock_poll_interval_ms` must be positive
    /// - `lock_max_poll_interval_ms` must be at least `lock_poll_interval_ms`
    /// - `cell_id_prefix` must be non-empty lowercase ASCII alphanumerics
    pub fn validate(&self) -> Result<()> {
        if self.lock_stale_minutes == 0 {
            return Err(CellsyncError::UserError(
                "config validation failed: lock_stale_minutes must be greater than 0".to_string(),
            ));
        }

        if self.lock_poll_interval_ms == 0 {
            return Err(CellsyncError::UserError(
                "config validation failed: lock_poll_interval_ms must be greater than 0"
                    .to_string(),
            ));
        }

        if self.lock_max_poll_interval_ms < self.lock_poll_interval_ms {
            return Err(CellsyncError::UserError(format!(
                "config validation failed: lock_max_poll_interval_ms ({}) must be >= lock_poll_interval_ms ({})",
                self.lock_max_poll_interval_ms, self.lock_poll_interval_ms
            )));
        }

        if self.cell_id_prefix.is_empty()
            || !self
                .cell_id_prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(CellsyncError::UserError(format!(
                "config validation failed: cell_id_prefix must be lowercase alphanumeric (found '{}')",
                self.cell_id_prefix
            )));
        }

        Ok(())
    }

    /// Default timeout for blocking lock acquisition.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }
}
