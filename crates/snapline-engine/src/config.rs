//! Engine configuration
//!
//! Loaded from TOML; every field has a default so an empty file (or no
//! file at all) is a valid configuration.
//!
//! ```toml
//! lock_timeout_ms = 500
//! log_profile = "production"
//! ```

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use snapline_core::errors::{ExError, ExErrorKind, ExResult};
use snapline_core::logging_facility::Profile;

/// Default bounded wait for snapshot and program locks
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Bounded wait for lock acquisition, also used as the SQLite busy timeout
    pub lock_timeout_ms: u64,
    pub log_profile: Profile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            log_profile: Profile::Development,
        }
    }
}

impl EngineConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// `InvalidInput` for malformed TOML, unknown keys or a zero timeout.
    pub fn from_toml_str(content: &str) -> ExResult<Self> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("config_load")
                .with_message(format!("Invalid engine configuration: {}", e))
        })?;

        if config.lock_timeout_ms == 0 {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("config_load")
                .with_message("lock_timeout_ms must be greater than zero"));
        }

        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as [`Self::from_toml_str`].
    pub fn load(path: &Path) -> ExResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("config_load")
                .with_message(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}
