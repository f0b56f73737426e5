//! Configuration types for Tapedeck

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::matcher::MatchConfig;
use crate::storage::CassetteStore;
use crate::{Result, TapedeckError};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for storing/loading cassettes
    pub cassette_dir: PathBuf,
    /// Which request dimensions participate in matching
    #[serde(default)]
    pub match_on: MatchConfig,
    /// Per-request timeout for live forwards, in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TapedeckError::Config(format!("failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| TapedeckError::Config(format!("failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.cassette_dir.as_os_str().is_empty() {
            return Err(TapedeckError::Config(
                "cassette_dir cannot be empty".to_string(),
            ));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(TapedeckError::Config(
                "request_timeout_secs must be > 0 when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Cassette store rooted at the configured directory
    #[must_use]
    pub fn store(&self) -> CassetteStore {
        CassetteStore::new(&self.cassette_dir)
    }

    /// Configured per-request timeout, if any
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
