//! Probe settings loaded from TOML.

use crate::engine::mp4::{MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Timeouts the analysis engine accepts, in seconds.
pub const TIMEOUT_RANGE: std::ops::RangeInclusive<u32> = MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(
        "timeout {0}s outside accepted range {min}..={max}",
        min = MIN_TIMEOUT_SECS,
        max = MAX_TIMEOUT_SECS
    )]
    InvalidTimeout(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Engine timeout in seconds
    pub timeout_secs: u32,
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Default log filter (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            timeout_secs: 10,
            pretty: true,
            log_level: "info".to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ProbeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !TIMEOUT_RANGE.contains(&self.timeout_secs) {
            return Err(ConfigError::InvalidTimeout(self.timeout_secs));
        }
        Ok(())
    }
}
