//! Controller configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Logging configuration, used by the replay binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Whether log lines should be emitted as JSON
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Subtitle controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    /// Drive the native text tracks of the attached surface
    pub render_natively: bool,

    /// Show the selected track (`showing`) instead of only enabling it (`hidden`)
    pub display: bool,

    /// Poll interval for surfaces without text track change notifications
    pub poll_interval_ms: u64,

    /// Request partial segments when deriving delivery directives
    pub low_latency_mode: bool,

    /// Auto-select tracks flagged DEFAULT until the user picks one
    pub select_default_track: bool,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            render_natively: true,
            display: true,
            poll_interval_ms: 500,
            low_latency_mode: true,
            select_default_track: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl SubtitleConfig {
    /// Native text track poll interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: SubtitleConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}
