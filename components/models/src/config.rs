//! Engine configuration.
//!
//! The only knob is the cadence of observer delivery. Hosts pick it; the
//! engine never sniffs its environment.

use async_runtime::{EventLoop, TickMode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Environment variable read by [`Config::from_env`].
pub const TICK_MODE_VAR: &str = "MODELS_TICK_MODE";

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The tick mode was not recognised
    #[error("invalid tick mode: {0}")]
    InvalidTickMode(String),
    /// The document was not valid JSON for a config
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Engine configuration.
///
/// # Examples
///
/// ```
/// use models::Config;
/// use async_runtime::TickMode;
///
/// let config = Config::from_json(r#"{ "tick_mode": "frame" }"#).unwrap();
/// assert_eq!(config.tick_mode, TickMode::Frame);
/// assert_eq!(Config::default().tick_mode, TickMode::Immediate);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// When flushes run: on the next immediate tick or the next frame
    pub tick_mode: TickMode,
}

impl Config {
    /// Read `MODELS_TICK_MODE`. Unset means the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(TICK_MODE_VAR) {
            Ok(raw) => Self::from_tick_mode(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Parse a tick mode name (`immediate`, `timer`, `frame`,
    /// `animation-frame`).
    pub fn from_tick_mode(raw: &str) -> Result<Self, ConfigError> {
        let tick_mode = raw
            .trim()
            .parse::<TickMode>()
            .map_err(|_| ConfigError::InvalidTickMode(raw.to_string()))?;
        Ok(Config { tick_mode })
    }

    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Apply `config` to this thread's event loop.
pub fn configure(config: &Config) {
    debug!(tick_mode = %config.tick_mode, "configuring event loop");
    EventLoop::current().set_mode(config.tick_mode);
}
