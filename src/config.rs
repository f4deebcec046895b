//! Replay configuration
//!
//! Loaded from a JSON file; every field has a default so an empty object is
//! a valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::IsolationMode;
use crate::scenario::Severity;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("base_interval_ms must be > 0")]
    ZeroInterval,

    #[error("{field} must be a positive, finite number (got {value})")]
    InvalidSpeed { field: &'static str, value: f64 },

    #[error("min_speed ({min}) is greater than max_speed ({max})")]
    SpeedBoundsInverted { min: f64, max: f64 },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read(_) => "TXR_CONFIG_READ",
            Self::Parse(_) => "TXR_CONFIG_PARSE",
            Self::ZeroInterval => "TXR_CONFIG_ZERO_INTERVAL",
            Self::InvalidSpeed { .. } => "TXR_CONFIG_INVALID_SPEED",
            Self::SpeedBoundsInverted { .. } => "TXR_CONFIG_SPEED_BOUNDS",
        }
    }

    /// Playback cannot start without a valid configuration.
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

/// Playback and replay defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Mode used when neither the caller nor the scenario picks one
    #[serde(default)]
    pub default_isolation: IsolationMode,

    /// Wall-clock time between ticks at speed 1.0 (default: 1200ms)
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,

    /// Initial speed multiplier (default: 1.0)
    #[serde(default = "default_speed")]
    pub speed: f64,

    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Whether annotated key moments pause autoplay (default: true)
    #[serde(default = "default_pause_at_key_moments")]
    pub pause_at_key_moments: bool,
}

fn default_base_interval_ms() -> u64 {
    1200
}

fn default_speed() -> f64 {
    1.0
}

fn default_min_speed() -> f64 {
    0.25
}

fn default_max_speed() -> f64 {
    4.0
}

fn default_pause_at_key_moments() -> bool {
    true
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            default_isolation: IsolationMode::default(),
            base_interval_ms: default_base_interval_ms(),
            speed: default_speed(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            pause_at_key_moments: default_pause_at_key_moments(),
        }
    }
}

impl ReplayConfig {
    /// Load configuration from a JSON file and validate it
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        let config: ReplayConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        for (field, value) in [
            ("speed", self.speed),
            ("min_speed", self.min_speed),
            ("max_speed", self.max_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidSpeed { field, value });
            }
        }
        if self.min_speed > self.max_speed {
            return Err(ConfigError::SpeedBoundsInverted {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        Ok(())
    }

    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    /// Clamps a requested speed into the configured bounds.
    ///
    /// Non-finite or non-positive requests fall back to the minimum.
    /// Inverted bounds resolve to `max_speed` instead of panicking.
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        if !speed.is_finite() || speed <= 0.0 {
            return self.min_speed;
        }
        speed.max(self.min_speed).min(self.max_speed)
    }

    /// Builder-style override of the initial speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }
}
