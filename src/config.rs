//! Engine configuration
//!
//! Reading speed and tick period are design parameters rather than literals.
//! Defaults match comprehension-paced reading (160 WPM) and a one-second tick.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ReadingError;

/// Default reading rate in words per minute
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 160;

/// Default tick period in milliseconds
pub const DEFAULT_TICK_PERIOD_MS: u64 = 1000;

/// Configuration shared by the estimator and the timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    /// Words read per minute when deriving an estimate from text
    pub words_per_minute: u32,
    /// Interval between timer ticks (milliseconds); each tick is one elapsed second
    pub tick_period_ms: u64,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
        }
    }
}

impl ReadingConfig {
    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ReadingError> {
        let config: ReadingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ReadingError> {
        serde_json::to_string_pretty(self).map_err(|e| ReadingError::EncodingError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ReadingError> {
        if self.words_per_minute == 0 {
            tracing::warn!("rejecting config with words_per_minute = 0");
            return Err(ReadingError::InvalidConfig(
                "words_per_minute must be greater than zero".to_string(),
            ));
        }
        if self.tick_period_ms == 0 {
            tracing::warn!("rejecting config with tick_period_ms = 0");
            return Err(ReadingError::InvalidConfig(
                "tick_period_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}
