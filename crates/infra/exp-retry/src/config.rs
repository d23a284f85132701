use std::env::VarError;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::timer::{DEFAULT_INITIAL_INTERVAL, DEFAULT_MULTIPLIER, ExpTimer};

/// Environment variable overriding the initial interval, in milliseconds
pub const ENV_INTERVAL_MS: &str = "EXP_RETRY_INTERVAL_MS";
/// Environment variable overriding the multiplier
pub const ENV_MULTIPLIER: &str = "EXP_RETRY_MULTIPLIER";

/// Settings for an [`ExpTimer`]
///
/// Deserializes from any serde format; missing fields fall back to the
/// defaults (500ms, 1.5).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    interval_ms: u64,
    multiplier: f64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            interval_ms: u64::try_from(DEFAULT_INITIAL_INTERVAL.as_millis()).unwrap_or(u64::MAX),
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl TimerConfig {
    /// Creates a configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings overridden by the environment
    ///
    /// Reads:
    /// - `EXP_RETRY_INTERVAL_MS` for the initial interval in milliseconds
    /// - `EXP_RETRY_MULTIPLIER` for the growth factor
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but unparsable, or if the
    /// resulting settings fail [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(v) = env_override(ENV_INTERVAL_MS)? {
            cfg.interval_ms = v.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Env {
                    var: ENV_INTERVAL_MS,
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(v) = env_override(ENV_MULTIPLIER)? {
            cfg.multiplier = v.trim().parse().map_err(|e: std::num::ParseFloatError| {
                ConfigError::Env {
                    var: ENV_MULTIPLIER,
                    reason: e.to_string(),
                }
            })?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Sets the initial interval, truncated to whole milliseconds
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the growth factor
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Initial interval
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Growth factor
    #[must_use]
    pub const fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Checks that the multiplier is finite and at least 1.0.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Multiplier`] otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.multiplier.is_finite() && self.multiplier >= 1.0 {
            Ok(())
        } else {
            Err(ConfigError::Multiplier(self.multiplier))
        }
    }

    /// Validates the settings and builds a timer.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate).
    pub fn build(&self) -> Result<ExpTimer, ConfigError> {
        self.validate()?;
        Ok(ExpTimer::from_config(self))
    }
}

// Unset is `None`; set but not valid UTF-8 is an error, not a silent default.
fn env_override(var: &'static str) -> Result<Option<String>, ConfigError> {
    match std::env::var(var) {
        Ok(v) => Ok(Some(v)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(ConfigError::Env {
            var,
            reason: format!("not valid UTF-8: {}", raw.to_string_lossy()),
        }),
    }
}
