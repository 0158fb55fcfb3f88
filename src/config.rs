//! System configuration parameters
//!
//! All tunable parameters for the light controller. The safety
//! thresholds are configuration rather than constants because board
//! revisions disagree on them; there is no runtime reconfiguration
//! command, the values are fixed at boot.

use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Current limits (per channel, mA) ---
    /// Lowest plausible channel current; anything below trips OverCurrent.
    pub current_min_ma: f32,
    /// Maximum allowed channel current.
    pub current_max_ma: f32,

    // --- Temperature limits (per channel, Celsius) ---
    pub temp_min_c: f32,
    /// Maximum allowed emitter temperature before thermal cutoff.
    pub temp_max_c: f32,

    // --- Timing ---
    /// Period of the sensor refresh / alarm evaluation loop (milliseconds)
    pub refresh_interval_ms: u32,
    /// Delay between the `system.reset` response and the restart (milliseconds)
    pub reset_grace_ms: u32,
    /// Upper bound on a single serial transmit (milliseconds)
    pub tx_timeout_ms: u32,

    // --- Protocol ---
    /// Most error-log entries returned by one `system.get_error_log`.
    pub error_log_read_max: u8,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Current
            current_min_ma: 0.0,
            current_max_ma: 50.0,

            // Temperature
            temp_min_c: 0.0,
            temp_max_c: 85.0,

            // Timing
            refresh_interval_ms: 100, // 10 Hz
            reset_grace_ms: 100,
            tx_timeout_ms: 1000,

            // Protocol
            error_log_read_max: 8,
        }
    }
}

impl SystemConfig {
    /// Range-check the configuration.
    ///
    /// Invalid values are rejected, never clamped: a bad threshold must
    /// not silently widen the safe operating window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = [
            self.current_min_ma,
            self.current_max_ma,
            self.temp_min_c,
            self.temp_max_c,
        ];
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::ValidationFailed("thresholds must be finite"));
        }
        if self.current_min_ma >= self.current_max_ma {
            return Err(ConfigError::ValidationFailed(
                "current_min_ma must be < current_max_ma",
            ));
        }
        if self.temp_min_c >= self.temp_max_c {
            return Err(ConfigError::ValidationFailed(
                "temp_min_c must be < temp_max_c",
            ));
        }
        if !(10..=10_000).contains(&self.refresh_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "refresh_interval_ms must be 10–10000",
            ));
        }
        if self.tx_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("tx_timeout_ms must be > 0"));
        }
        if self.error_log_read_max == 0 {
            return Err(ConfigError::ValidationFailed(
                "error_log_read_max must be > 0",
            ));
        }
        Ok(())
    }
}

/// Errors from [`SystemConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.validate().is_ok());
        assert!(c.current_max_ma > c.current_min_ma);
        assert!(c.temp_max_c > c.temp_min_c);
        assert!(c.refresh_interval_ms > 0);
    }

    #[test]
    fn inverted_current_window_rejected() {
        let c = SystemConfig {
            current_min_ma: 60.0,
            ..SystemConfig::default()
        };
        assert_eq!(
            c.validate(),
            Err(ConfigError::ValidationFailed(
                "current_min_ma must be < current_max_ma"
            ))
        );
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let c = SystemConfig {
            temp_max_c: f32::INFINITY,
            ..SystemConfig::default()
        };
        assert!(c.validate().is_err());

        let c = SystemConfig {
            current_max_ma: f32::NAN,
            ..SystemConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn zero_refresh_period_rejected() {
        let c = SystemConfig {
            refresh_interval_ms: 0,
            ..SystemConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert!((c.current_max_ma - c2.current_max_ma).abs() < 0.001);
        assert_eq!(c.refresh_interval_ms, c2.refresh_interval_ms);
        assert_eq!(c.error_log_read_max, c2.error_log_read_max);
    }
}
