//! Safety limits.
//!
//! Pure threshold evaluation used by the channel supervisor after every
//! sensor refresh.
//!
//! ## Alarm lifecycle
//!
//! 1. A refresh produces a reading outside the current or temperature
//!    window (strict comparison, no entry hysteresis).
//! 2. The supervisor latches the returned [`AlarmKind`], forces the
//!    channel intensity to 0 and commands the actuator to 0.
//! 3. The alarm stays latched while readings recover; only an explicit
//!    clear request re-checks a fresh reading and unlatches it.
//! 4. Clearing never restores the previous intensity.
//!
//! Current is checked first, so a reading violating both windows
//! reports `OverCurrent`.

use crate::channel::{AlarmKind, SensorReading};
use crate::config::SystemConfig;

/// Allowed operating window for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyLimits {
    pub current_min_ma: f32,
    pub current_max_ma: f32,
    pub temp_min_c: f32,
    pub temp_max_c: f32,
}

impl SafetyLimits {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            current_min_ma: config.current_min_ma,
            current_max_ma: config.current_max_ma,
            temp_min_c: config.temp_min_c,
            temp_max_c: config.temp_max_c,
        }
    }

    /// Classify a reading. Returns [`AlarmKind::None`] when both axes are
    /// inside their windows. NaN readings fail the range check and trip.
    pub fn evaluate(&self, reading: &SensorReading) -> AlarmKind {
        if !self.current_ok(reading.current_ma) {
            AlarmKind::OverCurrent
        } else if !self.temperature_ok(reading.temperature_c) {
            AlarmKind::OverTemperature
        } else {
            AlarmKind::None
        }
    }

    /// Reading that is reported for a given alarm kind.
    pub fn trip_value(kind: AlarmKind, reading: &SensorReading) -> f32 {
        match kind {
            AlarmKind::OverTemperature => reading.temperature_c,
            AlarmKind::OverCurrent | AlarmKind::None => reading.current_ma,
        }
    }

    fn current_ok(&self, current_ma: f32) -> bool {
        (self.current_min_ma..=self.current_max_ma).contains(&current_ma)
    }

    fn temperature_ok(&self, temperature_c: f32) -> bool {
        (self.temp_min_c..=self.temp_max_c).contains(&temperature_c)
    }
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self::new(&SystemConfig::default())
    }
}
