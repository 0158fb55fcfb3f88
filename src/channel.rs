//! Per-channel domain types.
//!
//! The device drives exactly three light sources. Each one is addressed
//! by a [`ChannelId`] (1–3 on the wire, 0–2 as an array index) and owns
//! a [`ChannelState`]: commanded intensity, latest sensor snapshot and
//! latched alarm.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Number of independently controlled light channels.
pub const CHANNEL_COUNT: usize = 3;

/// Highest accepted intensity percentage.
pub const MAX_INTENSITY: u8 = 100;

// ---------------------------------------------------------------------------
// Channel identity
// ---------------------------------------------------------------------------

/// Validated channel identifier. Construction is the only place the
/// 1–3 range is checked; everything downstream indexes without bounds
/// surprises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u8);

impl ChannelId {
    pub const ALL: [ChannelId; CHANNEL_COUNT] = [ChannelId(1), ChannelId(2), ChannelId(3)];

    /// Validate a wire id. Fails with [`Error::InvalidChannel`] outside 1–3.
    pub fn new(id: u8) -> Result<Self, Error> {
        if (1..=CHANNEL_COUNT as u8).contains(&id) {
            Ok(Self(id))
        } else {
            Err(Error::InvalidChannel)
        }
    }

    /// Wire id (1–3).
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Zero-based array index (0–2).
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "light_{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Alarm kind
// ---------------------------------------------------------------------------

/// Latched safety-fault state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    #[default]
    None,
    OverCurrent,
    OverTemperature,
}

impl AlarmKind {
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "no alarm"),
            Self::OverCurrent => write!(f, "over current"),
            Self::OverTemperature => write!(f, "over temperature"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor snapshot
// ---------------------------------------------------------------------------

/// One current + temperature sample for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorReading {
    /// Emitter current (mA).
    pub current_ma: f32,
    /// Emitter temperature (°C).
    pub temperature_c: f32,
}

impl SensorReading {
    pub const fn new(current_ma: f32, temperature_c: f32) -> Self {
        Self {
            current_ma,
            temperature_c,
        }
    }
}

// ---------------------------------------------------------------------------
// Channel state
// ---------------------------------------------------------------------------

/// The most recent alarm transition of a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripRecord {
    pub kind: AlarmKind,
    /// Current (mA) or temperature (°C), whichever tripped.
    pub value: f32,
    /// Uptime at the moment of the trip.
    pub at_ms: u64,
}

/// Everything the supervisor tracks for one channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelState {
    /// Commanded intensity, 0–100 %. Forced to 0 when an alarm trips.
    pub intensity: u8,
    /// Most recent sensor sample. Overwritten on every refresh.
    pub reading: SensorReading,
    /// Latched alarm. Cleared only by an explicit, re-checked clear.
    pub alarm: AlarmKind,
    /// Kept after the alarm is cleared.
    pub last_trip: Option<TripRecord>,
    /// Number of None→active transitions since boot.
    pub trip_count: u32,
}
