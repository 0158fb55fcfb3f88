//! Outbound application events.
//!
//! The refresh loop emits [`AlarmEvent`]s through the
//! [`EventSink`](super::ports::EventSink) port; the supervisor appends an
//! [`ErrorLogEntry`] for every alarm transition through
//! [`ErrorLogPort`](super::ports::ErrorLogPort).

use serde::{Deserialize, Serialize};

use crate::channel::{AlarmKind, ChannelId};

/// A None→active alarm transition on one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmEvent {
    pub channel: ChannelId,
    pub kind: AlarmKind,
    /// Current (mA) for `OverCurrent`, temperature (°C) for `OverTemperature`.
    pub value: f32,
    /// Uptime at which the alarm tripped.
    pub timestamp_ms: u64,
}

/// What the firmware did in response to a logged fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    /// Output forced to 0 and held until an explicit clear.
    Disabled,
}

/// Persisted record of one alarm transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub timestamp_ms: u64,
    /// Wire channel id (1–3).
    pub channel: u8,
    pub kind: AlarmKind,
    pub value: f32,
    pub action: LogAction,
}

impl From<&AlarmEvent> for ErrorLogEntry {
    fn from(ev: &AlarmEvent) -> Self {
        Self {
            timestamp_ms: ev.timestamp_ms,
            channel: ev.channel.get(),
            kind: ev.kind,
            value: ev.value,
            action: LogAction::Disabled,
        }
    }
}
