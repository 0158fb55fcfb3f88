//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every alarm transition to the
//! ESP-IDF logger (console UART / USB-CDC), independent of whether the
//! command link delivered the event frame.

use log::error;

use crate::app::events::AlarmEvent;
use crate::app::ports::EventSink;
use crate::rpc::wire::format_uptime;

/// Adapter that logs every [`AlarmEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AlarmEvent) {
        error!(
            "ALARM | {} | {} | value={:.2} | t={} | output disabled",
            event.channel,
            event.kind,
            event.value,
            format_uptime(event.timestamp_ms),
        );
    }
}
