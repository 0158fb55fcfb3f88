//! Serial event sink adapter.
//!
//! Implements [`EventSink`] by encoding each [`AlarmEvent`] as an
//! unsolicited `alarm.triggered` frame and writing it to the command
//! UART. This is the "push" direction: the host learns about a trip
//! without polling.
//!
//! A reply in flight on the same UART delays the event rather than
//! losing it; the transmit timeout bounds that wait.

use log::{debug, warn};

use crate::app::events::AlarmEvent;
use crate::app::ports::{EventSink, SerialPort};
use crate::rpc::wire::encode_alarm_event;

pub struct SerialEventSink<T> {
    serial: T,
    tx_timeout_ms: u32,
    next_id: u32,
    sent: u32,
    dropped: u32,
}

impl<T: SerialPort> SerialEventSink<T> {
    pub fn new(serial: T, tx_timeout_ms: u32) -> Self {
        Self {
            serial,
            tx_timeout_ms,
            next_id: 1,
            sent: 0,
            dropped: 0,
        }
    }

    fn alloc_event_id(&mut self) -> heapless::String<16> {
        let mut id = heapless::String::new();
        let _ = core::fmt::Write::write_fmt(&mut id, format_args!("evt-{}", self.next_id));
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<T: SerialPort> EventSink for SerialEventSink<T> {
    fn emit(&mut self, event: &AlarmEvent) {
        let id = self.alloc_event_id();
        let frame = match encode_alarm_event(&id, event) {
            Ok(frame) => frame,
            Err(e) => {
                self.dropped = self.dropped.wrapping_add(1);
                warn!("Event {}: encode failed: {}", id, e);
                return;
            }
        };
        match self.serial.transmit(&frame, self.tx_timeout_ms) {
            Ok(()) => {
                self.sent = self.sent.wrapping_add(1);
                debug!("Event {} sent ({} bytes)", id, frame.len());
            }
            Err(e) => {
                self.dropped = self.dropped.wrapping_add(1);
                warn!("Event {} for {} not sent: {}", id, event.channel, e);
            }
        }
    }
}
