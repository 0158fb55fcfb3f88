//! RPC inter-task communication channel.
//!
//! Uses an `embassy-sync` bounded channel to bridge the UART receive
//! callback with the command task. The callback only frames bytes and
//! enqueues complete lines; parsing and dispatch happen on the consumer
//! side, so no parser state is shared with the receive context.
//!
//! ```text
//! ┌──────────────┐  LineFrame  ┌──────────────┐
//! │ RX callback  │────────────▶│ Command task │
//! │ (LineDecoder)│             │ (CommandEngine)
//! └──────────────┘             └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use log::warn;

use super::codec::{LineDecoder, MAX_LINE_SIZE};

/// One complete inbound line, terminator stripped.
pub type LineFrame = Vec<u8, MAX_LINE_SIZE>;

/// Channel depth for inbound lines.
pub const FRAME_DEPTH: usize = 4;

pub type FrameChannel = Channel<CriticalSectionRawMutex, LineFrame, FRAME_DEPTH>;

/// Inbound line channel: RX callback → command task.
pub static FRAME_CHANNEL: FrameChannel = Channel::new();

/// Producer half owned by the receive context.
pub struct FrameProducer<'a> {
    decoder: LineDecoder,
    channel: &'a FrameChannel,
    overruns: u32,
}

impl<'a> FrameProducer<'a> {
    pub fn new(channel: &'a FrameChannel) -> Self {
        Self {
            decoder: LineDecoder::new(),
            channel,
            overruns: 0,
        }
    }

    /// Feed one received byte. A completed line is enqueued without
    /// blocking; if the queue is full the line is dropped.
    pub fn on_byte(&mut self, byte: u8) {
        let Some(line) = self.decoder.push(byte) else {
            return;
        };
        let Ok(frame) = LineFrame::from_slice(line) else {
            return;
        };
        if self.channel.try_send(frame).is_err() {
            self.overruns = self.overruns.wrapping_add(1);
            warn!("Command queue full, dropping line ({} total)", self.overruns);
        }
    }

    pub fn on_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.on_byte(b);
        }
    }

    pub fn overruns(&self) -> u32 {
        self.overruns
    }
}
