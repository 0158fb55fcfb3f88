//! Command engine — the consumer side of the frame queue.
//!
//! Each inbound line passes through the same pipeline:
//!
//! 1. **Envelope**: [`parse_request`]; anything that is not a `cmd`
//!    object is dropped without a reply.
//! 2. **Dispatch**: [`CommandRouter::dispatch`] yields exactly one reply.
//! 3. **Encode + transmit**: the reply is size-guarded and written with
//!    the configured transmit timeout.
//! 4. **Post action**: `system.reset` restarts the device only after
//!    its reply has been handed to the UART and a grace delay elapsed.

use embedded_hal::delay::DelayNs;
use futures_lite::future::block_on;
use log::{debug, info, warn};

use crate::app::ports::{Clock, ErrorLogPort, LightPort, SerialPort, SystemPort};
use crate::config::SystemConfig;
use crate::error::Error;

use super::channels::FrameChannel;
use super::router::{CommandRouter, PostAction};
use super::wire::{encode_response, parse_request};

/// What happened to one inbound line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// Not a command envelope; no reply.
    Discarded,
    /// Reply produced (and transmitted unless the UART failed).
    Replied,
    /// Reply produced and a restart was triggered.
    Restarted,
}

pub struct CommandEngine<H, L, C, S, T> {
    router: CommandRouter<H, L, C, S>,
    serial: T,
    tx_timeout_ms: u32,
    reset_grace_ms: u32,
    replies: u32,
    discarded: u32,
    tx_failures: u32,
}

impl<H, L, C, S, T> CommandEngine<H, L, C, S, T>
where
    H: LightPort,
    L: ErrorLogPort,
    C: Clock,
    S: SystemPort,
    T: SerialPort,
{
    pub fn new(router: CommandRouter<H, L, C, S>, serial: T, config: &SystemConfig) -> Self {
        Self {
            router,
            serial,
            tx_timeout_ms: config.tx_timeout_ms,
            reset_grace_ms: config.reset_grace_ms,
            replies: 0,
            discarded: 0,
            tx_failures: 0,
        }
    }

    /// Process one complete line.
    pub fn handle_line(&mut self, line: &[u8], delay: &mut impl DelayNs) -> Handled {
        let Some(req) = parse_request(line) else {
            self.discarded = self.discarded.wrapping_add(1);
            debug!("RPC: discarded {} byte non-command line", line.len());
            return Handled::Discarded;
        };

        let outcome = self.router.dispatch(&req);
        self.replies = self.replies.wrapping_add(1);

        match encode_response(&req, outcome.reply) {
            Ok(frame) => {
                if let Err(e) = self.serial.transmit(&frame, self.tx_timeout_ms) {
                    self.tx_failures = self.tx_failures.wrapping_add(1);
                    let err = Error::from(e);
                    warn!(
                        "RPC[{}]: reply not sent: {}{}",
                        req.id,
                        err,
                        if err.is_transient() { " (transient)" } else { "" }
                    );
                }
            }
            Err(e) => warn!("RPC[{}]: reply encode failed: {}", req.id, e),
        }

        match outcome.post {
            PostAction::None => Handled::Replied,
            PostAction::Restart => {
                delay.delay_ms(self.reset_grace_ms);
                info!("Restarting device");
                self.router.system().restart();
                Handled::Restarted
            }
        }
    }

    /// Block on the frame queue forever, handling each line in order.
    pub fn run(mut self, channel: &FrameChannel, delay: &mut impl DelayNs) -> ! {
        info!("Command engine started");
        loop {
            let frame = block_on(channel.receive());
            self.handle_line(&frame, delay);
        }
    }

    pub fn replies(&self) -> u32 {
        self.replies
    }

    pub fn discarded(&self) -> u32 {
        self.discarded
    }

    pub fn tx_failures(&self) -> u32 {
        self.tx_failures
    }
}
