//! Periodic refresh loop.
//!
//! Each tick re-reads every channel, lets the supervisor evaluate and
//! latch alarms, then diffs the result against the previous tick. An
//! [`AlarmEvent`] goes out once per trip: a channel is reported when its
//! trip counter moved since the last tick, so a channel that trips and
//! stays tripped produces exactly one event, and a trip caused by a
//! command between two ticks is reported on the next one.
//!
//! Events are emitted after the supervisor lock is released, so a slow
//! serial sink never blocks command handling.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::channel::{AlarmKind, CHANNEL_COUNT, ChannelId};

use super::events::AlarmEvent;
use super::ports::{Clock, ErrorLogPort, EventSink, LightPort};
use super::supervisor::SharedSupervisor;

/// Alarm view of one channel as seen at the end of a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Seen {
    alarm: AlarmKind,
    trips: u32,
}

pub struct RefreshLoop {
    period_ms: u32,
    previous: [Seen; CHANNEL_COUNT],
    ticks: u64,
}

impl RefreshLoop {
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            previous: [Seen::default(); CHANNEL_COUNT],
            ticks: 0,
        }
    }

    /// Run one refresh tick. Returns the number of events emitted.
    pub fn tick<H, L, C>(
        &mut self,
        supervisor: &SharedSupervisor<H, L, C>,
        sink: &mut impl EventSink,
    ) -> usize
    where
        H: LightPort,
        L: ErrorLogPort,
        C: Clock,
    {
        self.ticks += 1;

        let (result, snapshot) = supervisor.with(|s| {
            let result = s.refresh_all();
            let snapshot = ChannelId::ALL.map(|id| *s.channel(id));
            (result, snapshot)
        });
        if let Err(e) = result {
            // Logged once per tick; healthy channels were still evaluated.
            warn!("Refresh tick {}: sensor read failed: {}", self.ticks, e);
        }

        let mut emitted = 0;
        for (id, state) in ChannelId::ALL.into_iter().zip(snapshot) {
            let prev = self.previous[id.index()];

            if state.trip_count != prev.trips {
                if let Some(trip) = state.last_trip {
                    sink.emit(&AlarmEvent {
                        channel: id,
                        kind: trip.kind,
                        value: trip.value,
                        timestamp_ms: trip.at_ms,
                    });
                    emitted += 1;
                }
            } else if prev.alarm.is_active() && !state.alarm.is_active() {
                info!("{}: alarm no longer latched", id);
            }

            self.previous[id.index()] = Seen {
                alarm: state.alarm,
                trips: state.trip_count,
            };
        }
        emitted
    }

    /// Tick forever at the configured period.
    pub fn run<H, L, C>(
        mut self,
        supervisor: &SharedSupervisor<H, L, C>,
        sink: &mut impl EventSink,
        delay: &mut impl DelayNs,
    ) -> !
    where
        H: LightPort,
        L: ErrorLogPort,
        C: Clock,
    {
        info!("Refresh loop started ({} ms period)", self.period_ms);
        loop {
            self.tick(supervisor, sink);
            delay.delay_ms(self.period_ms);
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}
