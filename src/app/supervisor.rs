//! Channel supervisor — the safety core.
//!
//! [`ChannelSupervisor`] owns the per-channel state (intensity, sensor
//! snapshot, latched alarm) and is the only code that commands a PWM
//! duty. Every call that needs a sensor value refreshes it first, then
//! evaluates the safety window, then decides about actuation:
//!
//! ```text
//!   read_channel_sensors ──▶ SafetyLimits::evaluate ──▶ set_channel_duty
//! ```
//!
//! The command task and the refresh loop share one supervisor through
//! [`SharedSupervisor`]; the mutex is held for a whole operation so the
//! refresh → evaluate → actuate sequence is never interleaved.

use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, error, info, warn};

use crate::channel::{
    AlarmKind, CHANNEL_COUNT, ChannelId, ChannelState, MAX_INTENSITY, SensorReading, TripRecord,
};
use crate::config::SystemConfig;
use crate::error::{Error, Result};
use crate::safety::SafetyLimits;

use super::events::{AlarmEvent, ErrorLogEntry};
use super::ports::{Clock, ErrorLogPort, LightPort};

// ───────────────────────────────────────────────────────────────
// ChannelSupervisor
// ───────────────────────────────────────────────────────────────

pub struct ChannelSupervisor<H, L, C> {
    hw: H,
    log: L,
    clock: C,
    limits: SafetyLimits,
    channels: [ChannelState; CHANNEL_COUNT],
}

impl<H: LightPort, L: ErrorLogPort, C: Clock> ChannelSupervisor<H, L, C> {
    /// Build the supervisor and drive every channel to 0 %.
    ///
    /// A channel whose actuator refuses the initial 0 is logged and left
    /// at intensity 0; the next successful command retries it.
    pub fn new(config: &SystemConfig, mut hw: H, log: L, clock: C) -> Self {
        for id in ChannelId::ALL {
            if let Err(e) = hw.set_channel_duty(id, 0) {
                warn!("{}: initial duty 0 failed: {}", id, e);
            }
        }
        info!(
            "Supervisor ready: current {:.1}–{:.1} mA, temperature {:.1}–{:.1} °C",
            config.current_min_ma, config.current_max_ma, config.temp_min_c, config.temp_max_c
        );
        Self {
            hw,
            log,
            clock,
            limits: SafetyLimits::new(config),
            channels: [ChannelState::default(); CHANNEL_COUNT],
        }
    }

    // ── Actuation ─────────────────────────────────────────────

    /// Set one channel's intensity.
    ///
    /// Fails with `InvalidParameter` above 100 % and `AlarmActive` while
    /// the channel is latched. A fresh reading that trips the alarm also
    /// fails with `AlarmActive`; the actuator is then left at 0.
    pub fn set_intensity(&mut self, id: ChannelId, pct: u8) -> Result<()> {
        if pct > MAX_INTENSITY {
            return Err(Error::InvalidParameter);
        }
        if self.channels[id.index()].alarm.is_active() {
            return Err(Error::AlarmActive);
        }

        self.refresh_channel(id)?;
        if self.channels[id.index()].alarm.is_active() {
            return Err(Error::AlarmActive);
        }

        self.hw.set_channel_duty(id, pct)?;
        self.channels[id.index()].intensity = pct;
        debug!("{} intensity {}%", id, pct);
        Ok(())
    }

    /// Set all three intensities.
    ///
    /// Validation is all-or-nothing. Actuation is best effort: latched
    /// channels are skipped, a hardware failure on one channel does not
    /// stop the others, and channels that succeeded are not rolled back.
    /// The first hardware error is returned.
    pub fn set_all_intensities(&mut self, pcts: [u8; CHANNEL_COUNT]) -> Result<()> {
        if pcts.iter().any(|&p| p > MAX_INTENSITY) {
            return Err(Error::InvalidParameter);
        }

        let mut first_err = None;
        for (id, pct) in ChannelId::ALL.into_iter().zip(pcts) {
            if let Err(e) = self.actuate_unless_alarmed(id, pct) {
                warn!("{}: set_all failed: {}", id, e);
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn actuate_unless_alarmed(&mut self, id: ChannelId, pct: u8) -> Result<()> {
        if self.channels[id.index()].alarm.is_active() {
            debug!("{}: skipped, alarm latched", id);
            return Ok(());
        }
        self.refresh_channel(id)?;
        if self.channels[id.index()].alarm.is_active() {
            return Ok(());
        }
        self.hw.set_channel_duty(id, pct)?;
        self.channels[id.index()].intensity = pct;
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn get_intensity(&self, id: ChannelId) -> u8 {
        self.channels[id.index()].intensity
    }

    pub fn get_all_intensities(&self) -> [u8; CHANNEL_COUNT] {
        self.channels.map(|c| c.intensity)
    }

    pub fn get_alarm_status(&self) -> [AlarmKind; CHANNEL_COUNT] {
        self.channels.map(|c| c.alarm)
    }

    /// Fresh sensor sample for one channel. Hardware errors propagate.
    pub fn get_sensor_data(&mut self, id: ChannelId) -> Result<SensorReading> {
        self.refresh_channel(id)?;
        Ok(self.channels[id.index()].reading)
    }

    /// Fresh samples for all channels. Every channel is read even if an
    /// earlier one fails; the first failure is returned.
    pub fn get_all_sensor_data(&mut self) -> Result<[SensorReading; CHANNEL_COUNT]> {
        self.refresh_all()?;
        Ok(self.channels.map(|c| c.reading))
    }

    pub fn channel(&self, id: ChannelId) -> &ChannelState {
        &self.channels[id.index()]
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    // ── Alarm handling ────────────────────────────────────────

    /// Unlatch a channel's alarm after re-checking a fresh reading.
    ///
    /// Fails with `AlarmStillActive` while the reading is outside the
    /// window. The channel stays at 0 % afterwards.
    pub fn clear_alarm(&mut self, id: ChannelId) -> Result<()> {
        self.refresh_channel(id)?;
        let ch = &mut self.channels[id.index()];
        if self.limits.evaluate(&ch.reading).is_active() {
            return Err(Error::AlarmStillActive);
        }
        if ch.alarm.is_active() {
            info!("{}: {} cleared", id, ch.alarm);
            ch.alarm = AlarmKind::None;
        }
        Ok(())
    }

    /// Refresh and evaluate every channel. Best effort: a failed read on
    /// one channel does not skip the others.
    pub fn refresh_all(&mut self) -> Result<()> {
        let mut first_err = None;
        for id in ChannelId::ALL {
            if let Err(e) = self.refresh_channel(id) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Read one channel's sensors, store the reading and evaluate it.
    fn refresh_channel(&mut self, id: ChannelId) -> Result<()> {
        let reading = self.hw.read_channel_sensors(id)?;
        self.channels[id.index()].reading = reading;

        let kind = self.limits.evaluate(&reading);
        if kind.is_active() && !self.channels[id.index()].alarm.is_active() {
            self.trip(id, kind, reading);
        }
        Ok(())
    }

    /// Latch `kind` and cut the output in the same step.
    fn trip(&mut self, id: ChannelId, kind: AlarmKind, reading: SensorReading) {
        let record = TripRecord {
            kind,
            value: SafetyLimits::trip_value(kind, &reading),
            at_ms: self.clock.now_ms(),
        };

        let ch = &mut self.channels[id.index()];
        ch.alarm = kind;
        ch.intensity = 0;
        ch.last_trip = Some(record);
        ch.trip_count = ch.trip_count.wrapping_add(1);

        if let Err(e) = self.hw.set_channel_duty(id, 0) {
            error!("{}: failed to force output off: {}", id, e);
        }
        error!(
            "{}: {} ({:.2}), output disabled",
            id, kind, record.value
        );

        let event = AlarmEvent {
            channel: id,
            kind,
            value: record.value,
            timestamp_ms: record.at_ms,
        };
        if let Err(e) = self.log.append(&ErrorLogEntry::from(&event)) {
            warn!("{}: error log append failed: {}", id, e);
        }
    }

    // ── Error log access ──────────────────────────────────────

    pub fn error_count(&self) -> usize {
        self.log.count()
    }

    pub fn error_log(&self, max: usize) -> Vec<ErrorLogEntry> {
        self.log.read(max)
    }

    pub fn clear_error_log(&mut self) -> Result<()> {
        self.log.clear().map_err(|e| {
            warn!("Error log clear failed: {}", e);
            Error::DeviceError
        })
    }
}

// ───────────────────────────────────────────────────────────────
// SharedSupervisor
// ───────────────────────────────────────────────────────────────

/// Cloneable handle shared by the command task and the refresh loop.
pub struct SharedSupervisor<H, L, C> {
    inner: Arc<Mutex<ChannelSupervisor<H, L, C>>>,
}

impl<H, L, C> Clone for SharedSupervisor<H, L, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H, L, C> SharedSupervisor<H, L, C> {
    pub fn new(supervisor: ChannelSupervisor<H, L, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(supervisor)),
        }
    }

    /// Run `f` with exclusive access to the supervisor.
    ///
    /// A poisoned lock is taken over: every mutation is a plain field
    /// store after validation, so a panicking holder leaves no torn state.
    pub fn with<R>(&self, f: impl FnOnce(&mut ChannelSupervisor<H, L, C>) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
