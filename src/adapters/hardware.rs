//! Hardware adapter, bridging the light peripherals to [`LightPort`].
//!
//! On ESP-IDF each channel is one LEDC output plus two ADC1 inputs
//! (current sense, NTC), all configured by `hw_init`. This is the only
//! module that touches them. On other targets a per-channel simulation
//! stands in; tests inject readings and failures through the `sim_*`
//! methods.

#[cfg(target_os = "espidf")]
use log::debug;

use crate::app::ports::LightPort;
use crate::channel::{ChannelId, SensorReading};
#[cfg(not(target_os = "espidf"))]
use crate::channel::CHANNEL_COUNT;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::HalError;
#[cfg(target_os = "espidf")]
use crate::pins;
#[cfg(target_os = "espidf")]
use crate::sensors;

/// Simulated state of one channel.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, Copy)]
struct SimChannel {
    duty: u8,
    reading: SensorReading,
    write_fault: Option<HalError>,
    read_fault: Option<HalError>,
}

#[cfg(not(target_os = "espidf"))]
impl Default for SimChannel {
    fn default() -> Self {
        Self {
            duty: 0,
            reading: SensorReading::new(0.0, 25.0),
            write_fault: None,
            read_fault: None,
        }
    }
}

/// Concrete [`LightPort`] for the three-channel board.
pub struct HardwareAdapter {
    #[cfg(not(target_os = "espidf"))]
    sim: [SimChannel; CHANNEL_COUNT],
    #[cfg(not(target_os = "espidf"))]
    writes: usize,
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareAdapter {
    /// Peripherals must already be configured by
    /// [`hw_init::init_peripherals`](crate::drivers::hw_init::init_peripherals).
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim: [SimChannel::default(); CHANNEL_COUNT],
            #[cfg(not(target_os = "espidf"))]
            writes: 0,
        }
    }

    /// Percentage to raw LEDC duty at the configured resolution.
    pub fn pct_to_duty(pct: u8) -> u32 {
        let max = (1u32 << crate::pins::PWM_RESOLUTION_BITS) - 1;
        u32::from(pct.min(100)) * max / 100
    }
}

#[cfg(not(target_os = "espidf"))]
impl HardwareAdapter {
    /// Sensor values returned by subsequent reads of `id`.
    pub fn sim_set_reading(&mut self, id: ChannelId, reading: SensorReading) {
        self.sim[id.index()].reading = reading;
    }

    /// Make duty writes on `id` fail (or succeed again with `None`).
    pub fn sim_fail_writes(&mut self, id: ChannelId, fault: Option<HalError>) {
        self.sim[id.index()].write_fault = fault;
    }

    /// Make sensor reads on `id` fail (or succeed again with `None`).
    pub fn sim_fail_reads(&mut self, id: ChannelId, fault: Option<HalError>) {
        self.sim[id.index()].read_fault = fault;
    }

    /// Last duty successfully commanded on `id` (percent).
    pub fn sim_duty(&self, id: ChannelId) -> u8 {
        self.sim[id.index()].duty
    }

    /// Number of successful duty writes across all channels.
    pub fn sim_writes(&self) -> usize {
        self.writes
    }
}

impl LightPort for HardwareAdapter {
    #[cfg(target_os = "espidf")]
    fn set_channel_duty(&mut self, id: ChannelId, pct: u8) -> Result<(), HalError> {
        let duty = Self::pct_to_duty(pct);
        hw_init::ledc_set(pins::LIGHT_LEDC_CHANNEL[id.index()], duty)?;
        debug!("{}: duty {}% (raw {})", id, pct, duty);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_channel_duty(&mut self, id: ChannelId, pct: u8) -> Result<(), HalError> {
        let ch = &mut self.sim[id.index()];
        if let Some(fault) = ch.write_fault {
            return Err(fault);
        }
        ch.duty = pct.min(100);
        self.writes += 1;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn read_channel_sensors(&mut self, id: ChannelId) -> Result<SensorReading, HalError> {
        let current_raw = hw_init::adc1_read(pins::CURRENT_ADC_CHANNEL[id.index()])?;
        let temp_raw = hw_init::adc1_read(pins::TEMP_ADC_CHANNEL[id.index()])?;
        Ok(sensors::convert(current_raw, temp_raw))
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_channel_sensors(&mut self, id: ChannelId) -> Result<SensorReading, HalError> {
        let ch = &self.sim[id.index()];
        match ch.read_fault {
            Some(fault) => Err(fault),
            None => Ok(ch.reading),
        }
    }
}
