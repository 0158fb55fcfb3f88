//! Analog sensor conversions.
//!
//! Pure raw-ADC-to-engineering-unit functions for the two measurements
//! every light channel carries. Sampling itself lives in the hardware
//! adapter; keeping the maths here lets it run under host tests.

pub mod current;
pub mod temperature;

use crate::channel::SensorReading;

/// 12-bit ADC full scale.
pub(crate) const ADC_MAX: f32 = 4095.0;
/// ADC reference with 12 dB attenuation.
pub(crate) const V_REF: f32 = 3.3;

/// Build a [`SensorReading`] from one current and one temperature sample.
pub fn convert(current_raw: u16, temp_raw: u16) -> SensorReading {
    SensorReading::new(
        current::adc_to_milliamps(current_raw),
        temperature::adc_to_celsius(temp_raw),
    )
}
