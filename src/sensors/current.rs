//! LED string current sense.
//!
//! Low-side shunt per channel feeding a fixed-gain amplifier into ADC1:
//! `V_adc = I * R_SHUNT * GAIN`.

use super::{ADC_MAX, V_REF};

const R_SHUNT_OHM: f32 = 10.0;
const GAIN: f32 = 5.0;

/// Full-scale current in mA (3.3 V at the ADC).
pub const FULL_SCALE_MA: f32 = V_REF / (R_SHUNT_OHM * GAIN) * 1000.0;

/// Convert a raw 12-bit ADC sample to milliamps.
pub fn adc_to_milliamps(raw: u16) -> f32 {
    let voltage = (raw.min(ADC_MAX as u16) as f32 / ADC_MAX) * V_REF;
    voltage / (R_SHUNT_OHM * GAIN) * 1000.0
}
