//! NTC thermistor temperature conversion (10 kOhm @ 25 C, B = 3950).
//!
//! Each channel's thermistor sits in a voltage divider with a fixed
//! 10 kOhm resistor, read via ADC1. The simplified Beta (Steinhart-Hart)
//! equation converts resistance to temperature.

use super::{ADC_MAX, V_REF};

const R25: f32 = 10_000.0;
const BETA: f32 = 3950.0;
const T25_K: f32 = 298.15;
const R_DIVIDER: f32 = 10_000.0;

/// Convert a raw 12-bit ADC sample to degrees Celsius.
///
/// An open or shorted thermistor pins the divider to a rail; that yields
/// `NaN`, which the safety evaluation treats as out of range.
pub fn adc_to_celsius(raw: u16) -> f32 {
    let voltage = (raw as f32 / ADC_MAX) * V_REF;
    if voltage <= 0.01 || voltage >= (V_REF - 0.01) {
        return f32::NAN;
    }
    let r_ntc = R_DIVIDER * voltage / (V_REF - voltage);
    let inv_t = (1.0 / T25_K) + (1.0 / BETA) * (r_ntc / R25).ln();
    if inv_t <= 0.0 {
        return f32::NAN;
    }
    (1.0 / inv_t) - 273.15
}
