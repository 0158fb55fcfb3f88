//! GPIO / peripheral assignments for the three-channel light board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers. Arrays are indexed by `ChannelId::index()`.

use crate::channel::CHANNEL_COUNT;

// ---------------------------------------------------------------------------
// Light outputs (constant-current drivers, PWM dimming)
// ---------------------------------------------------------------------------

/// PWM input of each channel's LED driver.
pub const LIGHT_PWM_GPIO: [i32; CHANNEL_COUNT] = [1, 2, 3];

/// LEDC channel driving each light.
pub const LIGHT_LEDC_CHANNEL: [u32; CHANNEL_COUNT] = [0, 1, 2];

// ---------------------------------------------------------------------------
// Sensors: analog (ADC1)
// ---------------------------------------------------------------------------

/// Current-sense amplifier output per channel (ADC1 channels 3–5,
/// GPIO 4–6 on ESP32-S3).
pub const CURRENT_ADC_CHANNEL: [u32; CHANNEL_COUNT] = [3, 4, 5];

/// NTC thermistor divider per channel, mounted on the emitter heatsink
/// (ADC1 channels 6–8, GPIO 7–9 on ESP32-S3).
pub const TEMP_ADC_CHANNEL: [u32; CHANNEL_COUNT] = [6, 7, 8];

// ---------------------------------------------------------------------------
// UART command link
// ---------------------------------------------------------------------------

pub const UART_PORT: i32 = 1;
pub const UART_TX_GPIO: i32 = 17;
pub const UART_RX_GPIO: i32 = 18;
pub const UART_BAUD: i32 = 115_200;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  10-bit gives 0 – 1023 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 10;
/// LEDC base frequency for the LED drivers (flicker-free).
pub const LIGHT_PWM_FREQ_HZ: u32 = 20_000;
