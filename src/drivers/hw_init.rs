//! One-shot hardware peripheral initialization and raw accessors.
//!
//! Configures ADC1 (current + temperature per channel), one LEDC timer
//! with three light channels, and the command UART using raw ESP-IDF
//! sys calls. Called once from `main()` before any task starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::error::HalError;
#[cfg(target_os = "espidf")]
use crate::pins;

/// UART driver ring buffer sizes (bytes).
pub const UART_RX_BUF: usize = 512;
pub const UART_TX_BUF: usize = 1024;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    LedcInitFailed(i32),
    UartInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::UartInitFailed(rc) => write!(f, "UART driver install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before any task is spawned.
    unsafe {
        init_adc()?;
        init_ledc()?;
        init_uart()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
fn check(ret: i32, err: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if ret == ESP_OK as i32 { Ok(()) } else { Err(err(ret)) }
}

#[cfg(target_os = "espidf")]
fn ms_to_ticks(ms: u32) -> TickType_t {
    ((ms as u64 * configTICK_RATE_HZ as u64) / 1000).max(1) as TickType_t
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: ADC1_HANDLE is written once in `init_adc()` before any reader
/// exists; afterwards it is only read.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    check(
        unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) },
        HwInitError::AdcInitFailed,
    )?;

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for ch in pins::CURRENT_ADC_CHANNEL.into_iter().chain(pins::TEMP_ADC_CHANNEL) {
        check(
            unsafe { adc_oneshot_config_channel(adc1_handle(), ch, &chan_cfg) },
            HwInitError::AdcInitFailed,
        )?;
    }

    info!("hw_init: ADC1 configured (current CH3-5, temperature CH6-8)");
    Ok(())
}

/// One raw 12-bit sample. The oneshot driver serialises concurrent
/// callers internally.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, HalError> {
    let mut raw: i32 = 0;
    // SAFETY: handle initialised in init_adc(); read-only afterwards.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    match ret {
        r if r == ESP_OK as i32 => Ok(raw.clamp(0, 4095) as u16),
        r if r == ESP_ERR_TIMEOUT as i32 => Err(HalError::Timeout),
        _ => Err(HalError::Device),
    }
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_10_BIT,
        freq_hz: pins::LIGHT_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    check(unsafe { ledc_timer_config(&timer) }, HwInitError::LedcInitFailed)?;

    for (&gpio, &channel) in pins::LIGHT_PWM_GPIO.iter().zip(&pins::LIGHT_LEDC_CHANNEL) {
        let cfg = ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        check(unsafe { ledc_channel_config(&cfg) }, HwInitError::LedcInitFailed)?;
    }

    info!("hw_init: LEDC configured (lights=CH0-2, {} Hz)", pins::LIGHT_PWM_FREQ_HZ);
    Ok(())
}

/// Write and latch a raw duty value.
#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u32) -> Result<(), HalError> {
    // SAFETY: channel configured in init_ledc(); the LEDC driver guards
    // its registers with a spinlock.
    let ret = unsafe { ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty) };
    if ret != ESP_OK as i32 {
        return Err(HalError::Device);
    }
    let ret = unsafe { ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel) };
    if ret != ESP_OK as i32 {
        return Err(HalError::Device);
    }
    Ok(())
}

// ── UART ─────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_uart() -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: pins::UART_BAUD,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    check(
        unsafe {
            uart_driver_install(
                pins::UART_PORT,
                UART_RX_BUF as i32,
                UART_TX_BUF as i32,
                0,
                core::ptr::null_mut(),
                0,
            )
        },
        HwInitError::UartInitFailed,
    )?;
    check(
        unsafe { uart_param_config(pins::UART_PORT, &cfg) },
        HwInitError::UartInitFailed,
    )?;
    check(
        unsafe { uart_set_pin(pins::UART_PORT, pins::UART_TX_GPIO, pins::UART_RX_GPIO, -1, -1) },
        HwInitError::UartInitFailed,
    )?;

    info!("hw_init: UART{} at {} baud", pins::UART_PORT, pins::UART_BAUD);
    Ok(())
}

/// Queue `bytes` and wait until they left the FIFO.
#[cfg(target_os = "espidf")]
pub fn uart_write(bytes: &[u8], timeout_ms: u32) -> Result<(), HalError> {
    // SAFETY: driver installed in init_uart(); `bytes` valid for its length.
    let written = unsafe { uart_write_bytes(pins::UART_PORT, bytes.as_ptr().cast(), bytes.len()) };
    if written < 0 || written as usize != bytes.len() {
        return Err(HalError::Device);
    }
    let ret = unsafe { uart_wait_tx_done(pins::UART_PORT, ms_to_ticks(timeout_ms)) };
    match ret {
        r if r == ESP_OK as i32 => Ok(()),
        r if r == ESP_ERR_TIMEOUT as i32 => Err(HalError::Timeout),
        _ => Err(HalError::Device),
    }
}

/// Block up to `timeout_ms` for received bytes. Returns the count read.
#[cfg(target_os = "espidf")]
pub fn uart_read(buf: &mut [u8], timeout_ms: u32) -> usize {
    // SAFETY: driver installed in init_uart(); `buf` valid for its length.
    let n = unsafe {
        uart_read_bytes(
            pins::UART_PORT,
            buf.as_mut_ptr().cast(),
            buf.len() as u32,
            ms_to_ticks(timeout_ms),
        )
    };
    n.max(0) as usize
}
