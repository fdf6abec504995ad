//! One-shot hardware peripheral initialization and raw pin access.
//!
//! Configures ADC1 for the soil probes and the relay/feedback GPIOs using
//! raw ESP-IDF sys calls.  Called once from `main()` before any task is
//! spawned.  [`GpioOutput`] and [`GpioInput`] expose configured pins through
//! the `embedded-hal` digital traits.
//!
//! On the host the pins and ADC channels are backed by atomics that tests
//! and the simulation drive through the `sim_*` helpers.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use crate::error::SensorError;
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={rc})"),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
        }
    }
}

impl std::error::Error for HwInitError {}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::AdcInitFailed(_) => Self::Init("ADC1"),
            HwInitError::GpioConfigFailed(_) => Self::Init("GPIO"),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: called once from main() before tasks are spawned.
    unsafe {
        init_adc()?;
        init_gpio_outputs()?;
        init_gpio_inputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static ADC1_HANDLE: core::sync::atomic::AtomicPtr<adc_oneshot_unit_ctx_t> =
    core::sync::atomic::AtomicPtr::new(core::ptr::null_mut());

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    use core::sync::atomic::Ordering;

    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for &ch in &pins::SOIL_ADC1_CHANNELS {
        let ret = unsafe { adc_oneshot_config_channel(handle, ch, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }
    ADC1_HANDLE.store(handle, Ordering::Release);

    info!("hw_init: ADC1 configured (soil CH6/CH7/CH4, 12 dB, 12-bit)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    use core::sync::atomic::Ordering;

    let handle = ADC1_HANDLE.load(Ordering::Acquire);
    if handle.is_null() {
        return Err(SensorError::AdcReadFailed);
    }
    let mut raw: i32 = 0;
    // SAFETY: handle was created by init_adc() and is never freed; the
    // oneshot driver serialises concurrent reads internally.
    let ret = unsafe { adc_oneshot_read(handle, channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.clamp(0, i32::from(u16::MAX)) as u16)
}

#[cfg(not(target_os = "espidf"))]
static SIM_ADC: [core::sync::atomic::AtomicU16; 10] =
    [const { core::sync::atomic::AtomicU16::new(1600) }; 10];

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    SIM_ADC
        .get(channel as usize)
        .map(|a| a.load(core::sync::atomic::Ordering::Relaxed))
        .ok_or(SensorError::AdcReadFailed)
}

/// Set the raw count the simulated ADC1 channel returns.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: u32, raw: u16) {
    if let Some(a) = SIM_ADC.get(channel as usize) {
        a.store(raw, core::sync::atomic::Ordering::Relaxed);
    }
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn configure(pin: i32, mode: gpio_mode_t) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let relays = [pins::RELAY_PUMP_GPIO, pins::RELAY_LAMP_GPIO]
        .into_iter()
        .chain(pins::RELAY_VALVE_GPIOS);
    for pin in relays {
        unsafe {
            configure(pin, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT)?;
            gpio_set_level(pin, 0);
        }
    }
    info!("hw_init: relay outputs configured (all off)");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    for pin in [pins::FEEDBACK_PUMP_GPIO, pins::FEEDBACK_LAMP_GPIO]
        .into_iter()
        .flatten()
    {
        unsafe { configure(pin, gpio_mode_t_GPIO_MODE_INPUT)? };
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
static SIM_GPIO: [core::sync::atomic::AtomicBool; 40] =
    [const { core::sync::atomic::AtomicBool::new(false) }; 40];

#[cfg(target_os = "espidf")]
fn gpio_write(pin: i32, high: bool) -> Result<(), GpioError> {
    // SAFETY: register write on a pin configured by init_gpio_outputs().
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret != ESP_OK as i32 {
        return Err(GpioError(ret));
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn gpio_write(pin: i32, high: bool) -> Result<(), GpioError> {
    let slot = SIM_GPIO.get(pin as usize).ok_or(GpioError(-1))?;
    slot.store(high, core::sync::atomic::Ordering::Relaxed);
    Ok(())
}

#[cfg(target_os = "espidf")]
fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on a configured pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
fn gpio_read(pin: i32) -> bool {
    SIM_GPIO
        .get(pin as usize)
        .is_some_and(|s| s.load(core::sync::atomic::Ordering::Relaxed))
}

/// Drive a simulated input pin.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gpio(pin: i32, high: bool) {
    let _ = gpio_write(pin, high);
}

/// Level of a simulated pin.
#[cfg(not(target_os = "espidf"))]
pub fn sim_gpio(pin: i32) -> bool {
    gpio_read(pin)
}

/// Raw `esp_err_t` from a failed pin write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(pub i32);

impl digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// A pin configured as output by [`init_peripherals`].
#[derive(Debug)]
pub struct GpioOutput(i32);

impl GpioOutput {
    pub fn new(pin: i32) -> Self {
        Self(pin)
    }

    pub fn pin(&self) -> i32 {
        self.0
    }
}

impl ErrorType for GpioOutput {
    type Error = GpioError;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), GpioError> {
        gpio_write(self.0, false)
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        gpio_write(self.0, true)
    }
}

/// A pin configured as input by [`init_peripherals`].
#[derive(Debug)]
pub struct GpioInput(i32);

impl GpioInput {
    pub fn new(pin: i32) -> Self {
        Self(pin)
    }
}

impl ErrorType for GpioInput {
    type Error = GpioError;
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, GpioError> {
        Ok(gpio_read(self.0))
    }

    fn is_low(&mut self) -> Result<bool, GpioError> {
        Ok(!gpio_read(self.0))
    }
}
