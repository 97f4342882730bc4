//! One-shot ADC1 access for the analog gas sensor.
//!
//! Configured once from `main()` before the lifecycle loop starts, using the
//! raw ESP-IDF oneshot API.  Off-target reads come from an `AtomicU16` so
//! tests can inject counts.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

/// Full-scale count at 12-bit width.
pub const ADC_MAX: u16 = 4095;

/// ADC1 channel wired to [`crate::pins::MQ7_ADC_GPIO`].
pub const ADC1_CH_MQ7: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcInitError(pub i32);

impl core::fmt::Display for AdcInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ADC1 init failed (rc={})", self.0)
    }
}

impl std::error::Error for AdcInitError {}

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: only read after `init_adc1()` and only from the main task.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

/// Create the ADC1 oneshot unit and configure the gas-sensor channel for
/// 0-3.3 V input at 12 bits.
#[cfg(target_os = "espidf")]
pub fn init_adc1() -> Result<(), AdcInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(AdcInitError(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    // SAFETY: handle created above.
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), ADC1_CH_MQ7, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(AdcInitError(ret));
    }

    info!("adc: ADC1 CH{} configured (MQ-7)", ADC1_CH_MQ7);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_adc1() -> Result<(), AdcInitError> {
    log::info!("adc(sim): init skipped");
    Ok(())
}

/// Raw count, or 0 when the conversion fails.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, main-task access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.clamp(0, i32::from(ADC_MAX)) as u16
}

#[cfg(not(target_os = "espidf"))]
static SIM_ADC1: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc1(raw: u16) {
    SIM_ADC1.store(raw.min(ADC_MAX), Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> u16 {
    SIM_ADC1.load(Ordering::Relaxed)
}
