//! MQ-7 carbon monoxide sensor.
//!
//! Analog output read through ADC1 (configured by [`crate::drivers::adc`]),
//! converted to ppm with the datasheet power-law fit against the
//! clean-air sensing resistance.

use crate::app::ports::ReadingSource;
use crate::drivers::adc::{self, ADC_MAX};

/// ADC reference voltage at 12 dB attenuation.
const V_REF: f32 = 3.3;
/// Heater/divider supply.
const V_SUPPLY: f32 = 5.0;
/// Load resistor, kΩ.
const LOAD_KOHM: f32 = 10.0;
/// Sensing resistance in clean air, kΩ.
const R0_CLEAN_AIR_KOHM: f32 = 9.8;
const CURVE_SCALE: f32 = 100.0;
const CURVE_EXPONENT: f32 = -2.95;

/// Raw 12-bit count to CO ppm.  Zero counts read as 0 ppm.
pub fn raw_to_ppm(raw: u16) -> f32 {
    if raw == 0 {
        return 0.0;
    }
    let volts = f32::from(raw.min(ADC_MAX)) * V_REF / f32::from(ADC_MAX);
    let rs = (V_SUPPLY - volts) / volts * LOAD_KOHM;
    let ratio = rs / R0_CLEAN_AIR_KOHM;
    CURVE_SCALE * ratio.powf(CURVE_EXPONENT)
}

pub struct Mq7Sensor {
    channel: u32,
}

impl Mq7Sensor {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }
}

impl ReadingSource for Mq7Sensor {
    fn read(&mut self) -> f32 {
        raw_to_ppm(adc::adc1_read(self.channel))
    }
}
