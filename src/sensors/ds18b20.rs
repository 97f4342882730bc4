//! DS18B20 temperature probe on a 1-Wire bus.
//!
//! The first probe found on the bus is used; its address is cached after a
//! successful search.  Each read triggers a 12-bit conversion and waits for
//! it to complete (750 ms).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `one-wire-bus` over an open-drain `PinDriver` with the
//! internal pull-up enabled, timed with `Ets` busy-waits.
//! On host/test: the temperature comes from a static `AtomicU32` holding
//! `f32` bits.

use crate::app::ports::ReadingSource;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use ds18b20::{Ds18b20, Resolution};
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::{
    delay::Ets,
    gpio::{AnyIOPin, InputOutput, PinDriver, Pull},
};
#[cfg(target_os = "espidf")]
use log::{info, warn};
#[cfg(target_os = "espidf")]
use one_wire_bus::{Address, OneWire};

#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_BITS: AtomicU32 = AtomicU32::new(0x41B4_0000); // 22.5

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_temperature(celsius: f32) {
    SIM_TEMP_BITS.store(celsius.to_bits(), Ordering::Relaxed);
}

#[cfg(target_os = "espidf")]
type Bus = OneWire<PinDriver<'static, AnyIOPin, InputOutput>>;

pub struct Ds18b20Sensor {
    #[cfg(target_os = "espidf")]
    bus: Bus,
    #[cfg(target_os = "espidf")]
    probe: Option<Address>,
}

#[cfg(target_os = "espidf")]
impl Ds18b20Sensor {
    pub fn new(pin: AnyIOPin) -> Result<Self, crate::error::Error> {
        let pin_error = |_| crate::error::Error::Init("one-wire pin");
        let mut driver = PinDriver::input_output_od(pin).map_err(pin_error)?;
        // Internal pull-up on top of the board's 4.7 kΩ; the bus idles high.
        driver.set_pull(Pull::Up).map_err(pin_error)?;
        driver.set_high().map_err(pin_error)?;
        let bus = OneWire::new(driver).map_err(|_| crate::error::Error::Init("one-wire bus"))?;
        info!("ds18b20: 1-Wire bus ready");
        Ok(Self { bus, probe: None })
    }

    fn find_probe(&mut self) -> Option<Address> {
        if let Some(address) = self.probe {
            return Some(address);
        }
        let found = self
            .bus
            .devices(false, &mut Ets)
            .filter_map(Result::ok)
            .find(|address| address.family_code() == ds18b20::FAMILY_CODE);
        match found {
            Some(address) => info!("ds18b20: probe {:?}", address),
            None => warn!("ds18b20: no probe on the bus"),
        }
        self.probe = found;
        found
    }

    fn read_celsius(&mut self) -> Option<f32> {
        let address = self.find_probe()?;
        let probe = Ds18b20::new::<()>(address).ok()?;
        probe.start_temp_measurement(&mut self.bus, &mut Ets).ok()?;
        Resolution::Bits12.delay_for_measurement_time(&mut Ets);
        match probe.read_data(&mut self.bus, &mut Ets) {
            Ok(data) => Some(data.temperature),
            Err(_) => {
                // Force a fresh search next time; the probe may have been swapped.
                self.probe = None;
                None
            }
        }
    }
}

#[cfg(target_os = "espidf")]
impl ReadingSource for Ds18b20Sensor {
    fn read(&mut self) -> f32 {
        self.read_celsius().unwrap_or(f32::NAN)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Ds18b20Sensor {
    pub fn new() -> Self {
        Self {}
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for Ds18b20Sensor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl ReadingSource for Ds18b20Sensor {
    fn read(&mut self) -> f32 {
        f32::from_bits(SIM_TEMP_BITS.load(Ordering::Relaxed))
    }
}
