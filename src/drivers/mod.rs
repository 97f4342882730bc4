//! Low-level peripheral drivers used directly by `main` and the sensors.

pub mod adc;
pub mod watchdog;
