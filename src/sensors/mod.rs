//! Reading sources, one per device profile.
//!
//! | profile    | driver          | bus             |
//! |------------|-----------------|-----------------|
//! | GasGuard   | [`mq7`]         | ADC1 oneshot    |
//! | TempGuard  | [`ds18b20`]     | 1-Wire          |
//! | HumidGuard | [`am2320`]      | I2C (shared)    |
//!
//! `main` builds exactly one and boxes it into the lifecycle loop.

pub mod am2320;
pub mod ds18b20;
pub mod mq7;

pub use am2320::Am2320Sensor;
pub use ds18b20::Ds18b20Sensor;
pub use mq7::Mq7Sensor;
