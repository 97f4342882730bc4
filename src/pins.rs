//! GPIO / peripheral pin assignments for the EcoMonitor ESP32 board.
//!
//! Bus addresses and rates are used directly by the drivers.  GPIO numbers
//! document the wiring; `main` claims the matching typed pins from
//! `Peripherals`.

// ---------------------------------------------------------------------------
// OLED (SSD1306, 128x64) on I2C0
// ---------------------------------------------------------------------------

pub const OLED_SDA_GPIO: i32 = 21;
pub const OLED_SCL_GPIO: i32 = 22;
/// 7-bit address of the panel.
pub const OLED_I2C_ADDR: u8 = 0x3C;
/// Bus speed shared by the panel and the AM2320.
pub const I2C_BAUD_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// MQ-7 CO sensor analog output.  GPIO 34 is ADC1 channel 6 on the ESP32.
pub const MQ7_ADC_GPIO: i32 = 34;

/// DS18B20 1-Wire data line (4.7 kΩ pull-up to 3V3).
pub const ONE_WIRE_GPIO: i32 = 19;

/// AM2320 shares I2C0 with the OLED at this address.
pub const AM2320_I2C_ADDR: u8 = 0x5C;
