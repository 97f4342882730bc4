//! AM2320 relative humidity sensor on I2C.
//!
//! The part sleeps between transactions: every read starts with a wake
//! write (NACKed), then a function-code 0x03 request for four registers
//! from 0x00, then an 8-byte reply:
//!
//! ```text
//! [0x03, 0x04, RH_hi, RH_lo, T_hi, T_lo, CRC_lo, CRC_hi]
//! ```
//!
//! The CRC is CRC-16/MODBUS over the first six bytes.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::ports::ReadingSource;
use crate::pins::AM2320_I2C_ADDR;

const FN_READ_REGISTERS: u8 = 0x03;
const REG_HUMIDITY_HI: u8 = 0x00;
const REGISTER_COUNT: u8 = 0x04;
const WAKE_US: u32 = 1_000;
const CONVERSION_US: u32 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Am2320Error {
    Bus,
    /// Function code or byte count in the reply did not match the request.
    Frame,
    Crc,
}

impl core::fmt::Display for Am2320Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus => write!(f, "I2C transfer failed"),
            Self::Frame => write!(f, "unexpected reply header"),
            Self::Crc => write!(f, "CRC mismatch"),
        }
    }
}

pub fn crc16_modbus(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Validate a reply and extract relative humidity in %.
pub fn parse_reply(frame: &[u8; 8]) -> Result<f32, Am2320Error> {
    if frame[0] != FN_READ_REGISTERS || frame[1] != REGISTER_COUNT {
        return Err(Am2320Error::Frame);
    }
    let expected = u16::from_le_bytes([frame[6], frame[7]]);
    if crc16_modbus(&frame[..6]) != expected {
        return Err(Am2320Error::Crc);
    }
    let raw = u16::from_be_bytes([frame[2], frame[3]]);
    Ok(f32::from(raw) / 10.0)
}

pub struct Am2320Sensor<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C: I2c, D: DelayNs> Am2320Sensor<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self { i2c, delay }
    }

    pub fn read_humidity(&mut self) -> Result<f32, Am2320Error> {
        // The sensor NACKs the wake write by design.
        let _ = self.i2c.write(AM2320_I2C_ADDR, &[]);
        self.delay.delay_us(WAKE_US);

        self.i2c
            .write(
                AM2320_I2C_ADDR,
                &[FN_READ_REGISTERS, REG_HUMIDITY_HI, REGISTER_COUNT],
            )
            .map_err(|_| Am2320Error::Bus)?;
        self.delay.delay_us(CONVERSION_US);

        let mut frame = [0u8; 8];
        self.i2c
            .read(AM2320_I2C_ADDR, &mut frame)
            .map_err(|_| Am2320Error::Bus)?;
        parse_reply(&frame)
    }
}

impl<I2C: I2c, D: DelayNs> ReadingSource for Am2320Sensor<I2C, D> {
    fn read(&mut self) -> f32 {
        self.read_humidity().unwrap_or_else(|e| {
            warn!("am2320: {e}");
            f32::NAN
        })
    }
}
