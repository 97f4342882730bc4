//! Device identity derived from the ESP32 factory MAC address.
//!
//! The hardware id is the low 32 bits of the eFuse MAC read as a
//! little-endian integer, i.e. MAC bytes 0..4.  The identity string is the
//! profile prefix followed by that id in uppercase hex (`GG-1A2B3C4D`).
//!
//! Two boards whose MACs share the first four bytes collide; this is
//! accepted and not mitigated.

use crate::config::DeviceIdentity;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: `mac` is a valid 6-byte out-buffer.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Low 32 bits of the MAC, little-endian.
pub fn hardware_id(mac: &MacAddress) -> u32 {
    u32::from_le_bytes([mac[0], mac[1], mac[2], mac[3]])
}

pub fn identity(prefix: &str, mac: &MacAddress) -> DeviceIdentity {
    DeviceIdentity::new(prefix, hardware_id(mac))
}
