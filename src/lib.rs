//! EcoMonitor sensor-node firmware library.
//!
//! Exposes the domain core and the adapters for integration testing and the
//! binary.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module; the remaining code
//! runs on the host against simulation backends.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod scheduler;
pub mod sensors;
