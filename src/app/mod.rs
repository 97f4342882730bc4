//! Application core — pure domain logic, zero I/O.
//!
//! Configuration management, network sequencing, the provisioning portal's
//! request handling, remote command processing and the lifecycle loop that
//! ties them together.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod config_manager;
pub mod events;
pub mod network;
pub mod portal;
pub mod ports;
pub mod service;
