//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one part of the device
//! lifecycle against the simulation adapters plus the mocks in `mock_hw`.
//! All tests run on the host (x86_64) with no real hardware required.

mod command_tests;
mod config_manager_tests;
mod lifecycle_tests;
mod mock_hw;
mod provisioning_flow_tests;
