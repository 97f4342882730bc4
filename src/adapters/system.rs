//! Process restart.
//!
//! Implements [`SystemPort`].  On hardware `esp_restart()` never returns;
//! the simulation backend records the request so host runs can stop their
//! loop.

use log::warn;

use crate::app::ports::{RestartReason, SystemPort};

#[derive(Default)]
pub struct EspSystem {
    #[cfg(not(target_os = "espidf"))]
    last_restart: Option<RestartReason>,
}

impl EspSystem {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn restart_requested(&self) -> Option<RestartReason> {
        self.last_restart
    }
}

impl SystemPort for EspSystem {
    #[cfg(target_os = "espidf")]
    fn restart(&mut self, reason: RestartReason) {
        warn!("system: restarting ({:?})", reason);
        esp_idf_svc::hal::reset::restart();
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&mut self, reason: RestartReason) {
        warn!("system(sim): restart requested ({:?})", reason);
        self.last_restart = Some(reason);
    }
}
