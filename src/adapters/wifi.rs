//! WiFi radio adapter.
//!
//! Implements [`RadioPort`].  Mode switches and the start of a join are
//! driven here; polling, attempt budgets and state tracking belong to the
//! [`NetworkController`](crate::app::network::NetworkController).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspWifi` in non-blocking mode.
//! - **all other targets**: a scripted radio for host runs.  Joins succeed
//!   unless [`WifiAdapter::sim_reject_joins`] was set.

use core::net::Ipv4Addr;
use log::info;

use crate::app::ports::{RadioError, RadioPort};
use crate::config::NetworkCredentials;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    sys::EspError,
    wifi::{AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi},
};

/// Channel the provisioning access point is pinned to.
pub const AP_CHANNEL: u8 = 1;

#[cfg(target_os = "espidf")]
impl From<EspError> for RadioError {
    fn from(e: EspError) -> Self {
        Self::Driver(e.code())
    }
}

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,

    #[cfg(not(target_os = "espidf"))]
    sim: SimRadio,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimRadio {
    ap_active: bool,
    link_up: bool,
    reject_joins: bool,
    joins: u32,
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self, RadioError> {
        let wifi = EspWifi::new(modem, sysloop, Some(nvs))?;
        info!("WifiAdapter: driver created");
        Ok(Self { wifi })
    }

    fn restart_with(&mut self, configuration: &Configuration) -> Result<(), RadioError> {
        if self.wifi.is_started()? {
            self.wifi.stop()?;
        }
        self.wifi.set_configuration(configuration)?;
        self.wifi.start()?;
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl RadioPort for WifiAdapter {
    fn start_access_point(&mut self, ssid: &str, passphrase: &str) -> Result<(), RadioError> {
        let configuration = Configuration::AccessPoint(AccessPointConfiguration {
            ssid: ssid.try_into().map_err(|_| RadioError::InvalidConfiguration)?,
            password: passphrase
                .try_into()
                .map_err(|_| RadioError::InvalidConfiguration)?,
            auth_method: AuthMethod::WPA2Personal,
            channel: AP_CHANNEL,
            ..Default::default()
        });
        self.restart_with(&configuration)?;
        info!("WifiAdapter: access point '{}' up on channel {}", ssid, AP_CHANNEL);
        Ok(())
    }

    fn begin_join(&mut self, credentials: &NetworkCredentials) -> Result<(), RadioError> {
        let auth_method = if credentials.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let configuration = Configuration::Client(ClientConfiguration {
            ssid: credentials
                .ssid()
                .try_into()
                .map_err(|_| RadioError::InvalidConfiguration)?,
            password: credentials
                .passphrase()
                .try_into()
                .map_err(|_| RadioError::InvalidConfiguration)?,
            auth_method,
            ..Default::default()
        });
        self.restart_with(&configuration)?;
        self.wifi.connect()?;
        info!("WifiAdapter: joining '{}'", credentials.ssid());
        Ok(())
    }

    fn is_link_up(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    fn access_point_ip(&self) -> Option<Ipv4Addr> {
        self.wifi.ap_netif().get_ip_info().ok().map(|info| info.ip)
    }

    fn station_ip(&self) -> Option<Ipv4Addr> {
        if !self.is_link_up() {
            return None;
        }
        self.wifi.sta_netif().get_ip_info().ok().map(|info| info.ip)
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new() -> Self {
        info!("WifiAdapter: simulation backend");
        Self {
            sim: SimRadio::default(),
        }
    }

    /// Make every following join fail to associate.
    pub fn sim_reject_joins(&mut self, reject: bool) {
        self.sim.reject_joins = reject;
    }

    /// Drop or restore the station link.
    pub fn sim_set_link(&mut self, up: bool) {
        self.sim.link_up = up;
    }

    pub fn sim_join_count(&self) -> u32 {
        self.sim.joins
    }

    pub fn sim_ap_active(&self) -> bool {
        self.sim.ap_active
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl RadioPort for WifiAdapter {
    fn start_access_point(&mut self, ssid: &str, passphrase: &str) -> Result<(), RadioError> {
        if ssid.is_empty() || ssid.len() > 32 || passphrase.len() < 8 {
            return Err(RadioError::InvalidConfiguration);
        }
        self.sim.ap_active = true;
        self.sim.link_up = false;
        info!("WifiAdapter(sim): access point '{}'", ssid);
        Ok(())
    }

    fn begin_join(&mut self, credentials: &NetworkCredentials) -> Result<(), RadioError> {
        self.sim.ap_active = false;
        self.sim.joins += 1;
        self.sim.link_up = !self.sim.reject_joins;
        info!("WifiAdapter(sim): joining '{}'", credentials.ssid());
        Ok(())
    }

    fn is_link_up(&self) -> bool {
        self.sim.link_up
    }

    fn access_point_ip(&self) -> Option<Ipv4Addr> {
        self.sim.ap_active.then_some(Ipv4Addr::new(192, 168, 4, 1))
    }

    fn station_ip(&self) -> Option<Ipv4Addr> {
        self.sim.link_up.then_some(Ipv4Addr::new(192, 168, 1, 50))
    }
}
