//! Configuration manager — sole owner of [`DeviceConfig`] and
//! [`NetworkCredentials`], and the only writer of their NVS keys.
//!
//! Persisted layout (namespace `config`):
//!
//! | key            | type   | meaning                           |
//! |----------------|--------|-----------------------------------|
//! | `isConfigured` | bool   | credentials were provisioned      |
//! | `sta_ssid`     | string | station SSID                      |
//! | `sta_password` | string | station passphrase (may be empty) |
//! | `reading_time` | string | reporting interval in minutes     |
//! | `api_base_url` | string | collector base URL override       |
//!
//! Out-of-range or half-written values are corrected and written back on
//! [`load`](ConfigManager::load); they are never reported as errors.

use log::{info, warn};

use super::ports::{ConfigError, StorageError, StoragePort};
use crate::config::{
    parse_reading_minutes, DeviceConfig, NetworkCredentials, DEFAULT_READING_MINUTES,
    MAX_READING_MINUTES, MIN_READING_MINUTES,
};

pub const KEY_IS_CONFIGURED: &str = "isConfigured";
pub const KEY_SSID: &str = "sta_ssid";
pub const KEY_PASSWORD: &str = "sta_password";
pub const KEY_READING_TIME: &str = "reading_time";
pub const KEY_API_BASE_URL: &str = "api_base_url";

pub struct ConfigManager<S: StoragePort> {
    store: S,
    config: DeviceConfig,
    credentials: Option<NetworkCredentials>,
    default_api_base_url: &'static str,
}

impl<S: StoragePort> ConfigManager<S> {
    /// Wrap a store.  Until [`load`](Self::load) runs the manager reports
    /// defaults.
    pub fn new(store: S, default_api_base_url: &'static str) -> Self {
        Self {
            store,
            config: DeviceConfig::with_api_base_url(default_api_base_url),
            credentials: None,
            default_api_base_url,
        }
    }

    /// Read every key, self-healing inconsistent or out-of-range values.
    pub fn load(&mut self) -> Result<&DeviceConfig, ConfigError> {
        let mut is_configured = self.read_bool(KEY_IS_CONFIGURED)?.unwrap_or(false);
        let ssid = self.read_str(KEY_SSID)?.unwrap_or_default();
        let passphrase = self.read_str(KEY_PASSWORD)?.unwrap_or_default();

        let mut credentials = None;
        if is_configured {
            match NetworkCredentials::new(&ssid, &passphrase) {
                Ok(c) => credentials = Some(c),
                Err(e) => {
                    warn!("config: marked configured but stored credentials unusable ({e}), resetting flag");
                    self.store.set_bool(KEY_IS_CONFIGURED, false)?;
                    is_configured = false;
                }
            }
        }

        let stored_minutes = self.read_str(KEY_READING_TIME)?;
        let minutes = match stored_minutes.as_deref().and_then(parse_reading_minutes) {
            Some(m) => m,
            None => {
                warn!(
                    "config: reading_time {:?} invalid, resetting to {}",
                    stored_minutes, DEFAULT_READING_MINUTES
                );
                self.store
                    .set_str(KEY_READING_TIME, &DEFAULT_READING_MINUTES.to_string())?;
                DEFAULT_READING_MINUTES
            }
        };

        let api_base_url = self
            .read_str(KEY_API_BASE_URL)?
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.default_api_base_url.into());

        self.config = DeviceConfig {
            is_configured,
            reporting_interval_minutes: minutes,
            api_base_url,
        };
        self.credentials = credentials;

        info!(
            "config: loaded (configured={}, interval={}m, api={})",
            self.config.is_configured, self.config.reporting_interval_minutes, self.config.api_base_url
        );
        Ok(&self.config)
    }

    /// Unreadable entries count as missing so `load` can heal them.  Only
    /// I/O failures surface.
    fn read_str(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.store.get_str(key) {
            Err(StorageError::InvalidValue | StorageError::NotFound) => {
                warn!("config: '{key}' unreadable, treating as missing");
                Ok(None)
            }
            other => other,
        }
    }

    fn read_bool(&self, key: &str) -> Result<Option<bool>, StorageError> {
        match self.store.get_bool(key) {
            Err(StorageError::InvalidValue | StorageError::NotFound) => {
                warn!("config: '{key}' unreadable, treating as missing");
                Ok(None)
            }
            other => other,
        }
    }

    /// Persist provisioned credentials and mark the device configured.
    pub fn save(&mut self, credentials: NetworkCredentials) -> Result<(), ConfigError> {
        self.store.set_str(KEY_SSID, credentials.ssid())?;
        self.store.set_str(KEY_PASSWORD, credentials.passphrase())?;
        // Flag last: a power cut between writes leaves the device unconfigured.
        self.store.set_bool(KEY_IS_CONFIGURED, true)?;

        info!("config: credentials saved for SSID '{}'", credentials.ssid());
        self.config.is_configured = true;
        self.credentials = Some(credentials);
        Ok(())
    }

    /// Persist a new reporting interval.  Takes effect on the next boot.
    pub fn set_reporting_interval(&mut self, minutes: u32) -> Result<(), ConfigError> {
        let minutes = u16::try_from(minutes)
            .ok()
            .filter(|m| (MIN_READING_MINUTES..=MAX_READING_MINUTES).contains(m))
            .ok_or(ConfigError::InvalidArgument("reporting interval must be 1-1440 minutes"))?;

        self.store.set_str(KEY_READING_TIME, &minutes.to_string())?;
        info!("config: reporting interval set to {}m", minutes);
        self.config.reporting_interval_minutes = minutes;
        Ok(())
    }

    /// Erase every persisted key and return to defaults.
    pub fn factory_reset(&mut self) -> Result<(), ConfigError> {
        warn!("config: factory reset");
        self.config = DeviceConfig::with_api_base_url(self.default_api_base_url);
        self.credentials = None;
        self.store.clear()?;
        self.store.set_bool(KEY_IS_CONFIGURED, false)?;
        Ok(())
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn credentials(&self) -> Option<&NetworkCredentials> {
        self.credentials.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
