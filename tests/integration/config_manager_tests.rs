//! `ConfigManager` against the NVS simulation backend.

use crate::mock_hw::*;

use ecomonitor::app::config_manager::{
    ConfigManager, KEY_API_BASE_URL, KEY_IS_CONFIGURED, KEY_READING_TIME,
};
use ecomonitor::app::ports::{ConfigError, StorageError, StoragePort};
use ecomonitor::config::NetworkCredentials;

#[test]
fn fresh_storage_loads_defaults_and_persists_interval() {
    let mut config = ConfigManager::new(blank_nvs(), API);
    let loaded = config.load().unwrap().clone();

    assert!(!loaded.is_configured);
    assert_eq!(loaded.reporting_interval_minutes, 15);
    assert_eq!(loaded.api_base_url, API);
    assert_eq!(
        config.store().get_str(KEY_READING_TIME).unwrap().as_deref(),
        Some("15")
    );
    // The default URL is not written back.
    assert_eq!(config.store().get_str(KEY_API_BASE_URL).unwrap(), None);
}

#[test]
fn stored_api_url_overrides_default() {
    let mut nvs = blank_nvs();
    nvs.set_str(KEY_API_BASE_URL, "https://other.example/v2").unwrap();
    let mut config = ConfigManager::new(nvs, API);
    config.load().unwrap();
    assert_eq!(config.config().api_base_url, "https://other.example/v2");
}

#[test]
fn out_of_range_interval_is_healed_on_load() {
    for stored in ["0", "1441", "soon", "99999999999"] {
        let mut nvs = blank_nvs();
        nvs.set_str(KEY_READING_TIME, stored).unwrap();
        let mut config = ConfigManager::new(nvs, API);
        config.load().unwrap();
        assert_eq!(config.config().reporting_interval_minutes, 15, "{stored}");
        assert_eq!(
            config.store().get_str(KEY_READING_TIME).unwrap().as_deref(),
            Some("15")
        );
    }
}

#[test]
fn credentials_survive_a_power_cycle() {
    let mut config = ConfigManager::new(blank_nvs(), API);
    config.load().unwrap();
    config
        .save(NetworkCredentials::new("Home", "hunter2hunter2").unwrap())
        .unwrap();
    config.set_reporting_interval(60).unwrap();

    let mut rebooted = ConfigManager::new(config.into_store(), API);
    let loaded = rebooted.load().unwrap().clone();
    assert!(loaded.is_configured);
    assert_eq!(loaded.reporting_interval_minutes, 60);
    assert_eq!(rebooted.credentials().unwrap().passphrase(), "hunter2hunter2");
}

#[test]
fn interval_bounds_are_enforced() {
    let mut config = ConfigManager::new(blank_nvs(), API);
    assert!(config.set_reporting_interval(1).is_ok());
    assert!(config.set_reporting_interval(1440).is_ok());
    assert!(matches!(
        config.set_reporting_interval(0),
        Err(ConfigError::InvalidArgument(_))
    ));
    assert!(matches!(
        config.set_reporting_interval(u32::MAX),
        Err(ConfigError::InvalidArgument(_))
    ));
    assert_eq!(config.config().reporting_interval_minutes, 1440);
}

#[test]
fn write_failure_surfaces_as_storage_error() {
    let mut nvs = blank_nvs();
    nvs.sim_fail_writes(true);
    let mut config = ConfigManager::new(nvs, API);
    assert_eq!(
        config.save(NetworkCredentials::new("Home", "").unwrap()),
        Err(ConfigError::Storage(StorageError::IoError))
    );
    assert!(!config.is_configured());
}

#[test]
fn factory_reset_returns_to_defaults() {
    let mut config = ConfigManager::new(provisioned_nvs("Home", "hunter2hunter2"), API);
    config.load().unwrap();
    config.set_reporting_interval(5).unwrap();

    config.factory_reset().unwrap();

    assert!(!config.is_configured());
    assert!(config.credentials().is_none());
    assert_eq!(config.config().reporting_interval_minutes, 15);
    assert_eq!(config.store().get_bool(KEY_IS_CONFIGURED).unwrap(), Some(false));
    assert_eq!(config.store().get_str(KEY_READING_TIME).unwrap(), None);
}

#[test]
fn factory_reset_survives_a_reboot() {
    let mut config = ConfigManager::new(provisioned_nvs("Home", "hunter2hunter2"), API);
    config.load().unwrap();
    config.set_reporting_interval(240).unwrap();
    config.factory_reset().unwrap();

    let mut rebooted = ConfigManager::new(config.into_store(), API);
    let loaded = rebooted.load().unwrap().clone();

    assert!(!loaded.is_configured);
    assert_eq!(loaded.reporting_interval_minutes, 15);
    assert!(rebooted.credentials().is_none());
}
