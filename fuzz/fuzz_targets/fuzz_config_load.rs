//! Fuzz target: `ConfigManager::load`
//!
//! Seeds storage with arbitrary values for every key and loads.  The result
//! must be self-consistent and a second load must agree with the first.
//!
//! cargo fuzz run fuzz_config_load

#![no_main]

use ecomonitor::adapters::nvs::{NvsAdapter, CONFIG_NAMESPACE};
use ecomonitor::app::config_manager::{
    ConfigManager, KEY_API_BASE_URL, KEY_IS_CONFIGURED, KEY_PASSWORD, KEY_READING_TIME, KEY_SSID,
};
use ecomonitor::app::ports::StoragePort;
use ecomonitor::config::{MAX_READING_MINUTES, MIN_READING_MINUTES};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&flag, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = core::str::from_utf8(rest) else {
        return;
    };
    let mut fields = text.split('\u{1f}');

    let Ok(mut store) = NvsAdapter::new(CONFIG_NAMESPACE) else {
        return;
    };
    if flag & 1 != 0 {
        let _ = store.set_bool(KEY_IS_CONFIGURED, flag & 2 != 0);
    }
    for key in [KEY_SSID, KEY_PASSWORD, KEY_READING_TIME, KEY_API_BASE_URL] {
        if let Some(value) = fields.next() {
            let _ = store.set_str(key, value);
        }
    }

    let mut config = ConfigManager::new(store, "http://fuzz.invalid/api");
    let Ok(first) = config.load().cloned() else {
        return;
    };
    assert!((MIN_READING_MINUTES..=MAX_READING_MINUTES).contains(&first.reporting_interval_minutes));
    assert!(!first.api_base_url.is_empty());
    assert_eq!(first.is_configured, config.credentials().is_some());

    let second = config.load().cloned();
    assert_eq!(second.as_ref(), Ok(&first));
});
