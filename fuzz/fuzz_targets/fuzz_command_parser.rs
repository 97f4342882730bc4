//! Fuzz target: `RemoteCommand::from_response` + `CommandProcessor::apply`
//!
//! The collector's response body is untrusted.  Parse arbitrary text and,
//! when a command comes out, apply it against a simulated store.  Nothing
//! may panic and a rejected interval must never reach storage.
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use ecomonitor::adapters::nvs::{NvsAdapter, CONFIG_NAMESPACE};
use ecomonitor::app::commands::{CommandOutcome, CommandProcessor, RemoteCommand};
use ecomonitor::app::config_manager::{ConfigManager, KEY_READING_TIME};
use ecomonitor::app::ports::{StatusSurface, StoragePort};
use ecomonitor::config::parse_reading_minutes;
use libfuzzer_sys::fuzz_target;

struct Blank;

impl StatusSurface for Blank {
    fn show(&mut self, _lines: &[&str; 4]) {}
    fn show_readout(&mut self, _header: &str, _value: &str, _unit: &str) {}
    fn set_powered(&mut self, _on: bool) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(body) = core::str::from_utf8(data) else {
        return;
    };
    let Some(command) = RemoteCommand::from_response(body) else {
        return;
    };

    let Ok(store) = NvsAdapter::new(CONFIG_NAMESPACE) else {
        return;
    };
    let mut config = ConfigManager::new(store, "http://fuzz.invalid/api");
    let mut processor = CommandProcessor::new();
    let outcome = processor.apply(&command, &mut config, &mut Blank);

    if let Ok(Some(stored)) = config.store().get_str(KEY_READING_TIME) {
        assert!(
            parse_reading_minutes(&stored).is_some(),
            "out-of-range interval persisted: {stored:?}"
        );
    }
    if let CommandOutcome::Rejected(_) = outcome {
        assert_eq!(config.store().get_str(KEY_READING_TIME), Ok(None));
    }
});
