//! Provisioning: portal submission → persisted credentials → restart →
//! joined on the next boot.

use crate::mock_hw::*;

use ecomonitor::adapters::wifi::WifiAdapter;
use ecomonitor::app::config_manager::{KEY_IS_CONFIGURED, KEY_PASSWORD, KEY_SSID};
use ecomonitor::app::events::AppEvent;
use ecomonitor::app::network::ConnectionState;
use ecomonitor::app::ports::{RestartReason, StoragePort};
use ecomonitor::app::service::TickOutcome;

#[test]
fn portal_form_shows_device_details() {
    let mut rig = Rig::new();
    let _service = unconfigured(&mut rig);

    let html = rig.portal.sim_get_form().expect("portal is serving");
    assert!(html.contains("GasGuard Setup"));
    assert!(html.contains(DEVICE_ID));
    assert!(html.contains(API));
}

#[test]
fn submission_is_saved_then_device_restarts() {
    let mut rig = Rig::new();
    let mut service = unconfigured(&mut rig);

    let reply = rig
        .portal
        .sim_post_configure(b"ssid=Home+Net&password=hunter2hunter2")
        .unwrap();
    assert_eq!(reply.status, 200);
    assert!(reply.body.contains("Configuration Saved!"));

    let before = rig.now_ms();
    rig.advance_ms(10);
    assert_eq!(
        rig.tick(&mut service),
        TickOutcome::Restart(RestartReason::Provisioned)
    );

    assert_eq!(stored_str(&service, KEY_SSID).as_deref(), Some("Home Net"));
    assert_eq!(
        stored_str(&service, KEY_PASSWORD).as_deref(),
        Some("hunter2hunter2")
    );
    assert_eq!(stored_bool(&service, KEY_IS_CONFIGURED), Some(true));

    assert_eq!(rig.system.restart_requested(), Some(RestartReason::Provisioned));
    assert!(rig.now_ms() >= before + 5_000, "5 s grace before restart");
    assert!(rig.display.showed_line("saved!"));
    assert!(rig.sink.events.contains(&AppEvent::Provisioned));
}

#[test]
fn next_boot_joins_the_provisioned_network() {
    let mut rig = Rig::new();
    let mut service = unconfigured(&mut rig);
    rig.portal
        .sim_post_configure(b"ssid=Home&password=hunter2hunter2")
        .unwrap();
    rig.advance_ms(10);
    rig.tick(&mut service);

    // Simulated power cycle: same storage, fresh everything else.
    let nvs = service.into_config().into_store();
    let mut rig = Rig::new();
    let mut service = rig.service(nvs, WifiAdapter::new());
    assert_eq!(rig.boot(&mut service), TickOutcome::Continue);

    assert_eq!(service.connection_state(), ConnectionState::Connected);
    assert_eq!(service.config().credentials().unwrap().ssid(), "Home");
    assert!(rig.sink.events.contains(&AppEvent::Booted { configured: true }));
}

#[test]
fn open_network_needs_no_password() {
    let mut rig = Rig::new();
    let mut service = unconfigured(&mut rig);
    let reply = rig.portal.sim_post_configure(b"ssid=Cafe").unwrap();
    assert_eq!(reply.status, 200);

    rig.advance_ms(10);
    rig.tick(&mut service);
    assert_eq!(stored_str(&service, KEY_PASSWORD).as_deref(), Some(""));
    assert_eq!(stored_bool(&service, KEY_IS_CONFIGURED), Some(true));
}

#[test]
fn missing_ssid_is_rejected_and_nothing_changes() {
    let mut rig = Rig::new();
    let mut service = unconfigured(&mut rig);

    let reply = rig
        .portal
        .sim_post_configure(b"password=hunter2hunter2")
        .unwrap();
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body, "Error: Missing WiFi Name");

    let outcome = rig.run_for(&mut service, 3_000, 100);
    assert_eq!(outcome, TickOutcome::Continue);
    assert_ne!(stored_bool(&service, KEY_IS_CONFIGURED), Some(true));
    assert_eq!(rig.system.restart_requested(), None);
    assert_eq!(service.connection_state(), ConnectionState::ApMode);
}

#[test]
fn storage_failure_keeps_the_portal_up() {
    let mut rig = Rig::new();
    let mut nvs = blank_nvs();
    nvs.sim_fail_writes(true);
    let mut service = rig.service(nvs, WifiAdapter::new());
    // Load cannot persist the default interval; boot carries on regardless.
    assert_eq!(rig.boot(&mut service), TickOutcome::Continue);
    assert_eq!(service.config().config().reporting_interval_minutes, 15);

    rig.portal
        .sim_post_configure(b"ssid=Home&password=hunter2hunter2")
        .unwrap();
    rig.advance_ms(10);
    assert_eq!(rig.tick(&mut service), TickOutcome::Continue);

    assert_eq!(rig.system.restart_requested(), None);
    assert_eq!(service.connection_state(), ConnectionState::ApMode);
    assert!(service.portal_started());
    assert!(!service.config().is_configured());
}

#[test]
fn corrupt_stored_credentials_heal_to_unconfigured() {
    let mut rig = Rig::new();
    let mut nvs = blank_nvs();
    nvs.set_bool(KEY_IS_CONFIGURED, true).unwrap();
    nvs.set_str(KEY_SSID, "").unwrap();

    let mut service = rig.service(nvs, WifiAdapter::new());
    rig.boot(&mut service);

    assert_eq!(service.connection_state(), ConnectionState::ApMode);
    assert_eq!(stored_bool(&service, KEY_IS_CONFIGURED), Some(false));
    assert_eq!(service.network().radio().sim_join_count(), 0);
}
