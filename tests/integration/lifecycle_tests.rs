//! Boot, join, readout and telemetry behaviour of the lifecycle loop.

use crate::mock_hw::*;

use ecomonitor::adapters::wifi::WifiAdapter;
use ecomonitor::app::events::{AppEvent, ReportFailure};
use ecomonitor::app::network::ConnectionState;
use ecomonitor::app::ports::TransportError;
use ecomonitor::app::service::{Connectivity, TickOutcome};

const MINUTE_MS: u64 = 60_000;

fn payload(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("telemetry body is JSON")
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn unconfigured_boot_starts_access_point_and_portal() {
    let mut rig = Rig::new();
    let service = unconfigured(&mut rig);

    assert_eq!(service.connection_state(), ConnectionState::ApMode);
    assert!(service.portal_started());
    assert!(rig.portal.is_started());
    assert!(service.network().radio().sim_ap_active());

    let texts = rig.display.texts();
    let splash = texts[0];
    assert_eq!(splash[0], "GasGuard");
    assert_eq!(splash[1], "Device ID:");
    assert_eq!(splash[2], DEVICE_ID);
    assert_eq!(splash[3], "Starting...");

    assert!(rig
        .sink
        .events
        .contains(&AppEvent::Booted { configured: false }));
}

#[test]
fn ap_status_screen_refreshes_every_two_seconds() {
    let mut rig = Rig::new();
    let mut service = unconfigured(&mut rig);
    let before = rig.display.texts().len();

    rig.run_for(&mut service, 6_000, 100);

    let status: Vec<_> = rig
        .display
        .texts()
        .into_iter()
        .skip(before)
        .filter(|l| l[0] == "AP Mode Active")
        .cloned()
        .collect();
    assert!((2..=4).contains(&status.len()), "got {}", status.len());
    assert_eq!(status[0][1], "SSID: GasGuard");
    assert_eq!(status[0][2], "IP: 192.168.4.1");
    assert_eq!(status[0][3], "Password: 12345678");
    assert!(rig.transport.sent().is_empty(), "no telemetry in AP mode");
}

#[test]
fn configured_boot_joins_and_reports_immediately() {
    let mut rig = Rig::new();
    let mut service = connected(&mut rig);

    assert_eq!(service.connection_state(), ConnectionState::Connected);
    assert!(rig.display.showed_line("WiFi Connected!"));
    assert!(rig.display.showed_line("IP: 192.168.1.50"));
    assert!(!service.portal_started());

    rig.advance_ms(10);
    assert_eq!(rig.tick(&mut service), TickOutcome::Continue);

    let sent = rig.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url, "http://collector.test/api/sensor-readings/");
    assert_eq!(sent[0].timeout_ms, 10_000);
    let body = payload(&sent[0].body);
    assert_eq!(body["device_id"], DEVICE_ID);
    assert_eq!(body["final_value"], 0.5);
    assert_eq!(service.connectivity(), Connectivity::Online);
}

#[test]
fn boot_splash_and_banner_take_their_time() {
    let mut rig = Rig::new();
    let _service = connected(&mut rig);
    // 2 s splash + 2 s connection banner; the join itself polls once.
    assert!(rig.now_ms() >= 4_000);
    assert!(rig.now_ms() < 4_600);
}

// ── Join failure ──────────────────────────────────────────────

fn transitions(rig: &Rig) -> Vec<(ConnectionState, ConnectionState)> {
    rig.sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ConnectionChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

#[test]
fn boot_join_reports_connecting_before_connected() {
    let mut rig = Rig::new();
    let _service = connected(&mut rig);

    assert_eq!(
        transitions(&rig),
        vec![
            (ConnectionState::Unconfigured, ConnectionState::Connecting),
            (ConnectionState::Connecting, ConnectionState::Connected),
        ]
    );
}

#[test]
fn failed_join_falls_back_to_access_point() {
    let mut rig = Rig::new();
    let mut wifi = WifiAdapter::new();
    wifi.sim_reject_joins(true);
    let mut service = rig.service(provisioned_nvs("Home", "hunter2hunter2"), wifi);

    assert_eq!(rig.boot(&mut service), TickOutcome::Continue);

    assert_eq!(service.connection_state(), ConnectionState::ApMode);
    assert!(service.portal_started());
    assert!(rig.display.showed_line("WiFi Connection"));
    assert!(rig.display.showed_line("Starting AP mode..."));
    // 20 polls, 500 ms apart, on top of splash and banner.
    assert!(rig.now_ms() >= 2_000 + 10_000 + 2_000);

    assert_eq!(
        transitions(&rig),
        vec![
            (ConnectionState::Unconfigured, ConnectionState::Connecting),
            (ConnectionState::Connecting, ConnectionState::ConnectionFailed),
            (ConnectionState::ConnectionFailed, ConnectionState::ApMode),
        ]
    );
}

// ── Cadences ──────────────────────────────────────────────────

#[test]
fn telemetry_follows_reporting_interval() {
    let mut rig = Rig::new();
    let mut service = connected(&mut rig);

    rig.run_for(&mut service, 14 * MINUTE_MS, 1_000);
    assert_eq!(rig.transport.sent().len(), 1, "only the boot report so far");

    rig.run_for(&mut service, 2 * MINUTE_MS, 1_000);
    assert_eq!(rig.transport.sent().len(), 2);
}

#[test]
fn readout_refreshes_every_five_seconds() {
    let mut rig = Rig::new();
    let mut service = connected(&mut rig);
    rig.reading.set(123.456);

    rig.run_for(&mut service, 20_000, 250);

    let readouts = rig.display.readouts();
    assert!((3..=5).contains(&readouts.len()), "got {}", readouts.len());
    let (header, value, unit) = readouts.last().copied().unwrap();
    assert_eq!(header, "GG-1A2B3C4D - Online");
    assert_eq!(value, "123.5");
    assert_eq!(unit, " ppm");
}

// ── Transport failures ────────────────────────────────────────

#[test]
fn transport_error_marks_offline() {
    let mut rig = Rig::new();
    let mut service = connected(&mut rig);
    rig.script_failure(TransportError::Timeout);

    rig.run_for(&mut service, 6_000, 500);

    assert_eq!(service.connectivity(), Connectivity::Offline);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ReportFailed {
            reason: ReportFailure::Transport(TransportError::Timeout),
            ..
        }
    )));
    let (header, _, _) = rig.display.readouts().last().copied().unwrap();
    assert_eq!(header, "GG-1A2B3C4D - Offline");
    assert_eq!(service.connection_state(), ConnectionState::Connected);
}

#[test]
fn failed_report_keeps_the_interval() {
    let mut rig = Rig::new();
    let mut service = connected(&mut rig);
    rig.script_failure(TransportError::Connection);

    rig.advance_ms(10);
    rig.tick(&mut service);
    let first_at = rig.now_ms();
    assert_eq!(rig.transport.sent().len(), 1);
    assert_eq!(service.connectivity(), Connectivity::Offline);

    let interval = 15 * MINUTE_MS;
    rig.run_for(&mut service, interval - 1_000, 500);
    assert_eq!(rig.now_ms(), first_at + interval - 1_000);
    assert_eq!(rig.transport.sent().len(), 1, "no early retry after a failure");

    rig.run_for(&mut service, 2_000, 500);
    assert_eq!(rig.transport.sent().len(), 2, "next report on the usual schedule");
    assert_eq!(service.connectivity(), Connectivity::Online);
}

#[test]
fn error_status_still_counts_as_online() {
    let mut rig = Rig::new();
    let mut service = connected(&mut rig);
    rig.script_response(500, "");

    rig.advance_ms(10);
    rig.tick(&mut service);

    assert_eq!(service.connectivity(), Connectivity::Online);
    assert!(rig
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::ReportDelivered { status: 500, .. })));
}

#[test]
fn nan_reading_is_sent_as_null_and_shown_as_dashes() {
    let mut rig = Rig::new();
    let mut service = connected(&mut rig);
    rig.reading.set(f32::NAN);

    rig.run_for(&mut service, 6_000, 500);

    assert!(payload(&rig.transport.sent()[0].body)["final_value"].is_null());
    assert_eq!(rig.display.readouts()[0].1, "--");
}

// ── Link supervision ──────────────────────────────────────────

#[test]
fn dropped_link_is_rejoined() {
    let mut rig = Rig::new();
    let mut service = connected(&mut rig);
    rig.advance_ms(10);
    rig.tick(&mut service);

    service.network_mut().radio_mut().sim_set_link(false);
    rig.advance_ms(10);
    assert_eq!(rig.tick(&mut service), TickOutcome::Continue);

    assert_eq!(service.connection_state(), ConnectionState::Connected);
    assert_eq!(service.network().radio().sim_join_count(), 2);
    assert!(rig.sink.events.contains(&AppEvent::ConnectionChanged {
        from: ConnectionState::Connected,
        to: ConnectionState::Connecting,
    }));
}

#[test]
fn dropped_link_that_cannot_rejoin_opens_the_portal() {
    let mut rig = Rig::new();
    let mut service = connected(&mut rig);

    let radio = service.network_mut().radio_mut();
    radio.sim_reject_joins(true);
    radio.sim_set_link(false);
    rig.advance_ms(10);
    rig.tick(&mut service);

    assert_eq!(service.connection_state(), ConnectionState::ApMode);
    assert!(service.portal_started());
    assert_eq!(service.connectivity(), Connectivity::Offline);
}
