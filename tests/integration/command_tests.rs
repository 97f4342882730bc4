//! Remote commands carried in the collector's response.

use crate::mock_hw::*;

use ecomonitor::app::commands::CommandName;
use ecomonitor::app::config_manager::{KEY_IS_CONFIGURED, KEY_READING_TIME, KEY_SSID};
use ecomonitor::app::events::AppEvent;
use ecomonitor::app::ports::RestartReason;
use ecomonitor::app::service::TickOutcome;

/// Boot connected, answer the first report with `body`, run that tick.
fn report_answered_with(body: &str) -> (Rig, Service, TickOutcome) {
    let mut rig = Rig::new();
    let mut service = connected(&mut rig);
    rig.script_response(200, body);
    rig.advance_ms(10);
    let outcome = rig.tick(&mut service);
    (rig, service, outcome)
}

#[test]
fn disable_then_enable_screen() {
    let (mut rig, mut service, outcome) = report_answered_with(r#"{"command":"disable_screen"}"#);
    assert_eq!(outcome, TickOutcome::Continue);
    assert!(!rig.display.powered);
    assert!(!service.screen_enabled());

    // Readouts stop while the screen is off.
    let shown = rig.display.screens.len();
    rig.run_for(&mut service, 12_000, 500);
    assert_eq!(rig.display.screens.len(), shown);

    // The next report turns it back on.
    rig.script_response(200, r#"{"command":"enable_screen"}"#);
    rig.run_for(&mut service, 16 * 60_000, 1_000);
    assert!(rig.display.powered);
    assert!(service.screen_enabled());
    assert!(rig.display.screens.len() > shown);
}

#[test]
fn reboot_restarts_after_grace() {
    let (rig, _service, outcome) = report_answered_with(r#"{"command":"reboot"}"#);
    assert_eq!(outcome, TickOutcome::Restart(RestartReason::Reboot));
    assert_eq!(rig.system.restart_requested(), Some(RestartReason::Reboot));
    assert_eq!(rig.display.last_text().unwrap()[0], "Rebooting...");
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::CommandReceived(CommandName::Reboot)));
}

#[test]
fn change_reading_time_persists_and_restarts() {
    let (rig, service, outcome) =
        report_answered_with(r#"{"command":"change_reading_time","payload":"30"}"#);
    assert_eq!(
        outcome,
        TickOutcome::Restart(RestartReason::ReadingTimeChanged(30))
    );
    assert_eq!(stored_str(&service, KEY_READING_TIME).as_deref(), Some("30"));
    let banner = rig.display.last_text().unwrap();
    assert_eq!(banner[0], "Reading time");
    assert_eq!(banner[1], "changed to 30m");
}

#[test]
fn invalid_reading_time_is_rejected_without_restart() {
    for payload in ["0", "1441", "abc", "-5", ""] {
        let body = format!(r#"{{"command":"change_reading_time","payload":"{payload}"}}"#);
        let (rig, service, outcome) = report_answered_with(&body);
        assert_eq!(outcome, TickOutcome::Continue, "payload {payload:?}");
        assert_eq!(stored_str(&service, KEY_READING_TIME).as_deref(), Some("15"));
        assert_eq!(rig.system.restart_requested(), None);
    }
}

#[test]
fn reading_time_without_payload_is_rejected() {
    let (_rig, service, outcome) = report_answered_with(r#"{"command":"change_reading_time"}"#);
    assert_eq!(outcome, TickOutcome::Continue);
    assert_eq!(stored_str(&service, KEY_READING_TIME).as_deref(), Some("15"));
}

#[test]
fn factory_reset_wipes_storage_and_restarts() {
    let (rig, service, outcome) = report_answered_with(r#"{"command":"factory_reset"}"#);
    assert_eq!(outcome, TickOutcome::Restart(RestartReason::FactoryReset));
    assert_eq!(stored_str(&service, KEY_SSID), None);
    assert_eq!(stored_bool(&service, KEY_IS_CONFIGURED), Some(false));
    assert!(rig.display.showed_line("Factory Reset"));
}

#[test]
fn unknown_command_is_ignored() {
    let (rig, service, outcome) = report_answered_with(r#"{"command":"self_destruct"}"#);
    assert_eq!(outcome, TickOutcome::Continue);
    assert_eq!(rig.system.restart_requested(), None);
    assert!(service.config().is_configured());
    assert!(rig.sink.events.contains(&AppEvent::CommandReceived(
        CommandName::Unrecognized("self_destruct".into())
    )));
}

#[test]
fn command_on_error_status_is_still_applied() {
    let mut rig = Rig::new();
    let mut service = connected(&mut rig);
    rig.script_response(503, r#"{"command":"reboot"}"#);
    rig.advance_ms(10);
    assert_eq!(
        rig.tick(&mut service),
        TickOutcome::Restart(RestartReason::Reboot)
    );
}

#[test]
fn restart_banner_is_suppressed_while_screen_is_off() {
    let mut rig = Rig::new();
    let mut service = connected(&mut rig);
    rig.script_response(200, r#"{"command":"disable_screen"}"#);
    rig.script_response(200, r#"{"command":"reboot"}"#);

    let outcome = rig.run_for(&mut service, 16 * 60_000, 1_000);
    assert_eq!(outcome, TickOutcome::Restart(RestartReason::Reboot));
    assert!(!rig.display.showed_line("Rebooting..."));
}
