//! Device service — the lifecycle loop at the centre of the firmware.
//!
//! [`DeviceService`] owns the configuration manager, the network controller,
//! the reading source and the three cadences.  Everything else (display,
//! HTTP client, portal server, clock, delay, restart, event sink) is handed
//! in per call through [`Io`], so the whole loop runs against mocks on the
//! host.
//!
//! ```text
//!                ┌──────────── tick ────────────┐
//!  PortalPort ──▶│ 1. drain one submission      │──▶ ConfigManager.save ─▶ restart
//!                │ 2. AP / unconfigured:        │
//!  RadioPort  ◀─▶│    ensure AP+portal, status  │──▶ StatusSurface
//!                │    screen every 2 s, return  │
//!                │ 3. connected:                │
//!  Reading    ──▶│    readout every 5 s         │──▶ StatusSurface
//!  Source        │    report every N min ───────│──▶ TelemetryTransport
//!                │         └─ command ──────────│──▶ CommandProcessor ─▶ restart?
//!                └──────────────────────────────┘
//! ```
//!
//! No tick-level failure escapes: transport errors become the `Offline`
//! label, join failures fall back to AP mode, and the few unrecoverable
//! conditions become a restart performed here after a grace delay.

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};
use serde::Serialize;

use crate::config::{
    DeviceIdentity, DeviceProfile, NetworkCredentials, AP_STATUS_REFRESH_MS, BOOT_SPLASH_MS,
    COMMAND_RESTART_GRACE_MS, CONNECTION_BANNER_MS, DISPLAY_REFRESH_MS, FAULT_RESTART_PAUSE_MS,
    PROVISIONING_RESTART_GRACE_MS, TRANSPORT_TIMEOUT_MS,
};
use crate::scheduler::Cadence;

use super::commands::{CommandOutcome, CommandProcessor, RemoteCommand};
use super::config_manager::ConfigManager;
use super::events::{AppEvent, ReportFailure, TelemetrySample};
use super::network::{ConnectionState, JoinOutcome, NetworkController};
use super::ports::{
    Clock, EventSink, PortalPage, PortalPort, RadioPort, ReadingSource, RestartReason,
    StatusSurface, StoragePort, SystemPort, TelemetryTransport,
};

// ───────────────────────────────────────────────────────────────
// Per-call collaborators
// ───────────────────────────────────────────────────────────────

/// Borrowed adapters for one `boot` or `tick` call.
pub struct Io<'a> {
    pub display: &'a mut dyn StatusSurface,
    pub transport: &'a mut dyn TelemetryTransport,
    pub portal: &'a mut dyn PortalPort,
    pub clock: &'a dyn Clock,
    pub delay: &'a mut dyn DelayNs,
    pub system: &'a mut dyn SystemPort,
    pub sink: &'a mut dyn EventSink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// A restart was performed.  Only observable off-target.
    Restart(RestartReason),
}

/// Last known collector reachability, shown in the readout header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Unknown,
    Online,
    Offline,
}

impl Connectivity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::Online => "Online",
            Self::Offline => "Offline",
        }
    }
}

#[derive(Serialize)]
struct TelemetryPayload<'a> {
    device_id: &'a str,
    final_value: f32,
}

// ───────────────────────────────────────────────────────────────
// Presentation helpers
// ───────────────────────────────────────────────────────────────

/// On-screen value: more decimals for small magnitudes.
pub fn format_reading(value: f32) -> String {
    if value.is_nan() {
        return "--".into();
    }
    if (0.0..0.01).contains(&value) {
        return "<0.01".into();
    }
    let magnitude = value.abs();
    if magnitude < 1.0 {
        format!("{value:.3}")
    } else if magnitude < 10.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.1}")
    }
}

/// `<base>/sensor-readings/`, tolerating a trailing slash on the base.
pub fn telemetry_url(api_base_url: &str) -> String {
    format!("{}/sensor-readings/", api_base_url.trim_end_matches('/'))
}

fn restart_banner(reason: RestartReason) -> Option<[String; 4]> {
    let lines = match reason {
        RestartReason::Reboot => ["Rebooting...".into(), String::new(), String::new(), String::new()],
        RestartReason::ReadingTimeChanged(m) => [
            "Reading time".into(),
            format!("changed to {m}m"),
            "Restarting...".into(),
            String::new(),
        ],
        RestartReason::FactoryReset => [
            "Factory Reset".into(),
            "Restarting...".into(),
            String::new(),
            String::new(),
        ],
        RestartReason::Provisioned => [
            "Configuration".into(),
            "saved!".into(),
            "Restarting...".into(),
            String::new(),
        ],
        RestartReason::RadioFault => [
            "WiFi Error".into(),
            "Restarting...".into(),
            String::new(),
            String::new(),
        ],
        RestartReason::DisplayFault => return None,
    };
    Some(lines)
}

fn restart_grace_ms(reason: RestartReason) -> u32 {
    match reason {
        RestartReason::Reboot
        | RestartReason::ReadingTimeChanged(_)
        | RestartReason::FactoryReset => COMMAND_RESTART_GRACE_MS,
        RestartReason::Provisioned => PROVISIONING_RESTART_GRACE_MS,
        RestartReason::DisplayFault | RestartReason::RadioFault => FAULT_RESTART_PAUSE_MS,
    }
}

/// Restart path for faults found before a [`DeviceService`] exists
/// (display bring-up).
pub fn fatal_restart(reason: RestartReason, delay: &mut dyn DelayNs, system: &mut dyn SystemPort) {
    error!("fatal: {:?}, restarting in {} ms", reason, restart_grace_ms(reason));
    delay.delay_ms(restart_grace_ms(reason));
    system.restart(reason);
}

// ───────────────────────────────────────────────────────────────
// DeviceService
// ───────────────────────────────────────────────────────────────

pub struct DeviceService<S: StoragePort, R: RadioPort> {
    identity: DeviceIdentity,
    profile: DeviceProfile,
    config: ConfigManager<S>,
    network: NetworkController<R>,
    sensor: Box<dyn ReadingSource>,
    commands: CommandProcessor,
    display_cadence: Cadence,
    ap_status_cadence: Cadence,
    telemetry_cadence: Cadence,
    portal_started: bool,
    connectivity: Connectivity,
    tick_count: u64,
}

impl<S: StoragePort, R: RadioPort> DeviceService<S, R> {
    /// Assemble the service.  Nothing touches hardware until
    /// [`boot`](Self::boot).
    pub fn new(
        identity: DeviceIdentity,
        profile: DeviceProfile,
        config: ConfigManager<S>,
        network: NetworkController<R>,
        sensor: Box<dyn ReadingSource>,
    ) -> Self {
        let telemetry_interval = config.config().reporting_interval_ms();
        Self {
            identity,
            profile,
            config,
            network,
            sensor,
            commands: CommandProcessor::new(),
            display_cadence: Cadence::anchored(DISPLAY_REFRESH_MS, 0),
            ap_status_cadence: Cadence::anchored(AP_STATUS_REFRESH_MS, 0),
            telemetry_cadence: Cadence::immediate(telemetry_interval),
            portal_started: false,
            connectivity: Connectivity::Unknown,
            tick_count: 0,
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn config(&self) -> &ConfigManager<S> {
        &self.config
    }

    pub fn network(&self) -> &NetworkController<R> {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut NetworkController<R> {
        &mut self.network
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.network.state()
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn screen_enabled(&self) -> bool {
        self.commands.screen_enabled()
    }

    pub fn portal_started(&self) -> bool {
        self.portal_started
    }

    pub fn telemetry_cadence(&self) -> &Cadence {
        &self.telemetry_cadence
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Give back the configuration manager (and with it the store), e.g. to
    /// boot a fresh service over the same storage.
    pub fn into_config(self) -> ConfigManager<S> {
        self.config
    }

    // ── Boot ──────────────────────────────────────────────────

    /// Load configuration, show the splash, then either join the stored
    /// network or bring up the provisioning access point.
    pub fn boot(&mut self, io: &mut Io<'_>) -> TickOutcome {
        if let Err(e) = self.config.load() {
            warn!("boot: config load failed ({e}), running on defaults");
        }
        self.telemetry_cadence = Cadence::immediate(self.config.config().reporting_interval_ms());

        let configured = self.config.is_configured();
        info!(
            "boot: {} {} (configured={}, interval={}m)",
            self.profile.name,
            self.identity,
            configured,
            self.config.config().reporting_interval_minutes
        );

        let id = self.identity.to_string();
        self.show(io, &[self.profile.name, "Device ID:", &id, "Starting..."]);
        io.delay.delay_ms(BOOT_SPLASH_MS);
        io.sink.emit(&AppEvent::Booted { configured });

        if configured {
            self.join(io)
        } else {
            info!("boot: no credentials, starting access point");
            self.ensure_provisioning(io)
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One cooperative pass.  Bounded except for a rejoin after link loss
    /// and the telemetry POST.
    pub fn tick(&mut self, io: &mut Io<'_>) -> TickOutcome {
        self.tick_count += 1;
        let now = io.clock.now_ms();

        if let Some(credentials) = io.portal.poll_submission() {
            return self.accept_submission(credentials, io);
        }

        match self.network.state() {
            ConnectionState::Unconfigured
            | ConnectionState::ApMode
            | ConnectionState::ConnectionFailed => {
                let outcome = self.ensure_provisioning(io);
                if outcome != TickOutcome::Continue {
                    return outcome;
                }
                if self.ap_status_cadence.due(now) {
                    self.show_ap_status(io);
                }
                return TickOutcome::Continue;
            }
            ConnectionState::Connecting => return self.join(io),
            ConnectionState::Connected => {}
        }

        if self.network.detect_link_loss() {
            self.connectivity = Connectivity::Offline;
            io.sink.emit(&AppEvent::ConnectionChanged {
                from: ConnectionState::Connected,
                to: ConnectionState::Connecting,
            });
            return self.join(io);
        }

        if self.display_cadence.due(now) {
            self.refresh_readout(now, io);
        }

        if self.telemetry_cadence.due(now) {
            if let Some(command) = self.report(now, io) {
                return self.dispatch(&command, io);
            }
        }

        TickOutcome::Continue
    }

    // ── Network ───────────────────────────────────────────────

    fn join(&mut self, io: &mut Io<'_>) -> TickOutcome {
        let Some(credentials) = self.config.credentials().cloned() else {
            warn!("join: no stored credentials");
            return self.ensure_provisioning(io);
        };

        let before = self.network.state();
        if before != ConnectionState::Connecting {
            io.sink.emit(&AppEvent::ConnectionChanged {
                from: before,
                to: ConnectionState::Connecting,
            });
        }
        let outcome = self.network.attempt_connect(&credentials, io.delay);
        self.note_transition(ConnectionState::Connecting, io);

        match outcome {
            JoinOutcome::Connected => {
                let ip = self
                    .network
                    .station_ip()
                    .map_or_else(|| "unknown".into(), |ip| ip.to_string());
                info!("join: connected, IP {ip}");
                let ip_line = format!("IP: {ip}");
                self.show(io, &["WiFi Connected!", &ip_line, "Reading sensor...", ""]);
                io.delay.delay_ms(CONNECTION_BANNER_MS);
                self.telemetry_cadence.rearm_immediate();
                TickOutcome::Continue
            }
            JoinOutcome::Failed => {
                self.connectivity = Connectivity::Offline;
                self.show(io, &["WiFi Connection", "Failed!", "Starting AP mode...", ""]);
                io.delay.delay_ms(CONNECTION_BANNER_MS);
                self.ensure_provisioning(io)
            }
        }
    }

    /// Bring up the access point and the portal if they are not already.
    fn ensure_provisioning(&mut self, io: &mut Io<'_>) -> TickOutcome {
        if self.network.state() != ConnectionState::ApMode {
            let before = self.network.state();
            if let Err(e) = self.network.enter_ap_mode() {
                error!("network: access point failed: {e}");
                return self.restart(RestartReason::RadioFault, io);
            }
            self.note_transition(before, io);
        }

        if !self.portal_started {
            match io.portal.ensure_started(&self.portal_page()) {
                Ok(()) => {
                    info!("portal: serving on {:?}", self.network.access_point_ip());
                    self.portal_started = true;
                }
                Err(e) => error!("portal: {e}, retrying next tick"),
            }
        }
        TickOutcome::Continue
    }

    fn note_transition(&self, before: ConnectionState, io: &mut Io<'_>) {
        let after = self.network.state();
        if before != after {
            io.sink.emit(&AppEvent::ConnectionChanged { from: before, to: after });
        }
    }

    fn portal_page(&self) -> PortalPage {
        PortalPage {
            device_name: self.profile.name.into(),
            device_id: self.identity.to_string(),
            api_base_url: self.config.config().api_base_url.clone(),
        }
    }

    fn accept_submission(&mut self, credentials: NetworkCredentials, io: &mut Io<'_>) -> TickOutcome {
        info!("portal: submission for SSID '{}'", credentials.ssid());
        match self.config.save(credentials) {
            Ok(()) => {
                io.sink.emit(&AppEvent::Provisioned);
                self.restart(RestartReason::Provisioned, io)
            }
            Err(e) => {
                error!("portal: could not persist credentials: {e}");
                TickOutcome::Continue
            }
        }
    }

    // ── Display ───────────────────────────────────────────────

    fn show(&self, io: &mut Io<'_>, lines: &[&str; 4]) {
        if self.commands.screen_enabled() {
            io.display.show(lines);
        }
    }

    fn show_ap_status(&self, io: &mut Io<'_>) {
        let ssid = format!("SSID: {}", self.network.ap_ssid());
        let ip = format!(
            "IP: {}",
            self.network
                .access_point_ip()
                .map_or_else(|| "-".into(), |ip| ip.to_string())
        );
        let pass = format!("Password: {}", self.network.ap_passphrase());
        self.show(io, &["AP Mode Active", &ssid, &ip, &pass]);
    }

    fn refresh_readout(&mut self, now: u64, io: &mut Io<'_>) {
        let sample = TelemetrySample {
            value: self.sensor.read(),
            captured_at: now,
        };
        io.sink.emit(&AppEvent::Reading(sample));

        if self.commands.screen_enabled() {
            let header = format!("{} - {}", self.identity, self.connectivity.label());
            io.display
                .show_readout(&header, &format_reading(sample.value), self.profile.unit);
        }
    }

    // ── Telemetry ─────────────────────────────────────────────

    fn report(&mut self, now: u64, io: &mut Io<'_>) -> Option<RemoteCommand> {
        let sample = TelemetrySample {
            value: self.sensor.read(),
            captured_at: now,
        };

        if !self.network.is_link_up() {
            warn!("telemetry: link down, reading not sent");
            self.connectivity = Connectivity::Offline;
            io.sink.emit(&AppEvent::ReportFailed {
                sample,
                reason: ReportFailure::LinkDown,
            });
            return None;
        }

        let payload = TelemetryPayload {
            device_id: self.identity.as_str(),
            final_value: sample.value,
        };
        let body = match serde_json::to_string(&payload) {
            Ok(b) => b,
            Err(e) => {
                error!("telemetry: payload encoding failed: {e}");
                return None;
            }
        };
        let url = telemetry_url(&self.config.config().api_base_url);

        match io.transport.post_json(&url, &body, TRANSPORT_TIMEOUT_MS) {
            Ok(response) => {
                info!("telemetry: {} -> HTTP {}", body, response.status);
                self.connectivity = Connectivity::Online;
                io.sink.emit(&AppEvent::ReportDelivered {
                    sample,
                    status: response.status,
                });
                RemoteCommand::from_response(&response.body)
            }
            Err(e) => {
                warn!("telemetry: POST {url} failed: {e}");
                self.connectivity = Connectivity::Offline;
                io.sink.emit(&AppEvent::ReportFailed {
                    sample,
                    reason: ReportFailure::Transport(e),
                });
                None
            }
        }
    }

    fn dispatch(&mut self, command: &RemoteCommand, io: &mut Io<'_>) -> TickOutcome {
        io.sink.emit(&AppEvent::CommandReceived(command.name.clone()));
        match self.commands.apply(command, &mut self.config, io.display) {
            CommandOutcome::RestartRequired(reason) => self.restart(reason, io),
            CommandOutcome::Applied | CommandOutcome::Ignored | CommandOutcome::Rejected(_) => {
                TickOutcome::Continue
            }
        }
    }

    // ── Restart ───────────────────────────────────────────────

    /// The only place a restart is issued once the service is running.
    fn restart(&mut self, reason: RestartReason, io: &mut Io<'_>) -> TickOutcome {
        warn!("restart: {:?}", reason);
        io.sink.emit(&AppEvent::RestartScheduled(reason));
        if let Some(banner) = restart_banner(reason) {
            self.show(io, &banner.each_ref().map(String::as_str));
        }
        io.delay.delay_ms(restart_grace_ms(reason));
        io.system.restart(reason);
        TickOutcome::Restart(reason)
    }
}
