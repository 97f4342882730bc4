//! Mock hardware for integration tests.
//!
//! Storage, radio, portal, HTTP client and restart use the library's own
//! simulation backends.  What they cannot observe (screen contents, virtual
//! time, emitted events, the reading) is mocked here.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use ecomonitor::adapters::http_transport::HttpTransport;
use ecomonitor::adapters::nvs::{NvsAdapter, CONFIG_NAMESPACE};
use ecomonitor::adapters::portal_server::PortalServer;
use ecomonitor::adapters::system::EspSystem;
use ecomonitor::adapters::wifi::WifiAdapter;
use ecomonitor::app::config_manager::{
    ConfigManager, KEY_IS_CONFIGURED, KEY_PASSWORD, KEY_READING_TIME, KEY_SSID,
};
use ecomonitor::app::events::AppEvent;
use ecomonitor::app::network::NetworkController;
use ecomonitor::app::ports::{
    Clock, EventSink, ReadingSource, StatusSurface, StoragePort, TransportError, TransportResponse,
};
use ecomonitor::app::service::{DeviceService, Io, TickOutcome};
use ecomonitor::config::{DeviceIdentity, DeviceProfile, AP_PASSPHRASE};
use embedded_hal::delay::DelayNs;

pub const API: &str = "http://collector.test/api";
pub const DEVICE_ID: &str = "GG-1A2B3C4D";

pub type Service = DeviceService<NvsAdapter, WifiAdapter>;

// ── Virtual time ──────────────────────────────────────────────

/// Clock and delay share one nanosecond counter; every delay moves time.
#[derive(Clone, Default)]
pub struct SimTime(Rc<Cell<u64>>);

impl SimTime {
    pub fn now_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }

    pub fn advance_ms(&self, ms: u64) {
        self.0.set(self.0.get() + ms * 1_000_000);
    }
}

impl Clock for SimTime {
    fn now_ms(&self) -> u64 {
        SimTime::now_ms(self)
    }
}

impl DelayNs for SimTime {
    fn delay_ns(&mut self, ns: u32) {
        self.0.set(self.0.get() + u64::from(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance_ms(u64::from(ms));
    }
}

// ── Display ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Text([String; 4]),
    Readout {
        header: String,
        value: String,
        unit: String,
    },
}

pub struct MockDisplay {
    pub screens: Vec<Screen>,
    pub powered: bool,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self {
            screens: Vec::new(),
            powered: true,
        }
    }

    pub fn texts(&self) -> Vec<&[String; 4]> {
        self.screens
            .iter()
            .filter_map(|s| match s {
                Screen::Text(lines) => Some(lines),
                Screen::Readout { .. } => None,
            })
            .collect()
    }

    pub fn showed_line(&self, needle: &str) -> bool {
        self.texts().iter().any(|lines| lines.iter().any(|l| l == needle))
    }

    pub fn readouts(&self) -> Vec<(&str, &str, &str)> {
        self.screens
            .iter()
            .filter_map(|s| match s {
                Screen::Readout {
                    header,
                    value,
                    unit,
                } => Some((header.as_str(), value.as_str(), unit.as_str())),
                Screen::Text(_) => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<&[String; 4]> {
        self.texts().last().copied()
    }
}

impl StatusSurface for MockDisplay {
    fn show(&mut self, lines: &[&str; 4]) {
        self.screens
            .push(Screen::Text(lines.map(|l| l.to_string())));
    }

    fn show_readout(&mut self, header: &str, value: &str, unit: &str) {
        self.screens.push(Screen::Readout {
            header: header.into(),
            value: value.into(),
            unit: unit.into(),
        });
    }

    fn set_powered(&mut self, on: bool) {
        self.powered = on;
    }
}

// ── Events ────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Reading source ────────────────────────────────────────────

/// Returns whatever the shared cell holds.
pub struct FixedSensor(pub Rc<Cell<f32>>);

impl ReadingSource for FixedSensor {
    fn read(&mut self) -> f32 {
        self.0.get()
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Everything a `DeviceService` borrows per call.
pub struct Rig {
    pub display: MockDisplay,
    pub transport: HttpTransport,
    pub portal: PortalServer,
    pub clock: SimTime,
    pub delay: SimTime,
    pub system: EspSystem,
    pub sink: RecordingSink,
    pub reading: Rc<Cell<f32>>,
}

impl Rig {
    pub fn new() -> Self {
        let time = SimTime::default();
        Self {
            display: MockDisplay::new(),
            transport: HttpTransport::new(),
            portal: PortalServer::new(),
            clock: time.clone(),
            delay: time,
            system: EspSystem::new(),
            sink: RecordingSink::default(),
            reading: Rc::new(Cell::new(0.5)),
        }
    }

    pub fn io(&mut self) -> Io<'_> {
        Io {
            display: &mut self.display,
            transport: &mut self.transport,
            portal: &mut self.portal,
            clock: &self.clock,
            delay: &mut self.delay,
            system: &mut self.system,
            sink: &mut self.sink,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn advance_ms(&self, ms: u64) {
        self.clock.advance_ms(ms);
    }

    pub fn service(&self, nvs: NvsAdapter, wifi: WifiAdapter) -> Service {
        let identity = DeviceIdentity::new("GG-", 0x1A2B_3C4D);
        let network = NetworkController::new(wifi, "GasGuard", AP_PASSPHRASE);
        let config = ConfigManager::new(nvs, API);
        DeviceService::new(
            identity,
            DeviceProfile::GAS_GUARD,
            config,
            network,
            Box::new(FixedSensor(self.reading.clone())),
        )
    }

    pub fn boot(&mut self, service: &mut Service) -> TickOutcome {
        let mut io = self.io();
        service.boot(&mut io)
    }

    pub fn tick(&mut self, service: &mut Service) -> TickOutcome {
        let mut io = self.io();
        service.tick(&mut io)
    }

    /// Tick repeatedly, moving time by `step_ms` before each tick.
    pub fn run_for(&mut self, service: &mut Service, total_ms: u64, step_ms: u64) -> TickOutcome {
        let end = self.now_ms() + total_ms;
        while self.now_ms() < end {
            self.advance_ms(step_ms);
            let outcome = self.tick(service);
            if outcome != TickOutcome::Continue {
                return outcome;
            }
        }
        TickOutcome::Continue
    }

    pub fn script_response(&mut self, status: u16, body: &str) {
        self.transport.script(Ok(TransportResponse {
            status,
            body: body.into(),
        }));
    }

    pub fn script_failure(&mut self, error: TransportError) {
        self.transport.script(Err(error));
    }
}

// ── Storage helpers ───────────────────────────────────────────

pub fn blank_nvs() -> NvsAdapter {
    NvsAdapter::new(CONFIG_NAMESPACE).expect("sim NVS")
}

pub fn provisioned_nvs(ssid: &str, password: &str) -> NvsAdapter {
    let mut nvs = blank_nvs();
    nvs.set_str(KEY_SSID, ssid).unwrap();
    nvs.set_str(KEY_PASSWORD, password).unwrap();
    nvs.set_bool(KEY_IS_CONFIGURED, true).unwrap();
    nvs.set_str(KEY_READING_TIME, "15").unwrap();
    nvs
}

/// Boot a provisioned device on a network that accepts the join.
pub fn connected(rig: &mut Rig) -> Service {
    let mut service = rig.service(provisioned_nvs("Home", "hunter2hunter2"), WifiAdapter::new());
    assert_eq!(rig.boot(&mut service), TickOutcome::Continue);
    service
}

/// Boot a device with empty storage.
pub fn unconfigured(rig: &mut Rig) -> Service {
    let mut service = rig.service(blank_nvs(), WifiAdapter::new());
    assert_eq!(rig.boot(&mut service), TickOutcome::Continue);
    service
}

pub fn stored_str(service: &Service, key: &str) -> Option<String> {
    service.config().store().get_str(key).unwrap()
}

pub fn stored_bool(service: &Service, key: &str) -> Option<bool> {
    service.config().store().get_bool(key).unwrap()
}
