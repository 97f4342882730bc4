//! EcoMonitor firmware entry point.
//!
//! Wires the ESP-IDF adapters into the [`DeviceService`] and runs the
//! cooperative lifecycle loop on the main task.  The HTTP server and the
//! WiFi driver run on their own ESP-IDF tasks.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  OledStatusSurface  HttpTransport  PortalServer  WifiAdapter │
//! │  NvsAdapter  Esp32TimeAdapter  EspSystem  LogEventSink       │
//! │  Reading source: Mq7Sensor | Ds18b20Sensor | Am2320Sensor    │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  DeviceService: ConfigManager · NetworkController ·    │  │
//! │  │  CommandProcessor · cadences                           │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::cell::RefCell;

use anyhow::{bail, Result};
use embedded_hal::delay::DelayNs;
use embedded_hal_bus::i2c::RefCellDevice;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info};

use ecomonitor::adapters::device_id;
use ecomonitor::adapters::display::OledStatusSurface;
use ecomonitor::adapters::http_transport::HttpTransport;
use ecomonitor::adapters::log_sink::LogEventSink;
use ecomonitor::adapters::nvs::{NvsAdapter, CONFIG_NAMESPACE};
use ecomonitor::adapters::portal_server::PortalServer;
use ecomonitor::adapters::system::EspSystem;
use ecomonitor::adapters::time::Esp32TimeAdapter;
use ecomonitor::adapters::wifi::WifiAdapter;
use ecomonitor::app::config_manager::ConfigManager;
use ecomonitor::app::network::NetworkController;
use ecomonitor::app::ports::{ReadingSource, RestartReason};
use ecomonitor::app::service::{fatal_restart, DeviceService, Io, TickOutcome};
use ecomonitor::config::{DeviceProfile, AP_PASSPHRASE, TICK_DELAY_MS, WATCHDOG_TIMEOUT_MS};
use ecomonitor::drivers::watchdog::Watchdog;
use ecomonitor::error::Error;
use ecomonitor::pins;

const PROFILE: DeviceProfile = DeviceProfile::active();

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("{} firmware v{}", PROFILE.name, env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let clock = Esp32TimeAdapter::new();
    let mut delay = Esp32TimeAdapter::new();
    let mut system = EspSystem::new();

    // ── 2. Shared I2C bus + display ───────────────────────────
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(pins::I2C_BAUD_HZ.Hz()),
    )?;
    // Lives for the whole program; shared by the panel and the AM2320.
    let i2c_bus: &'static RefCell<I2cDriver<'static>> = Box::leak(Box::new(RefCell::new(i2c)));

    let mut display = match OledStatusSurface::new(RefCellDevice::new(i2c_bus)) {
        Ok(d) => d,
        Err(e) => {
            error!("display init failed: {e}");
            fatal_restart(RestartReason::DisplayFault, &mut delay, &mut system);
            bail!("display init failed: {e}");
        }
    };

    // ── 3. Reading source for this profile ────────────────────
    #[cfg(feature = "tempguard")]
    let sensor: Box<dyn ReadingSource> = Box::new(ecomonitor::sensors::Ds18b20Sensor::new(
        peripherals.pins.gpio19.into(),
    )?);

    #[cfg(all(feature = "humidguard", not(feature = "tempguard")))]
    let sensor: Box<dyn ReadingSource> = Box::new(ecomonitor::sensors::Am2320Sensor::new(
        RefCellDevice::new(i2c_bus),
        esp_idf_svc::hal::delay::Ets,
    ));

    #[cfg(not(any(feature = "tempguard", feature = "humidguard")))]
    let sensor: Box<dyn ReadingSource> = {
        ecomonitor::drivers::adc::init_adc1()?;
        Box::new(ecomonitor::sensors::Mq7Sensor::new(
            ecomonitor::drivers::adc::ADC1_CH_MQ7,
        ))
    };

    // ── 4. Storage, identity, radio ───────────────────────────
    let nvs = NvsAdapter::new(CONFIG_NAMESPACE).map_err(Error::from)?;
    let identity = device_id::identity(PROFILE.prefix, &device_id::read_mac());
    info!("identity: {}", identity);

    let wifi = WifiAdapter::new(peripherals.modem, sysloop, nvs_partition).map_err(Error::from)?;
    let network = NetworkController::new(wifi, PROFILE.name, AP_PASSPHRASE);
    let config = ConfigManager::new(nvs, PROFILE.api_base_url);

    let mut service = DeviceService::new(identity, PROFILE, config, network, sensor);

    // ── 5. Lifecycle loop ─────────────────────────────────────
    let mut transport = HttpTransport::new();
    let mut portal = PortalServer::new();
    let mut sink = LogEventSink::new();
    let watchdog = Watchdog::new(WATCHDOG_TIMEOUT_MS);

    let mut io = Io {
        display: &mut display,
        transport: &mut transport,
        portal: &mut portal,
        clock: &clock,
        delay: &mut delay,
        system: &mut system,
        sink: &mut sink,
    };

    if let TickOutcome::Restart(reason) = service.boot(&mut io) {
        error!("restart during boot did not take effect ({:?})", reason);
    }

    loop {
        watchdog.feed();
        if let TickOutcome::Restart(reason) = service.tick(&mut io) {
            error!("restart did not take effect ({:?})", reason);
        }
        io.delay.delay_ms(TICK_DELAY_MS);
    }
}
