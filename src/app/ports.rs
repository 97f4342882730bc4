//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DeviceService (domain)
//! ```
//!
//! Driven adapters (sensor, radio, display, HTTP client, portal server,
//! storage, event sinks) implement these traits.  The
//! [`DeviceService`](super::service::DeviceService) consumes them through
//! generics or trait objects, so the domain core never touches hardware
//! directly.  Delays use [`embedded_hal::delay::DelayNs`] rather than a port
//! of their own.

use core::fmt;
use core::net::Ipv4Addr;

use crate::config::NetworkCredentials;

// ───────────────────────────────────────────────────────────────
// Reading source (driven adapter: sensor → domain)
// ───────────────────────────────────────────────────────────────

/// One physical sensor variant.  The service holds exactly one, boxed,
/// chosen at startup.
pub trait ReadingSource {
    /// Produce one calibrated reading.  A failed acquisition yields `NaN`.
    fn read(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS)
// ───────────────────────────────────────────────────────────────

/// Flat key/value store surviving power cycles.
///
/// Only the [`ConfigManager`](super::config_manager::ConfigManager) writes
/// through this port.  Missing keys read as `Ok(None)`.
pub trait StoragePort {
    fn get_str(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn get_bool(&self, key: &str) -> Result<Option<bool>, StorageError>;
    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StorageError>;
    /// Remove every key in the namespace.
    fn clear(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Status surface (driven adapter: domain → OLED)
// ───────────────────────────────────────────────────────────────

/// Four-line text display.
pub trait StatusSurface {
    fn show(&mut self, lines: &[&str; 4]);
    /// Readout screen: header line, rule, then the value in a large font
    /// followed by its unit.
    fn show_readout(&mut self, header: &str, value: &str, unit: &str);
    fn set_powered(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Telemetry transport (driven adapter: domain → collector)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

pub trait TelemetryTransport {
    /// POST a JSON document and return whatever the server answered.
    fn post_json(
        &mut self,
        url: &str,
        body: &str,
        timeout_ms: u64,
    ) -> Result<TransportResponse, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: domain ↔ WiFi driver)
// ───────────────────────────────────────────────────────────────

/// Raw radio control.  Sequencing, attempt budgets and state tracking live
/// in the [`NetworkController`](super::network::NetworkController).
pub trait RadioPort {
    /// Switch to isolated access-point mode.
    fn start_access_point(&mut self, ssid: &str, passphrase: &str) -> Result<(), RadioError>;
    /// Switch to client mode and start joining.  Does not wait for the link.
    fn begin_join(&mut self, credentials: &NetworkCredentials) -> Result<(), RadioError>;
    /// Non-blocking link status.
    fn is_link_up(&self) -> bool;
    fn access_point_ip(&self) -> Option<Ipv4Addr>;
    fn station_ip(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Provisioning portal (driven adapter: domain ↔ HTTP server)
// ───────────────────────────────────────────────────────────────

/// Data the portal form is rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalPage {
    pub device_name: String,
    pub device_id: String,
    pub api_base_url: String,
}

pub trait PortalPort {
    /// Start serving `GET /` and `POST /configure`.  Idempotent.
    fn ensure_started(&mut self, page: &PortalPage) -> Result<(), PortalError>;
    /// Take at most one validated submission.
    fn poll_submission(&mut self) -> Option<NetworkCredentials>;
}

// ───────────────────────────────────────────────────────────────
// Clock & system
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Why the device is about to restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    Reboot,
    ReadingTimeChanged(u16),
    FactoryReset,
    Provisioned,
    DisplayFault,
    RadioFault,
}

pub trait SystemPort {
    /// Full process restart.  Does not return on hardware.
    fn restart(&mut self, reason: RestartReason);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Port errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    IoError,
    /// Value cannot be stored (embedded NUL, too large) or read back (not UTF-8).
    InvalidValue,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::IoError => write!(f, "storage I/O error"),
            Self::InvalidValue => write!(f, "value cannot be stored"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Caller supplied a value outside its valid range.
    InvalidArgument(&'static str),
    Storage(StorageError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The WiFi driver rejected a configuration or mode switch.
    Driver(i32),
    InvalidConfiguration,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver(rc) => write!(f, "WiFi driver error (rc={rc})"),
            Self::InvalidConfiguration => write!(f, "WiFi configuration rejected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Could not open a connection or send the request.
    Connection,
    Timeout,
    /// Response could not be read.
    Read,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection => write!(f, "connection failed"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Read => write!(f, "response read failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalError {
    ServerStart,
    HandlerRegistration,
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerStart => write!(f, "HTTP server failed to start"),
            Self::HandlerRegistration => write!(f, "HTTP handler registration failed"),
        }
    }
}
