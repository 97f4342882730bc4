//! Device configuration and compile-time design values.
//!
//! Runtime state ([`DeviceConfig`], [`NetworkCredentials`]) is owned by the
//! [`ConfigManager`](crate::app::config_manager::ConfigManager) and persisted
//! in NVS.  Everything else in this module is fixed at build time: the
//! [`DeviceProfile`] is selected by cargo feature and the timing constants
//! are the shipped design values.

use core::fmt;

// ---------------------------------------------------------------------------
// Design values
// ---------------------------------------------------------------------------

/// Passphrase of the provisioning access point.
pub const AP_PASSPHRASE: &str = "12345678";

/// Collector endpoint used until one is stored in NVS.
pub const DEFAULT_API_BASE_URL: &str = "https://ecomonitor-znv9.onrender.com/api";

/// Reporting interval bounds, in minutes.
pub const DEFAULT_READING_MINUTES: u16 = 15;
pub const MIN_READING_MINUTES: u16 = 1;
pub const MAX_READING_MINUTES: u16 = 1440;

/// Connected-mode readout cadence.
pub const DISPLAY_REFRESH_MS: u64 = 5_000;
/// AP-mode status screen cadence.
pub const AP_STATUS_REFRESH_MS: u64 = 2_000;

/// Station join budget: `JOIN_ATTEMPTS` link polls, `JOIN_POLL_MS` apart.
pub const JOIN_ATTEMPTS: u32 = 20;
pub const JOIN_POLL_MS: u32 = 500;

/// Upper bound for one telemetry POST.
pub const TRANSPORT_TIMEOUT_MS: u64 = 10_000;

/// Pause before restarting after a remote command.
pub const COMMAND_RESTART_GRACE_MS: u32 = 2_000;
/// Pause before restarting after a provisioning submission.
pub const PROVISIONING_RESTART_GRACE_MS: u32 = 5_000;
/// Pause before restarting after a fatal peripheral fault.
pub const FAULT_RESTART_PAUSE_MS: u32 = 5_000;

/// How long the boot splash and the join result banners stay up.
pub const BOOT_SPLASH_MS: u32 = 2_000;
pub const CONNECTION_BANNER_MS: u32 = 2_000;

/// Main loop pacing between ticks.
pub const TICK_DELAY_MS: u32 = 10;

/// Task watchdog timeout.  Must exceed the longest blocking operation
/// (join budget or transport timeout plus a restart grace).
pub const WATCHDOG_TIMEOUT_MS: u32 = 30_000;

// ---------------------------------------------------------------------------
// Device profile
// ---------------------------------------------------------------------------

/// Static description of one product variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Product name; doubles as the access point SSID.
    pub name: &'static str,
    /// Identity prefix, e.g. `GG-`.
    pub prefix: &'static str,
    /// Unit suffix appended to the on-screen reading.
    pub unit: &'static str,
    pub api_base_url: &'static str,
}

impl DeviceProfile {
    pub const GAS_GUARD: Self = Self {
        name: "GasGuard",
        prefix: "GG-",
        unit: " ppm",
        api_base_url: DEFAULT_API_BASE_URL,
    };

    pub const TEMP_GUARD: Self = Self {
        name: "TempGuard",
        prefix: "TG-",
        unit: " \u{00b0}C",
        api_base_url: DEFAULT_API_BASE_URL,
    };

    pub const HUMID_GUARD: Self = Self {
        name: "HumidGuard",
        prefix: "HG-",
        unit: " % RH",
        api_base_url: DEFAULT_API_BASE_URL,
    };

    /// Profile selected by the enabled cargo feature.
    ///
    /// Precedence: `tempguard`, `humidguard`, then `gasguard` (the default).
    pub const fn active() -> Self {
        if cfg!(feature = "tempguard") {
            Self::TEMP_GUARD
        } else if cfg!(feature = "humidguard") {
            Self::HUMID_GUARD
        } else {
            Self::GAS_GUARD
        }
    }
}

// ---------------------------------------------------------------------------
// Device identity
// ---------------------------------------------------------------------------

/// `<prefix><HEX(hardware_id)>`, computed once at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    hardware_id: u32,
    value: heapless::String<24>,
}

impl DeviceIdentity {
    pub fn new(prefix: &str, hardware_id: u32) -> Self {
        use core::fmt::Write;

        let mut value = heapless::String::new();
        // Profile prefixes are short ASCII; 8 hex digits always fit behind them.
        let _ = write!(value, "{}{:X}", prefix, hardware_id);
        Self { hardware_id, value }
    }

    pub fn hardware_id(&self) -> u32 {
        self.hardware_id
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// ---------------------------------------------------------------------------
// Network credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsError {
    InvalidSsid,
    InvalidPassphrase,
}

impl fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID must be 1-32 printable ASCII characters"),
            Self::InvalidPassphrase => {
                write!(f, "password must be empty or 8-64 printable ASCII characters")
            }
        }
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Station credentials.  Construction validates, so a value of this type is
/// always something the radio can be handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkCredentials {
    ssid: heapless::String<32>,
    passphrase: heapless::String<64>,
}

impl NetworkCredentials {
    pub fn new(ssid: &str, passphrase: &str) -> Result<Self, CredentialsError> {
        if !is_printable_ascii(ssid) {
            return Err(CredentialsError::InvalidSsid);
        }
        let ssid = heapless::String::try_from(ssid)
            .ok()
            .filter(|s: &heapless::String<32>| !s.is_empty())
            .ok_or(CredentialsError::InvalidSsid)?;

        if !passphrase.is_empty() && (passphrase.len() < 8 || !is_printable_ascii(passphrase)) {
            return Err(CredentialsError::InvalidPassphrase);
        }
        let passphrase =
            heapless::String::try_from(passphrase).map_err(|_| CredentialsError::InvalidPassphrase)?;

        Ok(Self { ssid, passphrase })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Open networks carry an empty passphrase.
    pub fn is_open(&self) -> bool {
        self.passphrase.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Device config
// ---------------------------------------------------------------------------

/// Persisted operating parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub is_configured: bool,
    /// Always within `MIN_READING_MINUTES..=MAX_READING_MINUTES`.
    pub reporting_interval_minutes: u16,
    pub api_base_url: String,
}

impl DeviceConfig {
    pub fn with_api_base_url(api_base_url: &str) -> Self {
        Self {
            is_configured: false,
            reporting_interval_minutes: DEFAULT_READING_MINUTES,
            api_base_url: api_base_url.into(),
        }
    }

    pub fn reporting_interval_ms(&self) -> u64 {
        u64::from(self.reporting_interval_minutes) * 60_000
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::with_api_base_url(DEFAULT_API_BASE_URL)
    }
}

/// Parse a stored or remotely supplied interval.  `None` unless the text is
/// an integer inside the valid range.
pub fn parse_reading_minutes(raw: &str) -> Option<u16> {
    let minutes: i64 = raw.trim().parse().ok()?;
    u16::try_from(minutes)
        .ok()
        .filter(|m| (MIN_READING_MINUTES..=MAX_READING_MINUTES).contains(m))
}
