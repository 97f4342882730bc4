//! Unified error type for the EcoMonitor firmware.
//!
//! Each port owns a small `Copy` error enum (see [`crate::app::ports`]);
//! adapter constructors and `main` funnel them into [`Error`].  Tick-level
//! code never returns this type: the lifecycle loop converts every failure
//! into a status label, a corrected value, or a restart decision.

use core::fmt;

use crate::app::ports::{ConfigError, PortalError, RadioError, StorageError, TransportError};
use crate::config::CredentialsError;

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Storage(StorageError),
    Config(ConfigError),
    Credentials(CredentialsError),
    Radio(RadioError),
    Transport(TransportError),
    Portal(PortalError),
    Display(DisplayError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Credentials(e) => write!(f, "credentials: {e}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Portal(e) => write!(f, "portal: {e}"),
            Self::Display(e) => write!(f, "display: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Display errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// Controller did not acknowledge the init sequence.
    InitFailed,
    /// Frame buffer could not be pushed over I2C.
    FlushFailed,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "SSD1306 allocation/init failed"),
            Self::FlushFailed => write!(f, "SSD1306 flush failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<CredentialsError> for Error {
    fn from(e: CredentialsError) -> Self {
        Self::Credentials(e)
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<PortalError> for Error {
    fn from(e: PortalError) -> Self {
        Self::Portal(e)
    }
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}
