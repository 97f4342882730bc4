//! Outbound application events.
//!
//! The [`DeviceService`](super::service::DeviceService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use super::commands::CommandName;
use super::network::ConnectionState;
use super::ports::{RestartReason, TransportError};

/// One reading as it leaves the device.  Produced, transmitted, dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    pub value: f32,
    /// Monotonic ms since boot.
    pub captured_at: u64,
}

/// Why a report did not reach the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFailure {
    LinkDown,
    Transport(TransportError),
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Boot finished; carries whether credentials were found.
    Booted { configured: bool },

    ConnectionChanged {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// A readout was taken for the display.
    Reading(TelemetrySample),

    /// The collector answered.
    ReportDelivered { sample: TelemetrySample, status: u16 },

    ReportFailed {
        sample: TelemetrySample,
        reason: ReportFailure,
    },

    CommandReceived(CommandName),

    /// New credentials were persisted from the portal.
    Provisioned,

    RestartScheduled(RestartReason),
}
