//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! structured line to the ESP-IDF logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::{AppEvent, ReportFailure};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Booted { configured } => {
                info!("BOOT | configured={}", configured);
            }
            AppEvent::ConnectionChanged { from, to } => {
                info!("NET | {} -> {}", from, to);
            }
            AppEvent::Reading(s) => {
                info!("READ | value={:.3} t={}ms", s.value, s.captured_at);
            }
            AppEvent::ReportDelivered { sample, status } => {
                info!(
                    "TELEM | value={:.3} t={}ms | HTTP {}",
                    sample.value, sample.captured_at, status
                );
            }
            AppEvent::ReportFailed { sample, reason } => match reason {
                ReportFailure::LinkDown => {
                    warn!("TELEM | value={:.3} | offline (link down)", sample.value);
                }
                ReportFailure::Transport(e) => {
                    warn!("TELEM | value={:.3} | offline ({})", sample.value, e);
                }
            },
            AppEvent::CommandReceived(name) => {
                info!("CMD | {}", name);
            }
            AppEvent::Provisioned => {
                info!("PROV | credentials stored");
            }
            AppEvent::RestartScheduled(reason) => {
                warn!("RESTART | {:?}", reason);
            }
        }
    }
}
