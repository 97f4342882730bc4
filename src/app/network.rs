//! Network controller — owns the radio mode and the [`ConnectionState`].
//!
//! ```text
//!   Unconfigured ──enter_ap_mode──▶ ApMode
//!        │                            │
//!        └────────attempt_connect─────┴──▶ Connecting ──link up──▶ Connected
//!                                              │                      │
//!                              budget exhausted▼          link lost   │
//!                                       ConnectionFailed ◀──(rejoin)──┘
//!                                              │
//!                                              └──enter_ap_mode──▶ ApMode
//! ```
//!
//! The join loop is the only blocking path: `JOIN_ATTEMPTS` link polls
//! separated by `JOIN_POLL_MS`.  Every state change is logged.

use core::fmt;
use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use super::ports::{RadioError, RadioPort};
use crate::config::{NetworkCredentials, JOIN_ATTEMPTS, JOIN_POLL_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unconfigured,
    ApMode,
    Connecting,
    Connected,
    ConnectionFailed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unconfigured => "Unconfigured",
            Self::ApMode => "ApMode",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::ConnectionFailed => "ConnectionFailed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Connected,
    Failed,
}

pub struct NetworkController<R: RadioPort> {
    radio: R,
    state: ConnectionState,
    ap_ssid: &'static str,
    ap_passphrase: &'static str,
    join_attempts: u32,
    join_poll_ms: u32,
}

impl<R: RadioPort> NetworkController<R> {
    pub fn new(radio: R, ap_ssid: &'static str, ap_passphrase: &'static str) -> Self {
        Self {
            radio,
            state: ConnectionState::Unconfigured,
            ap_ssid,
            ap_passphrase,
            join_attempts: JOIN_ATTEMPTS,
            join_poll_ms: JOIN_POLL_MS,
        }
    }

    /// Override the join budget (tests and bench rigs).
    pub fn with_join_budget(mut self, attempts: u32, poll_ms: u32) -> Self {
        self.join_attempts = attempts.max(1);
        self.join_poll_ms = poll_ms;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn ap_ssid(&self) -> &'static str {
        self.ap_ssid
    }

    pub fn ap_passphrase(&self) -> &'static str {
        self.ap_passphrase
    }

    pub fn access_point_ip(&self) -> Option<Ipv4Addr> {
        self.radio.access_point_ip()
    }

    pub fn station_ip(&self) -> Option<Ipv4Addr> {
        self.radio.station_ip()
    }

    fn transition(&mut self, to: ConnectionState) {
        if self.state != to {
            info!("network: {} -> {}", self.state, to);
            self.state = to;
        }
    }

    /// Bring up the provisioning access point.  A driver error here is fatal
    /// for the caller.
    pub fn enter_ap_mode(&mut self) -> Result<(), RadioError> {
        self.radio.start_access_point(self.ap_ssid, self.ap_passphrase)?;
        info!("network: access point '{}' up", self.ap_ssid);
        self.transition(ConnectionState::ApMode);
        Ok(())
    }

    /// Join `credentials.ssid`, polling the link up to the attempt budget.
    ///
    /// Leaves the controller in `Connected` or `ConnectionFailed`; the caller
    /// falls back with [`enter_ap_mode`](Self::enter_ap_mode) on failure.
    pub fn attempt_connect(
        &mut self,
        credentials: &NetworkCredentials,
        delay: &mut dyn DelayNs,
    ) -> JoinOutcome {
        self.transition(ConnectionState::Connecting);
        info!("network: joining '{}'", credentials.ssid());

        if let Err(e) = self.radio.begin_join(credentials) {
            warn!("network: join could not start: {e}");
            self.transition(ConnectionState::ConnectionFailed);
            return JoinOutcome::Failed;
        }

        for attempt in 1..=self.join_attempts {
            if self.radio.is_link_up() {
                info!("network: link up after {} poll(s)", attempt);
                self.transition(ConnectionState::Connected);
                return JoinOutcome::Connected;
            }
            delay.delay_ms(self.join_poll_ms);
        }

        if self.radio.is_link_up() {
            self.transition(ConnectionState::Connected);
            return JoinOutcome::Connected;
        }

        warn!(
            "network: '{}' not reachable after {} attempts",
            credentials.ssid(),
            self.join_attempts
        );
        self.transition(ConnectionState::ConnectionFailed);
        JoinOutcome::Failed
    }

    /// Non-blocking link query.
    pub fn is_link_up(&self) -> bool {
        self.radio.is_link_up()
    }

    /// Per-tick supervision while connected.  Returns `true` when the link
    /// was found down, in which case the state is now `Connecting`.
    pub fn detect_link_loss(&mut self) -> bool {
        if self.state == ConnectionState::Connected && !self.radio.is_link_up() {
            warn!("network: link lost");
            self.transition(ConnectionState::Connecting);
            return true;
        }
        false
    }
}
