//! Provisioning HTTP server.
//!
//! Implements [`PortalPort`].  Pages and form handling come from
//! [`crate::app::portal`]; this adapter owns the listener and hands each
//! validated submission to the main loop through a one-slot channel.  The
//! HTTP task never touches storage.
//!
//! A second submission arriving before the loop drained the first is
//! answered `503`.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::portal::{handle_configure, PortalReply, ERROR_CONTENT_TYPE};
use crate::app::ports::{PortalError, PortalPage, PortalPort};
use crate::config::NetworkCredentials;

#[cfg(target_os = "espidf")]
use crate::app::portal::{render_form, FORM_CONTENT_TYPE, MAX_FORM_BODY};
#[cfg(target_os = "espidf")]
use embedded_svc::{
    http::Method,
    io::{Read, Write},
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::server::{Configuration, EspHttpServer};

pub type SubmissionChannel = Channel<CriticalSectionRawMutex, NetworkCredentials, 1>;

#[cfg(target_os = "espidf")]
static SUBMISSIONS: SubmissionChannel = Channel::new();

/// Queue the credentials of a successful reply.  Turns the reply into a
/// `503` if the slot is still occupied.
pub fn hand_over(mut reply: PortalReply, channel: &SubmissionChannel) -> PortalReply {
    let Some(credentials) = reply.submission.take() else {
        return reply;
    };
    match channel.try_send(credentials) {
        Ok(()) => reply,
        Err(_) => {
            warn!("portal: previous submission still pending");
            PortalReply {
                status: 503,
                content_type: ERROR_CONTENT_TYPE,
                body: "Error: Busy, try again".into(),
                submission: None,
            }
        }
    }
}

pub struct PortalServer {
    #[cfg(target_os = "espidf")]
    server: Option<EspHttpServer<'static>>,

    #[cfg(not(target_os = "espidf"))]
    submissions: SubmissionChannel,
    #[cfg(not(target_os = "espidf"))]
    page: Option<PortalPage>,
    #[cfg(not(target_os = "espidf"))]
    fail_start: bool,
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl PortalServer {
    pub fn new() -> Self {
        Self { server: None }
    }
}

#[cfg(target_os = "espidf")]
impl Default for PortalServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl PortalPort for PortalServer {
    fn ensure_started(&mut self, page: &PortalPage) -> Result<(), PortalError> {
        if self.server.is_some() {
            return Ok(());
        }
        let mut server = EspHttpServer::new(&Configuration::default()).map_err(|e| {
            warn!("portal: server start failed: {e}");
            PortalError::ServerStart
        })?;

        let form = render_form(page);
        server
            .fn_handler::<anyhow::Error, _>("/", Method::Get, move |req| {
                req.into_response(200, Some("OK"), &[("Content-Type", FORM_CONTENT_TYPE)])?
                    .write_all(form.as_bytes())?;
                Ok(())
            })
            .map_err(|_| PortalError::HandlerRegistration)?;

        server
            .fn_handler::<anyhow::Error, _>("/configure", Method::Post, |mut req| {
                // One byte past the limit so oversized bodies are detected.
                let mut buf = [0u8; MAX_FORM_BODY + 1];
                let mut filled = 0;
                while filled < buf.len() {
                    let n = req.read(&mut buf[filled..])?;
                    if n == 0 {
                        break;
                    }
                    filled += n;
                }
                let reply = hand_over(handle_configure(&buf[..filled]), &SUBMISSIONS);
                req.into_response(reply.status, None, &[("Content-Type", reply.content_type)])?
                    .write_all(reply.body.as_bytes())?;
                Ok(())
            })
            .map_err(|_| PortalError::HandlerRegistration)?;

        info!("portal: listening on port 80");
        self.server = Some(server);
        Ok(())
    }

    fn poll_submission(&mut self) -> Option<NetworkCredentials> {
        SUBMISSIONS.try_receive().ok()
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl PortalServer {
    pub fn new() -> Self {
        Self {
            submissions: Channel::new(),
            page: None,
            fail_start: false,
        }
    }

    pub fn sim_fail_start(&mut self, fail: bool) {
        self.fail_start = fail;
    }

    pub fn is_started(&self) -> bool {
        self.page.is_some()
    }

    /// `GET /`.  `None` while the server is down.
    pub fn sim_get_form(&self) -> Option<String> {
        self.page.as_ref().map(crate::app::portal::render_form)
    }

    /// `POST /configure` with a raw urlencoded body.
    pub fn sim_post_configure(&self, body: &[u8]) -> Option<PortalReply> {
        self.page.as_ref()?;
        Some(hand_over(handle_configure(body), &self.submissions))
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for PortalServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl PortalPort for PortalServer {
    fn ensure_started(&mut self, page: &PortalPage) -> Result<(), PortalError> {
        if self.fail_start {
            return Err(PortalError::ServerStart);
        }
        if self.page.is_none() {
            info!("portal(sim): serving '{}'", page.device_id);
            self.page = Some(page.clone());
        }
        Ok(())
    }

    fn poll_submission(&mut self) -> Option<NetworkCredentials> {
        self.submissions.try_receive().ok()
    }
}
