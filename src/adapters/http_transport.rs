//! HTTP(S) telemetry client.
//!
//! Implements [`TelemetryTransport`].  One connection per report: the
//! reporting interval is minutes, so there is nothing worth keeping alive.
//! At most [`MAX_RESPONSE_BODY`] bytes of the answer are read.

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

use log::{debug, warn};

use crate::app::ports::{TelemetryTransport, TransportError, TransportResponse};

#[cfg(target_os = "espidf")]
use embedded_svc::{
    http::client::Client,
    io::{Read, Write},
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    http::client::{Configuration, EspHttpConnection},
    io::EspIOError,
    sys::{esp_crt_bundle_attach, ESP_ERR_HTTP_EAGAIN, ESP_ERR_TIMEOUT},
};

/// Largest response body handed to the command parser.
pub const MAX_RESPONSE_BODY: usize = 1024;

/// A request captured by the simulation backend.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRequest {
    pub url: String,
    pub body: String,
    pub timeout_ms: u64,
}

#[derive(Default)]
pub struct HttpTransport {
    #[cfg(not(target_os = "espidf"))]
    scripted: VecDeque<Result<TransportResponse, TransportError>>,
    #[cfg(not(target_os = "espidf"))]
    sent: Vec<SentRequest>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(not(target_os = "espidf"))]
impl HttpTransport {
    /// Queue the answer for the next request.
    pub fn script(&mut self, response: Result<TransportResponse, TransportError>) {
        self.scripted.push_back(response);
    }

    pub fn sent(&self) -> &[SentRequest] {
        &self.sent
    }
}

fn truncate_body(bytes: &[u8]) -> String {
    let end = bytes.len().min(MAX_RESPONSE_BODY);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(target_os = "espidf")]
fn classify(e: EspIOError) -> TransportError {
    let code = e.0.code();
    if code == ESP_ERR_HTTP_EAGAIN as i32 || code == ESP_ERR_TIMEOUT as i32 {
        TransportError::Timeout
    } else {
        TransportError::Connection
    }
}

#[cfg(target_os = "espidf")]
impl TelemetryTransport for HttpTransport {
    fn post_json(
        &mut self,
        url: &str,
        body: &str,
        timeout_ms: u64,
    ) -> Result<TransportResponse, TransportError> {
        let config = Configuration {
            timeout: Some(core::time::Duration::from_millis(timeout_ms)),
            crt_bundle_attach: Some(esp_crt_bundle_attach),
            ..Default::default()
        };
        let connection = EspHttpConnection::new(&config).map_err(|e| {
            warn!("http: connection setup failed: {e}");
            TransportError::Connection
        })?;
        let mut client = Client::wrap(connection);

        let content_length = body.len().to_string();
        let headers = [
            ("Content-Type", "application/json"),
            ("Content-Length", content_length.as_str()),
        ];
        let mut request = client.post(url, &headers).map_err(classify)?;
        request.write_all(body.as_bytes()).map_err(classify)?;
        request.flush().map_err(classify)?;
        let mut response = request.submit().map_err(classify)?;
        let status = response.status();

        let mut buf = [0u8; MAX_RESPONSE_BODY];
        let mut filled = 0;
        while filled < buf.len() {
            match response.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) => {
                    warn!("http: body read failed after {filled} bytes: {e}");
                    return Err(TransportError::Read);
                }
            }
        }
        debug!("http: {url} -> {status} ({filled} bytes)");
        Ok(TransportResponse {
            status,
            body: truncate_body(&buf[..filled]),
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl TelemetryTransport for HttpTransport {
    fn post_json(
        &mut self,
        url: &str,
        body: &str,
        timeout_ms: u64,
    ) -> Result<TransportResponse, TransportError> {
        self.sent.push(SentRequest {
            url: url.into(),
            body: body.into(),
            timeout_ms,
        });
        let response = self.scripted.pop_front().unwrap_or(Ok(TransportResponse {
            status: 200,
            body: "{}".into(),
        }));
        match &response {
            Ok(r) => debug!("http(sim): {url} -> {}", r.status),
            Err(e) => warn!("http(sim): {url} failed: {e}"),
        }
        response.map(|r| TransportResponse {
            status: r.status,
            body: truncate_body(r.body.as_bytes()),
        })
    }
}
