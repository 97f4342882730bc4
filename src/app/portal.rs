//! Provisioning portal logic — page rendering and form handling.
//!
//! The HTTP server adapter owns sockets and routing; everything it serves is
//! produced here so it can be exercised on the host.
//!
//! | route             | result                                           |
//! |-------------------|--------------------------------------------------|
//! | `GET /`           | form with device name, id and API base URL       |
//! | `POST /configure` | 200 + submission, or 400 `text/plain` on bad input |

use super::ports::PortalPage;
use crate::config::NetworkCredentials;

pub const FORM_CONTENT_TYPE: &str = "text/html";
pub const ERROR_CONTENT_TYPE: &str = "text/plain";

/// Largest `POST /configure` body the server will read.
pub const MAX_FORM_BODY: usize = 512;

/// What the server should answer, plus the credentials to hand over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub submission: Option<NetworkCredentials>,
}

impl PortalReply {
    fn client_error(message: &str) -> Self {
        Self {
            status: 400,
            content_type: ERROR_CONTENT_TYPE,
            body: format!("Error: {message}"),
            submission: None,
        }
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `GET /` document.
pub fn render_form(page: &PortalPage) -> String {
    let name = escape_html(&page.device_name);
    let id = escape_html(&page.device_id);
    let api = escape_html(&page.api_base_url);
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{name} Setup</title></head><body>\
         <h1>{name} Setup</h1>\
         <p>Device ID: {id}</p>\
         <p>API: {api}</p>\
         <form action=\"/configure\" method=\"POST\">\
         <label for=\"ssid\">WiFi Name</label><br>\
         <input type=\"text\" id=\"ssid\" name=\"ssid\" maxlength=\"32\" required><br>\
         <label for=\"password\">WiFi Password</label><br>\
         <input type=\"password\" id=\"password\" name=\"password\" maxlength=\"64\"><br>\
         <input type=\"submit\" value=\"Save\">\
         </form></body></html>"
    )
}

fn success_page() -> String {
    "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Saved</title></head><body>\
     <h1>Configuration Saved!</h1>\
     <p>Device will restart and connect in 5 seconds...</p>\
     </body></html>"
        .into()
}

/// Handle a `POST /configure` body (`application/x-www-form-urlencoded`).
pub fn handle_configure(body: &[u8]) -> PortalReply {
    if body.len() > MAX_FORM_BODY {
        return PortalReply::client_error("Request Too Large");
    }
    let Ok(text) = core::str::from_utf8(body) else {
        return PortalReply::client_error("Malformed Form");
    };

    let mut ssid = None;
    let mut password = String::new();
    for (key, value) in parse_form(text) {
        match key.as_str() {
            "ssid" => ssid = Some(value),
            "password" => password = value,
            _ => {}
        }
    }

    let Some(ssid) = ssid.filter(|s| !s.is_empty()) else {
        return PortalReply::client_error("Missing WiFi Name");
    };

    match NetworkCredentials::new(&ssid, &password) {
        Ok(creds) => PortalReply {
            status: 200,
            content_type: FORM_CONTENT_TYPE,
            body: success_page(),
            submission: Some(creds),
        },
        Err(e) => PortalReply::client_error(&e.to_string()),
    }
}

/// Split and decode an urlencoded form.  Pairs that fail to decode are
/// dropped.
pub fn parse_form(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            Some((url_decode(k)?, url_decode(v)?))
        })
        .collect()
}

fn url_decode(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hex = bytes.get(i + 1..i + 3)?;
                if !hex.iter().all(u8::is_ascii_hexdigit) {
                    return None;
                }
                let hex = core::str::from_utf8(hex).ok()?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out).ok()
}
