//! Best-effort beacon delivery to the tracking endpoints.
//!
//! Delivery is at-most-once by contract: one POST per call, no retry, no
//! queueing. A failed POST is logged and returned as `Err`; the caller
//! decides whether a later trigger re-attempts the transition. The remote
//! response body is acknowledged and logged, never otherwise interpreted.

use serde::{Deserialize, Serialize};

/// Canonical install endpoint, relative to the base URL.
pub const INSTALL_ENDPOINT: &str = "/track-install/";
/// Canonical uninstall endpoint, relative to the base URL.
pub const UNINSTALL_ENDPOINT: &str = "/track-uninstall/";

/// Anti-forgery cookie name and the header it is forwarded as.
const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "X-CSRFToken";

/// Immutable event report sent to the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeaconPayload {
    pub device_id: String,
    /// Readable vendor label; omitted when the user agent is unrecognized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// Raw user-agent string.
    pub device_info: String,
}

/// Remote acknowledgement. The endpoint returns a small JSON object; we only
/// log it, so unknown fields are fine and all fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Why a beacon did not get through. All variants are non-fatal.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("{endpoint} returned a malformed response: {source}")]
    MalformedResponse {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Performs the idempotent network call for one beacon.
pub trait Reporter {
    fn report(&self, endpoint: &str, payload: &BeaconPayload) -> Result<Ack, ReportError>;
}

/// Blocking HTTP reporter.
///
/// Posts JSON to `{base_url}{endpoint}`, forwarding the host-provided cookie
/// header and attaching `X-CSRFToken` when a `csrftoken` cookie is present.
/// No timeout beyond the transport default, no retries.
pub struct HttpReporter {
    client: reqwest::blocking::Client,
    base_url: String,
    cookie_header: Option<String>,
}

impl HttpReporter {
    pub fn new(base_url: impl Into<String>, cookie_header: Option<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
            cookie_header,
        }
    }
}

impl Reporter for HttpReporter {
    fn report(&self, endpoint: &str, payload: &BeaconPayload) -> Result<Ack, ReportError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), endpoint);

        let mut request = self.client.post(&url).json(payload);
        if let Some(cookie) = &self.cookie_header {
            request = request.header(reqwest::header::COOKIE, cookie);
            if let Some(token) = csrf_token(cookie) {
                request = request.header(CSRF_HEADER, token);
            }
        }

        let response = request.send().map_err(|e| ReportError::Transport {
            endpoint: endpoint.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let ack: Ack = response.json().map_err(|e| ReportError::MalformedResponse {
            endpoint: endpoint.to_string(),
            source: e,
        })?;
        tracing::debug!(endpoint, status = ?ack.status, "beacon acknowledged");
        Ok(ack)
    }
}

/// The anti-forgery token to attach, if the cookie header carries a
/// non-empty `csrftoken`. An empty cookie value means no header at all.
fn csrf_token(cookie_header: &str) -> Option<String> {
    cookie_value(cookie_header, CSRF_COOKIE).filter(|token| !token.is_empty())
}

/// Extracts a named cookie from a `Cookie:`-style header string, decoding
/// percent-escapes the way the browser would.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(name).and_then(|r| r.strip_prefix('=')) {
            return Some(percent_decode(value));
        }
    }
    None
}

fn percent_decode(value: &str) -> String {
    fn hex(b: u8) -> Option<u8> {
        (b as char).to_digit(16).map(|d| d as u8)
    }

    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_omits_missing_device_name() {
        let payload = BeaconPayload {
            device_id: "id-1".to_string(),
            device_name: None,
            device_info: "curl/8.4.0".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("device_name").is_none());
        assert_eq!(json["device_id"], "id-1");
        assert_eq!(json["device_info"], "curl/8.4.0");
    }

    #[test]
    fn test_payload_includes_device_name_when_present() {
        let payload = BeaconPayload {
            device_id: "id-1".to_string(),
            device_name: Some("iPhone".to_string()),
            device_info: "Mozilla/5.0 (iPhone)".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["device_name"], "iPhone");
    }

    #[test]
    fn test_cookie_value_found() {
        let header = "sessionid=abc123; csrftoken=tok-42; theme=dark";
        assert_eq!(cookie_value(header, "csrftoken"), Some("tok-42".to_string()));
    }

    #[test]
    fn test_cookie_value_missing() {
        assert_eq!(cookie_value("sessionid=abc123", "csrftoken"), None);
    }

    #[test]
    fn test_cookie_value_does_not_match_prefix_names() {
        // "xcsrftoken" must not satisfy a lookup for "csrftoken".
        assert_eq!(cookie_value("xcsrftoken=nope", "csrftoken"), None);
    }

    #[test]
    fn test_cookie_value_percent_decoded() {
        assert_eq!(
            cookie_value("csrftoken=a%2Fb%3Dc", "csrftoken"),
            Some("a/b=c".to_string())
        );
    }

    #[test]
    fn test_csrf_token_from_cookie_header() {
        assert_eq!(
            csrf_token("sessionid=abc; csrftoken=tok-42"),
            Some("tok-42".to_string())
        );
    }

    #[test]
    fn test_empty_csrf_cookie_yields_no_token() {
        // "csrftoken=" parses as an empty value; no header gets attached.
        assert_eq!(cookie_value("csrftoken=", "csrftoken"), Some(String::new()));
        assert_eq!(csrf_token("csrftoken="), None);
        assert_eq!(csrf_token("sessionid=abc"), None);
    }

    #[test]
    fn test_percent_decode_leaves_invalid_escapes() {
        assert_eq!(percent_decode("a%zzb"), "a%zzb");
        assert_eq!(percent_decode("trailing%2"), "trailing%2");
    }

    #[test]
    fn test_ack_tolerates_unknown_fields() {
        let ack: Ack =
            serde_json::from_str(r#"{"status": "ok", "install_count": 3}"#).unwrap();
        assert_eq!(ack.status.as_deref(), Some("ok"));
        assert!(ack.message.is_none());
    }
}
