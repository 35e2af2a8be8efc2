//! Typed client for the HR service dashboard endpoints.
//!
//! Only the two read endpoints the dashboard consumes are modeled here; the
//! rest of the service surface (auth, uploads, job analysis) is out of scope.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::http_client;

const METRICS_PATH: &str = "/api/hr/metrics";
const CANDIDATES_PATH: &str = "/api/hr/candidates";

const MAX_METRICS_RESPONSE_BYTES: usize = 256 * 1024;
const MAX_CANDIDATES_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// Opaque metrics object returned by the service; consumed as-is.
pub type Metrics = serde_json::Map<String, serde_json::Value>;

/// One candidate record as returned by the candidate-list endpoint.
///
/// Unknown fields are ignored; a missing `skills` array is treated as empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Errors produced while fetching dashboard data.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The endpoint answered with a non-success status.
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },
    /// The request never produced a response (DNS, connect, timeout, ...).
    #[error("HTTP error: {0}")]
    Transport(String),
    /// The response body could not be read or decoded.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether the failure originated server-side (5xx-equivalent).
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::Status { code, .. } if (500..=599).contains(code))
    }

    /// HTTP status code, when the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Client bound to one HR service base URL.
#[derive(Clone, Debug)]
pub struct HrClient {
    base_url: String,
}

impl HrClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the service-side metrics object (best-effort source).
    pub fn fetch_metrics(&self) -> Result<Metrics, FetchError> {
        let body = self.get(METRICS_PATH, MAX_METRICS_RESPONSE_BYTES)?;
        if body.trim().is_empty() {
            return Ok(Metrics::new());
        }
        serde_json::from_str(&body).map_err(|err| FetchError::Decode(err.to_string()))
    }

    /// Fetch the full candidate list (fatal source).
    pub fn fetch_candidates(&self) -> Result<Vec<Candidate>, FetchError> {
        let body = self.get(CANDIDATES_PATH, MAX_CANDIDATES_RESPONSE_BYTES)?;
        serde_json::from_str(&body).map_err(|err| FetchError::Decode(err.to_string()))
    }

    fn get(&self, path: &str, max_bytes: usize) -> Result<String, FetchError> {
        let url = format!("{}{path}", self.base_url);
        let response = match http_client::agent()
            .get(&url)
            .set("Accept", "application/json")
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = read_body_limited(response, max_bytes).unwrap_or_else(|err| err);
                return Err(FetchError::Status {
                    code,
                    message: extract_server_message(&body),
                });
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(FetchError::Transport(err.to_string()));
            }
        };
        read_body_limited(response, max_bytes).map_err(FetchError::Decode)
    }
}

/// Pull a human-readable message out of an error body when the service sent
/// structured JSON, falling back to the raw (trimmed) body.
fn extract_server_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            for key in ["message", "error"] {
                if let Some(message) = value.get(key).and_then(|message| message.as_str()) {
                    return message.to_string();
                }
            }
        }
    }
    trimmed.to_string()
}

fn read_body_limited(response: ureq::Response, max_bytes: usize) -> Result<String, String> {
    let bytes =
        http_client::read_response_bytes(response, max_bytes).map_err(|err| err.to_string())?;
    String::from_utf8(bytes).map_err(|err| err.to_string())
}
