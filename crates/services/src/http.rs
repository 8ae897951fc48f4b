//! Shared HTTP client construction and status handling.

use deckgen_core::{Error, Result};
use std::time::Duration;

/// Upper bound for completion and search calls.
pub const API_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-candidate timeout for raw image downloads.
pub const IMAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = concat!("deckgen/", env!("CARGO_PKG_VERSION"));

/// Build a client with the given request timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::HttpError(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::HttpError(format!("request timed out: {}", e))
    } else {
        Error::HttpError(e.to_string())
    }
}

/// Turn a non-success response into [`Error::ApiError`] carrying the body text.
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::ApiError {
        status: status.as_u16(),
        message: api_error_message(&body),
    })
}

/// Prefer the `error.message` field of a Google-style error body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
