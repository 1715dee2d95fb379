//! Classification of non-2xx backend responses.

use std::fmt;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::error::DeskError;

/// Default wait when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Longest body excerpt carried into an error message
const MAX_BODY_EXCERPT: usize = 200;

/// A failed backend call, keeping the HTTP status for classification.
#[derive(Debug)]
pub struct ApiError {
    pub status: Option<StatusCode>,
    pub retry_after: Option<u64>,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            retry_after: None,
            message: message.into(),
        }
    }

    /// Build from a non-success response's status, headers and body text.
    pub fn from_response(status: StatusCode, headers: &HeaderMap, body: &str) -> Self {
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            status: Some(status),
            retry_after,
            message: summarize_body(status, body),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == Some(StatusCode::TOO_MANY_REQUESTS)
    }

    /// Server-side failures that are worth retrying
    pub fn is_transient(&self) -> bool {
        self.status.is_some_and(|s| s.is_server_error())
    }

    pub fn to_desk_error(&self) -> DeskError {
        if self.is_rate_limited() {
            return DeskError::RateLimited(self.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS));
        }
        DeskError::Api(self.message.clone())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ApiError> for DeskError {
    fn from(error: ApiError) -> Self {
        error.to_desk_error()
    }
}

fn summarize_body(status: StatusCode, body: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Unknown");
    let body = body.trim();
    if body.is_empty() {
        return format!("{} {}", status.as_u16(), reason);
    }

    // Backends usually answer `{ "message": "..." }` or `{ "error": "..." }`
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|k| v.get(k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.chars().take(MAX_BODY_EXCERPT).collect());

    format!("{} {}: {}", status.as_u16(), reason, detail)
}
