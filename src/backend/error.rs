//! Errors crossing the backend boundary.

use serde_json::Value;
use thiserror::Error;

/// Fallback when neither the backend nor the transport offered anything.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Used for a 401 whose body carries no detail of its own.
pub const NOT_AUTHENTICATED: &str = "Not authenticated with the conferencing service";

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Network failure, timeout, or an unreadable body.
    #[error("{0}")]
    Transport(String),

    /// The backend does not hold valid provider credentials.
    #[error("{message}")]
    Auth { message: String },

    /// Non-2xx response. `message` is the most specific text available.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// A 2xx response whose payload did not have the expected shape.
    #[error("Invalid response from server: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Build from a non-2xx response, preferring the backend's structured detail.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = structured_message(body);
        if status == 401 {
            return Self::Auth {
                message: detail.unwrap_or_else(|| NOT_AUTHENTICATED.to_string()),
            };
        }
        let message = detail.unwrap_or_else(|| format!("Request failed with status {status}"));
        Self::Status { status, message }
    }

    pub fn transport(err: &reqwest::Error) -> Self {
        let text = err.to_string();
        if text.trim().is_empty() {
            Self::Transport(UNKNOWN_ERROR.to_string())
        } else {
            Self::Transport(text)
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Auth { .. } => Some(401),
            _ => None,
        }
    }
}

/// Pull `detail`, then `message`, then `error` out of a JSON error body.
pub fn structured_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    let detail = object.get("detail").and_then(|detail| match detail {
        Value::String(s) => Some(s.clone()),
        Value::Object(inner) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    });

    detail
        .or_else(|| {
            object
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .or_else(|| object.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|s| !s.trim().is_empty())
}
