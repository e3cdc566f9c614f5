//! Client error types.

use serde_json::Value;
use thiserror::Error;

use lostfound_protocol::value::optional_text;

/// Result type for client operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the client.
///
/// Malformed records inside an otherwise valid response are never errors;
/// they are dropped or defaulted during normalization.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected the request or answered with an error payload.
    #[error("{message}")]
    Request {
        message: String,
        code: Option<i64>,
        status: Option<u16>,
    },

    /// A required argument was empty or invalid; nothing was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Connection, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be read as JSON.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
            code: None,
            status: None,
        }
    }

    /// Backend error code, when one was reported.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Request { code, .. } => *code,
            _ => None,
        }
    }

    /// HTTP status of the failed response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Build a request error from an error payload.
    ///
    /// Uses `message` and an integral `code` when present, otherwise a
    /// message derived from the HTTP status.
    pub fn from_payload(payload: Option<&Value>, status: Option<u16>) -> Self {
        let fallback = match status {
            Some(status) => format!("request failed ({status})"),
            None => "request failed".to_string(),
        };

        let Some(Value::Object(fields)) = payload else {
            return Self::Request {
                message: fallback,
                code: None,
                status,
            };
        };

        Self::Request {
            message: optional_text(fields.get("message")).unwrap_or(fallback),
            code: fields.get("code").and_then(Value::as_i64),
            status,
        }
    }
}
