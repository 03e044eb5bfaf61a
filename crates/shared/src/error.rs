//! Shared error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error envelope returned by the inventory API.
///
/// Most handlers raise `HTTPException`, which serializes as `{"detail": "..."}`.
/// Request validation failures put a list of field errors in `detail` instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

/// Attempt to pull a user-facing message out of an API error body.
/// Returns the `detail` string, or the first validation `msg` when `detail` is a list.
pub fn try_error_detail(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(detail) if !detail.trim().is_empty() => Some(detail),
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg")?.as_str().map(str::to_string)),
        _ => None,
    }
}

/// API error type for client-side use
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

impl ApiError {
    /// Message suitable for storing in a slice's error field.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { body, .. } => {
                try_error_detail(body).unwrap_or_else(|| self.to_string())
            }
            _ => self.to_string(),
        }
    }
}

/// Failure to move a frame across the live-update wire.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Failure of the underlying live-update transport.
///
/// Transport errors never reach callers of the connection manager; they are
/// logged and observed as a closed channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Io(String),
    #[error("channel closed")]
    Closed,
}
