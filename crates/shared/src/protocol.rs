//! Wire format for the live-update channel.
//!
//! Frames are UTF-8 text holding one JSON value. No schema is enforced at
//! this layer; callers get a `serde_json::Value` and decide what it means.

use serde::Serialize;
use serde_json::Value;

use crate::error::WireError;

/// Serialize an outbound payload into a text frame.
pub fn encode_frame<T: Serialize + ?Sized>(payload: &T) -> Result<String, WireError> {
    serde_json::to_string(payload).map_err(WireError::Encode)
}

/// Decode an inbound text frame into a JSON value.
pub fn decode_frame(text: &str) -> Result<Value, WireError> {
    serde_json::from_str(text).map_err(WireError::Decode)
}
