//! JSON frame codec
//!
//! Frames are JSON objects tagged by `kind`. A frame with a kind this
//! implementation does not know is reported as [`Decoded::UnknownKind`] so
//! the receiver can drop it silently.

use serde_json::Value;
use thiserror::Error;

use super::Message;

/// Encoding failure
#[derive(Debug, Error)]
#[error("Failed to encode message: {0}")]
pub struct CodecError(#[from] serde_json::Error);

/// Outcome of decoding one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A protocol message
    Message(Message),

    /// Well-formed frame with an unrecognised `kind`
    UnknownKind(String),

    /// Not a decodable frame
    Malformed(String),
}

/// Encode a message as one JSON frame.
pub fn encode(message: &Message) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(message)?)
}

/// Decode one JSON frame.
pub fn decode(frame: &[u8]) -> Decoded {
    let value: Value = match serde_json::from_slice(frame) {
        Ok(value) => value,
        Err(e) => return Decoded::Malformed(e.to_string()),
    };

    let kind = match value.get("kind").and_then(Value::as_str) {
        Some(kind) => kind.to_string(),
        None => return Decoded::Malformed("missing kind".to_string()),
    };

    if !Message::KINDS.contains(&kind.as_str()) {
        return Decoded::UnknownKind(kind);
    }

    match serde_json::from_value(value) {
        Ok(message) => Decoded::Message(message),
        Err(e) => Decoded::Malformed(e.to_string()),
    }
}
