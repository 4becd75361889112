//! Protocol layer errors

use thiserror::Error;

/// Errors produced by frame encode/decode
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// Encode-time: payload exceeds the 8-byte frame capacity.
    /// Fatal to that call — the caller must not send the frame.
    #[error("Payload too long: {0} bytes (max 8)")]
    InvalidPayload(usize),

    /// Decode-time: raw record does not match the fixed wire size.
    /// The frame is dropped; no state changes.
    #[error("Malformed frame: {0} bytes (expected 16)")]
    MalformedFrame(usize),
}
