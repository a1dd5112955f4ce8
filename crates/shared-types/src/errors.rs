//! # Error Types
//!
//! Errors raised while decoding messages or frames.

use crate::messages::MessageType;
use thiserror::Error;

/// Errors produced by the envelope and codec layers.
#[derive(Debug, Error)]
pub enum TypesError {
    /// The envelope parsed but its payload does not match the declared type.
    #[error("Malformed {message_type} payload: {reason}")]
    MalformedPayload {
        message_type: MessageType,
        reason: String,
    },

    /// The bytes are not a valid JSON envelope.
    #[error("Invalid message JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Frame length prefix exceeds the configured ceiling.
    #[error("Frame too large: {size} bytes exceeds limit of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },

    /// Fewer bytes were available than the length prefix announced.
    #[error("Truncated frame: expected {expected} bytes, got {actual}")]
    TruncatedFrame { expected: usize, actual: usize },
}

/// Result alias for shared-types operations.
pub type TypesResult<T> = Result<T, TypesError>;
