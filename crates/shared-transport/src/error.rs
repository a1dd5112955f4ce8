//! Transport error types.

use shared_types::TypesError;
use thiserror::Error;

/// Errors raised by transports. Node workers log these and carry on.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Listener could not bind. The only error that stops a node from starting.
    #[error("Failed to bind {endpoint}: {reason}")]
    Bind { endpoint: String, reason: String },

    /// Operation needs a bound socket.
    #[error("Transport not connected")]
    NotConnected,

    #[error("Connection to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("Timed out after {after_ms}ms talking to {endpoint}")]
    Timeout { endpoint: String, after_ms: u64 },

    /// No node is listening at the target endpoint.
    #[error("Peer unreachable: {0}")]
    Unreachable(String),

    #[error("In-memory transport requires a mesh network")]
    NoMeshNetwork,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] TypesError),
}

/// Result alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
