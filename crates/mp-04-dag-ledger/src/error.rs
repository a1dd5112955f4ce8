//! Error types for the DAG ledger.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DagError {
    #[error("quorum_size must be positive")]
    InvalidQuorumSize,

    /// A block names a parent the ledger has never seen.
    #[error("Parent block {0} unknown; cannot attach child")]
    UnknownParent(Uuid),

    #[error("Unknown block {0}")]
    UnknownBlock(Uuid),

    /// Recomputed digest differs from the one carried in the payload.
    #[error("Block digest mismatch: expected {expected}, computed {computed}")]
    DigestMismatch { expected: String, computed: String },

    #[error("Malformed block payload: {0}")]
    MalformedPayload(String),
}

pub type DagResult<T> = Result<T, DagError>;
