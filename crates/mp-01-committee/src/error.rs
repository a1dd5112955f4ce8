//! Committee error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommitteeError {
    /// No committee member with this name.
    #[error("Unknown authority: {0}")]
    UnknownAuthority(String),

    /// Threshold must lie in `(0, 1]`.
    #[error("Invalid quorum threshold: {0}")]
    InvalidThreshold(f64),

    #[error("Duplicate authority in committee: {0}")]
    DuplicateAuthority(String),
}

pub type CommitteeResult<T> = Result<T, CommitteeError>;
