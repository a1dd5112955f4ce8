//! Error types for the TLI consensus engine.

use crate::domain::VoteKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    /// Fewer validators than a BFT quorum can tolerate.
    #[error("n={n} cannot tolerate f={f} faults; need n >= 3f+1")]
    InsufficientValidators { n: usize, f: usize },

    #[error("Expected a {expected} vote, got {got}")]
    WrongVoteKind { expected: VoteKind, got: VoteKind },

    #[error("Vote carries no voter identity")]
    AnonymousVote,

    #[error("Validator id must not be empty")]
    EmptyValidatorId,
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;
