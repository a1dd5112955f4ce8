//! Driving port for consensus engines.

use crate::domain::{CommitCertificate, Proposal, Vote};
use crate::error::ConsensusResult;

/// Minimal Tendermint-like engine.
///
/// Implementations are single-threaded state machines; callers serialize
/// access the same way the authority worker serializes ledger updates.
pub trait ConsensusEngine: Send {
    /// Accept a proposal and answer with this validator's prevote.
    fn on_proposal(&mut self, proposal: &Proposal) -> Vote;

    /// Record a prevote; returns a precommit once some hash has `2f+1` prevotes.
    fn on_prevote(&mut self, vote: &Vote) -> ConsensusResult<Option<Vote>>;

    /// Record a precommit; returns the certificate once `2f+1` precommits agree.
    fn on_precommit(&mut self, vote: &Vote) -> ConsensusResult<Option<CommitCertificate>>;

    /// Lock held at the most recent `(height, round)` seen for the shard.
    fn locked(&self, shard_id: &str) -> Option<String>;
}
