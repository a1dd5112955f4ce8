//! # Tendermint-Lite Engine
//!
//! Tallies prevotes and precommits per `(height, round, shard)`. Locks are
//! kept per `(height, shard)` so a lock taken in round `r` still binds the
//! prevote in round `r + 1`.

use crate::domain::{Ballot, CommitCertificate, Proposal, RoundState, TliConfig, Vote, VoteKind};
use crate::error::{ConsensusError, ConsensusResult};
use crate::ports::ConsensusEngine;
use std::collections::HashMap;
use tracing::{debug, info};

type RoundKey = (u64, u64, String);
type HeightKey = (u64, String);

pub struct TliEngine {
    config: TliConfig,
    validator_id: String,
    signature: String,
    rounds: HashMap<RoundKey, RoundState>,
    locks: HashMap<HeightKey, String>,
    /// Highest round with state, per height.
    latest_round: HashMap<HeightKey, u64>,
}

impl TliEngine {
    /// Engine voting as `validator_id`; emitted votes carry `signature`.
    pub fn new(
        config: TliConfig,
        validator_id: impl Into<String>,
        signature: impl Into<String>,
    ) -> ConsensusResult<Self> {
        let validator_id = validator_id.into();
        if validator_id.is_empty() {
            return Err(ConsensusError::EmptyValidatorId);
        }
        Ok(Self {
            config,
            validator_id,
            signature: signature.into(),
            rounds: HashMap::new(),
            locks: HashMap::new(),
            latest_round: HashMap::new(),
        })
    }

    pub fn config(&self) -> &TliConfig {
        &self.config
    }

    pub fn validator_id(&self) -> &str {
        &self.validator_id
    }

    pub fn round_state(&self, height: u64, round: u64, shard_id: &str) -> Option<&RoundState> {
        self.rounds.get(&(height, round, shard_id.to_string()))
    }

    /// Certificate formed at `(height, round, shard)`, if any.
    pub fn certificate(&self, height: u64, round: u64, shard_id: &str) -> Option<&CommitCertificate> {
        self.round_state(height, round, shard_id)?.certificate.as_ref()
    }

    fn round_mut(&mut self, height: u64, round: u64, shard_id: &str) -> &mut RoundState {
        let latest = self
            .latest_round
            .entry((height, shard_id.to_string()))
            .or_insert(round);
        *latest = (*latest).max(round);

        self.rounds
            .entry((height, round, shard_id.to_string()))
            .or_insert_with(|| RoundState::new(height, round, shard_id))
    }

    /// Rounds more than `max_round_skips` past the latest known round at
    /// their height are not tracked.
    fn too_far_ahead(&self, height: u64, round: u64, shard_id: &str) -> bool {
        let latest = self
            .latest_round
            .get(&(height, shard_id.to_string()))
            .copied()
            .unwrap_or(0);
        round > latest.saturating_add(u64::from(self.config.max_round_skips))
    }

    fn check_vote(&self, vote: &Vote, expected: VoteKind) -> ConsensusResult<()> {
        if vote.kind != expected {
            return Err(ConsensusError::WrongVoteKind {
                expected,
                got: vote.kind,
            });
        }
        if vote.voter.is_empty() {
            return Err(ConsensusError::AnonymousVote);
        }
        Ok(())
    }

    fn stamp(&self, kind: VoteKind, height: u64, round: u64, shard_id: &str, hash: &str) -> Vote {
        Vote {
            kind,
            height,
            round,
            shard_id: shard_id.to_string(),
            proposal_hash: hash.to_string(),
            voter: self.validator_id.clone(),
            signature: self.signature.clone(),
        }
    }
}

impl ConsensusEngine for TliEngine {
    fn on_proposal(&mut self, proposal: &Proposal) -> Vote {
        let lock = self
            .locks
            .get(&(proposal.height, proposal.shard_id.clone()))
            .cloned();

        if self.too_far_ahead(proposal.height, proposal.round, &proposal.shard_id) {
            debug!(
                "[mp-05] not tracking proposal for distant round {} at height {}",
                proposal.round, proposal.height
            );
        } else {
            let rs = self.round_mut(proposal.height, proposal.round, &proposal.shard_id);
            rs.proposal_hash = Some(proposal.proposal_hash.clone());
            rs.locked_hash = lock.clone();
        }

        let vote_hash = match lock {
            Some(locked) if locked != proposal.proposal_hash => {
                debug!(
                    "[mp-05] locked on {} at height {}, ignoring proposal {}",
                    locked, proposal.height, proposal.proposal_hash
                );
                locked
            }
            _ => proposal.proposal_hash.clone(),
        };

        self.stamp(
            VoteKind::Prevote,
            proposal.height,
            proposal.round,
            &proposal.shard_id,
            &vote_hash,
        )
    }

    fn on_prevote(&mut self, vote: &Vote) -> ConsensusResult<Option<Vote>> {
        self.check_vote(vote, VoteKind::Prevote)?;
        if self.too_far_ahead(vote.height, vote.round, &vote.shard_id) {
            debug!("[mp-05] dropping prevote for distant round {}", vote.round);
            return Ok(None);
        }

        let quorum = self.config.quorum();
        let rs = self.round_mut(vote.height, vote.round, &vote.shard_id);
        rs.prevotes.insert(
            vote.voter.clone(),
            Ballot {
                proposal_hash: vote.proposal_hash.clone(),
                signature: vote.signature.clone(),
            },
        );

        if rs.precommit_sent {
            return Ok(None);
        }
        let Some((hash, count)) = RoundState::leading_hash(&rs.prevotes) else {
            return Ok(None);
        };
        if count < quorum {
            return Ok(None);
        }

        rs.locked_hash = Some(hash.clone());
        rs.precommit_sent = true;
        self.locks
            .insert((vote.height, vote.shard_id.clone()), hash.clone());
        debug!(
            "[mp-05] {} prevotes for {} at ({}, {}), precommitting",
            count, hash, vote.height, vote.round
        );

        Ok(Some(self.stamp(
            VoteKind::Precommit,
            vote.height,
            vote.round,
            &vote.shard_id,
            &hash,
        )))
    }

    fn on_precommit(&mut self, vote: &Vote) -> ConsensusResult<Option<CommitCertificate>> {
        self.check_vote(vote, VoteKind::Precommit)?;
        if self.too_far_ahead(vote.height, vote.round, &vote.shard_id) {
            debug!("[mp-05] dropping precommit for distant round {}", vote.round);
            return Ok(None);
        }

        let quorum = self.config.quorum();
        let rs = self.round_mut(vote.height, vote.round, &vote.shard_id);
        rs.precommits.insert(
            vote.voter.clone(),
            Ballot {
                proposal_hash: vote.proposal_hash.clone(),
                signature: vote.signature.clone(),
            },
        );

        if rs.certificate.is_some() {
            return Ok(None);
        }
        let precommits = rs.precommits_for(&vote.proposal_hash);
        if precommits.len() < quorum {
            return Ok(None);
        }

        let certificate = CommitCertificate {
            height: vote.height,
            round: vote.round,
            shard_id: vote.shard_id.clone(),
            proposal_hash: vote.proposal_hash.clone(),
            precommits,
        };
        rs.certificate = Some(certificate.clone());
        info!(
            "[mp-05] commit certificate for {} at height {} round {} ({} precommits)",
            certificate.proposal_hash,
            certificate.height,
            certificate.round,
            certificate.precommits.len()
        );
        Ok(Some(certificate))
    }

    fn locked(&self, shard_id: &str) -> Option<String> {
        let (height, _) = self
            .rounds
            .keys()
            .filter(|(_, _, s)| s == shard_id)
            .map(|(h, r, _)| (*h, *r))
            .max()?;
        self.locks.get(&(height, shard_id.to_string())).cloned()
    }
}
