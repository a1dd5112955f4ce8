//! Proposals, votes, per-round state and commit certificates.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use shared_types::{canonical_json, Certificate, Preendorsement};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Block or single-transfer proposal at `(height, round)` for a shard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub height: u64,
    pub round: u64,
    pub shard_id: String,
    pub proposal_hash: String,
    pub proposer: String,
    pub payload: Value,
}

impl Proposal {
    /// Proposal whose hash is derived from its payload.
    pub fn new(
        height: u64,
        round: u64,
        shard_id: impl Into<String>,
        proposer: impl Into<String>,
        payload: Value,
    ) -> Self {
        let proposal_hash = hash_payload(&payload);
        Self {
            height,
            round,
            shard_id: shard_id.into(),
            proposal_hash,
            proposer: proposer.into(),
            payload,
        }
    }
}

/// Hex SHA-256 of the payload's canonical JSON.
pub fn hash_payload(payload: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(payload).as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Prevote,
    Precommit,
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteKind::Prevote => write!(f, "prevote"),
            VoteKind::Precommit => write!(f, "precommit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub kind: VoteKind,
    pub height: u64,
    pub round: u64,
    pub shard_id: String,
    pub proposal_hash: String,
    pub voter: String,
    pub signature: String,
}

impl Vote {
    pub fn prevote(
        height: u64,
        round: u64,
        shard_id: impl Into<String>,
        proposal_hash: impl Into<String>,
        voter: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            kind: VoteKind::Prevote,
            height,
            round,
            shard_id: shard_id.into(),
            proposal_hash: proposal_hash.into(),
            voter: voter.into(),
            signature: signature.into(),
        }
    }

    pub fn precommit(
        height: u64,
        round: u64,
        shard_id: impl Into<String>,
        proposal_hash: impl Into<String>,
        voter: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            kind: VoteKind::Precommit,
            ..Self::prevote(height, round, shard_id, proposal_hash, voter, signature)
        }
    }

    /// Prevote as a wire preendorsement for one transfer order.
    pub fn to_preendorsement(&self, order_id: Uuid) -> Preendorsement {
        Preendorsement {
            order_id,
            authority: self.voter.clone(),
            proposal_hash: self.proposal_hash.clone(),
            signature: self.signature.clone(),
        }
    }
}

/// What one voter said in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub proposal_hash: String,
    pub signature: String,
}

/// Votes and lock for one `(height, round, shard)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    pub height: u64,
    pub round: u64,
    pub shard_id: String,
    pub proposal_hash: Option<String>,
    pub locked_hash: Option<String>,
    /// voter -> ballot
    pub prevotes: BTreeMap<String, Ballot>,
    /// voter -> ballot
    pub precommits: BTreeMap<String, Ballot>,
    pub precommit_sent: bool,
    pub certificate: Option<CommitCertificate>,
}

impl RoundState {
    pub fn new(height: u64, round: u64, shard_id: impl Into<String>) -> Self {
        Self {
            height,
            round,
            shard_id: shard_id.into(),
            ..Self::default()
        }
    }

    /// Hash holding the most ballots, with its count. Ties go to the
    /// lexicographically smaller hash.
    pub fn leading_hash(ballots: &BTreeMap<String, Ballot>) -> Option<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for ballot in ballots.values() {
            *counts.entry(ballot.proposal_hash.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .fold(None, |best: Option<(&str, usize)>, (hash, count)| match best {
                Some((_, c)) if c >= count => best,
                _ => Some((hash, count)),
            })
            .map(|(hash, count)| (hash.to_string(), count))
    }

    /// Signatures of precommits for `hash`.
    pub fn precommits_for(&self, hash: &str) -> BTreeMap<String, String> {
        self.precommits
            .iter()
            .filter(|(_, b)| b.proposal_hash == hash)
            .map(|(voter, b)| (voter.clone(), b.signature.clone()))
            .collect()
    }
}

/// Proof that `2f+1` validators precommitted one hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitCertificate {
    pub height: u64,
    pub round: u64,
    pub shard_id: String,
    pub proposal_hash: String,
    /// voter -> signature
    pub precommits: BTreeMap<String, String>,
}

impl CommitCertificate {
    /// Wire certificate for one transfer order.
    pub fn to_message(&self, order_id: Uuid, threshold: usize) -> Certificate {
        Certificate {
            order_id,
            proposal_hash: self.proposal_hash.clone(),
            precommits: self
                .precommits
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            threshold: threshold as u32,
        }
    }
}
