//! # DAG Blocks and Certificates
//!
//! A block's digest is SHA-256 over the canonical JSON of
//! `author, block_id, parents, payload, round, timestamp`. Decoding a block
//! recomputes the digest and refuses the block if it differs.

use crate::error::{DagError, DagResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::canonical_json;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Immutable block emitted by an authority.
#[derive(Debug, Clone, PartialEq)]
pub struct DagBlock {
    author: String,
    round: u64,
    parents: Vec<Uuid>,
    payload: Value,
    block_id: Uuid,
    timestamp: f64,
    digest: String,
}

/// Wire shape of a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlockPayload {
    author: String,
    block_id: Uuid,
    digest: String,
    parents: Vec<Uuid>,
    payload: Value,
    round: u64,
    timestamp: f64,
}

impl DagBlock {
    /// New block with a fresh id and the current time.
    pub fn new(author: impl Into<String>, round: u64, parents: Vec<Uuid>, payload: Value) -> Self {
        Self::with_identity(
            author,
            round,
            parents,
            payload,
            Uuid::new_v4(),
            shared_types::unix_timestamp(),
        )
    }

    /// Block with explicit id and timestamp; digest computed here.
    pub fn with_identity(
        author: impl Into<String>,
        round: u64,
        parents: Vec<Uuid>,
        payload: Value,
        block_id: Uuid,
        timestamp: f64,
    ) -> Self {
        let mut block = Self {
            author: author.into(),
            round,
            parents,
            payload,
            block_id,
            timestamp,
            digest: String::new(),
        };
        block.digest = block.compute_digest();
        block
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn parents(&self) -> &[Uuid] {
        &self.parents
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn block_id(&self) -> Uuid {
        self.block_id
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Hex SHA-256 of the canonical fields.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    fn compute_digest(&self) -> String {
        let canonical = serde_json::json!({
            "author": self.author,
            "block_id": self.block_id.to_string(),
            "parents": self.parents.iter().map(Uuid::to_string).collect::<Vec<_>>(),
            "payload": self.payload,
            "round": self.round,
            "timestamp": self.timestamp,
        });
        let mut hasher = Sha256::new();
        hasher.update(canonical_json(&canonical).as_bytes());
        hex::encode(hasher.finalize())
    }

    /// JSON object for the wire.
    pub fn to_payload(&self) -> Value {
        let wire = BlockPayload {
            author: self.author.clone(),
            block_id: self.block_id,
            digest: self.digest.clone(),
            parents: self.parents.clone(),
            payload: self.payload.clone(),
            round: self.round,
            timestamp: self.timestamp,
        };
        serde_json::to_value(wire).unwrap_or(Value::Null)
    }

    /// Rebuild a block, verifying its digest.
    pub fn from_payload(value: Value) -> DagResult<Self> {
        let wire: BlockPayload =
            serde_json::from_value(value).map_err(|e| DagError::MalformedPayload(e.to_string()))?;
        let block = Self::with_identity(
            wire.author,
            wire.round,
            wire.parents,
            wire.payload,
            wire.block_id,
            wire.timestamp,
        );
        if block.digest != wire.digest {
            return Err(DagError::DigestMismatch {
                expected: wire.digest,
                computed: block.digest,
            });
        }
        Ok(block)
    }
}

/// Committee signatures attesting to one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumCertificate {
    pub block_id: Uuid,
    pub round: u64,
    /// authority -> signature
    pub signatures: BTreeMap<String, String>,
}

impl QuorumCertificate {
    pub fn new(block_id: Uuid, round: u64, signatures: BTreeMap<String, String>) -> Self {
        Self {
            block_id,
            round,
            signatures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_digest_is_stable_and_hex() {
        let id = Uuid::new_v4();
        let a = DagBlock::with_identity("auth1", 1, vec![], json!({"kind": "x"}), id, 10.0);
        let b = DagBlock::with_identity("auth1", 1, vec![], json!({"kind": "x"}), id, 10.0);
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_payload_key_order_does_not_change_digest() {
        let id = Uuid::new_v4();
        let a = DagBlock::with_identity("a", 1, vec![], json!({"x": 1, "y": {"b": 2, "a": 1}}), id, 1.0);
        let b = DagBlock::with_identity("a", 1, vec![], json!({"y": {"a": 1, "b": 2}, "x": 1}), id, 1.0);
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn test_payload_round_trip_verifies_digest() {
        let block = DagBlock::new("auth1", 3, vec![Uuid::new_v4()], json!({"kind": "t"}));
        let restored = DagBlock::from_payload(block.to_payload()).unwrap();
        assert_eq!(restored, block);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let block = DagBlock::new("auth1", 1, vec![], json!({"amount": 5}));
        let mut wire = block.to_payload();
        wire["payload"]["amount"] = json!(500);
        assert!(matches!(
            DagBlock::from_payload(wire),
            Err(DagError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        assert!(matches!(
            DagBlock::from_payload(json!({"author": "x"})),
            Err(DagError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_digest_matches_ascii_escaped_encoding() {
        let id = Uuid::nil();
        let block = DagBlock::with_identity("zoë", 2, vec![], json!({"memo": "café"}), id, 1.5);
        let expected = format!(
            r#"{{"author":"zo\u00eb","block_id":"{id}","parents":[],"payload":{{"memo":"caf\u00e9"}},"round":2,"timestamp":1.5}}"#
        );
        let mut hasher = Sha256::new();
        hasher.update(expected.as_bytes());
        assert_eq!(block.digest(), hex::encode(hasher.finalize()));
    }
}
