//! # DAG Ledger
//!
//! Tracks blocks, votes and the frontier. A block commits once it holds
//! `quorum_size` distinct votes and every parent is already committed.

use super::block::{DagBlock, QuorumCertificate};
use crate::error::{DagError, DagResult};
use serde_json::json;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};
use uuid::Uuid;

pub const GENESIS_AUTHOR: &str = "genesis";

pub struct DagLedger {
    quorum_size: usize,
    blocks: HashMap<Uuid, DagBlock>,
    children: HashMap<Uuid, HashSet<Uuid>>,
    /// block -> (voter -> signature)
    votes: HashMap<Uuid, BTreeMap<String, String>>,
    committed: HashSet<Uuid>,
    frontier: HashSet<Uuid>,
    genesis: Uuid,
}

impl DagLedger {
    /// Fresh ledger with a committed genesis block on the frontier.
    pub fn new(quorum_size: usize) -> DagResult<Self> {
        if quorum_size == 0 {
            return Err(DagError::InvalidQuorumSize);
        }
        let genesis = DagBlock::new(GENESIS_AUTHOR, 0, Vec::new(), json!({"kind": "genesis"}));
        let genesis_id = genesis.block_id();

        let mut ledger = Self {
            quorum_size,
            blocks: HashMap::new(),
            children: HashMap::new(),
            votes: HashMap::new(),
            committed: HashSet::new(),
            frontier: HashSet::new(),
            genesis: genesis_id,
        };
        ledger.blocks.insert(genesis_id, genesis);
        ledger.committed.insert(genesis_id);
        ledger.frontier.insert(genesis_id);
        Ok(ledger)
    }

    pub fn quorum_size(&self) -> usize {
        self.quorum_size
    }

    pub fn genesis(&self) -> &DagBlock {
        // Inserted in `new` and never removed.
        &self.blocks[&self.genesis]
    }

    pub fn get_block(&self, block_id: &Uuid) -> Option<&DagBlock> {
        self.blocks.get(block_id)
    }

    /// Blocks without children, sorted for stable output.
    pub fn frontier(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.frontier.iter().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Build a block on `parents`, or on the current frontier when `None`.
    ///
    /// The block is not inserted; pass it to [`DagLedger::add_block`].
    pub fn create_block(
        &self,
        author: &str,
        payload: serde_json::Value,
        parents: Option<Vec<Uuid>>,
    ) -> DagResult<DagBlock> {
        let parents = parents.unwrap_or_else(|| self.frontier());
        let mut round = 0;
        for parent in &parents {
            let block = self
                .blocks
                .get(parent)
                .ok_or(DagError::UnknownParent(*parent))?;
            round = round.max(block.round());
        }
        Ok(DagBlock::new(author, round + 1, parents, payload))
    }

    /// Insert a block whose parents are all known. Re-adding is a no-op.
    pub fn add_block(&mut self, block: DagBlock) -> DagResult<()> {
        let block_id = block.block_id();
        if self.blocks.contains_key(&block_id) {
            return Ok(());
        }
        if let Some(missing) = block.parents().iter().find(|p| !self.blocks.contains_key(p)) {
            return Err(DagError::UnknownParent(*missing));
        }

        for parent in block.parents() {
            self.children.entry(*parent).or_default().insert(block_id);
            self.frontier.remove(parent);
        }
        self.frontier.insert(block_id);
        debug!(
            "[mp-04] block {} round {} by {}",
            block_id,
            block.round(),
            block.author()
        );
        self.blocks.insert(block_id, block);
        Ok(())
    }

    pub fn children_of(&self, block_id: &Uuid) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .children
            .get(block_id)
            .map(|c| c.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Record one vote, replacing any earlier vote by the same voter.
    /// Returns the number of distinct voters.
    pub fn record_vote(&mut self, block_id: Uuid, voter: &str, signature: &str) -> DagResult<usize> {
        if !self.blocks.contains_key(&block_id) {
            return Err(DagError::UnknownBlock(block_id));
        }
        let votes = self.votes.entry(block_id).or_default();
        votes.insert(voter.to_string(), signature.to_string());
        Ok(votes.len())
    }

    /// Merge every signature carried by a certificate.
    pub fn record_certificate(&mut self, certificate: &QuorumCertificate) -> DagResult<usize> {
        if !self.blocks.contains_key(&certificate.block_id) {
            return Err(DagError::UnknownBlock(certificate.block_id));
        }
        let votes = self.votes.entry(certificate.block_id).or_default();
        for (voter, signature) in &certificate.signatures {
            votes.insert(voter.clone(), signature.clone());
        }
        Ok(votes.len())
    }

    pub fn vote_count(&self, block_id: &Uuid) -> usize {
        self.votes.get(block_id).map(BTreeMap::len).unwrap_or(0)
    }

    pub fn has_quorum(&self, block_id: &Uuid) -> bool {
        self.vote_count(block_id) >= self.quorum_size
    }

    /// Certificate assembled from the votes collected so far.
    pub fn certificate_for(&self, block_id: &Uuid) -> Option<QuorumCertificate> {
        let block = self.blocks.get(block_id)?;
        let signatures = self.votes.get(block_id).cloned().unwrap_or_default();
        Some(QuorumCertificate::new(*block_id, block.round(), signatures))
    }

    /// Commit every block that has a quorum and fully committed parents,
    /// in round order. Returns the newly committed blocks.
    pub fn commit_ready_blocks(&mut self) -> Vec<DagBlock> {
        let mut pending: Vec<&DagBlock> = self
            .blocks
            .values()
            .filter(|b| !self.committed.contains(&b.block_id()))
            .collect();
        pending.sort_by_key(|b| (b.round(), b.block_id()));

        // Round order means a parent is visited before any of its children,
        // so one pass catches whole chains.
        let mut newly = Vec::new();
        let mut committed_now: HashSet<Uuid> = HashSet::new();
        for block in pending {
            let id = block.block_id();
            let parents_done = block
                .parents()
                .iter()
                .all(|p| self.committed.contains(p) || committed_now.contains(p));
            if self.has_quorum(&id) && parents_done {
                committed_now.insert(id);
                newly.push(block.clone());
            }
        }

        self.committed.extend(committed_now);
        if !newly.is_empty() {
            info!("[mp-04] committed {} block(s)", newly.len());
        }
        newly
    }

    pub fn is_committed(&self, block_id: &Uuid) -> bool {
        self.committed.contains(block_id)
    }

    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }
}
