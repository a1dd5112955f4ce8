//! # DAG Ledger
//!
//! Causal history of authority blocks. Each block names its parents; a block
//! commits once it has a quorum of votes and all of its parents committed.
//!
//! ```text
//!   genesis (round 0, committed)
//!      │
//!      ├──► B1 (round 1) ──► B3 (round 2)
//!      └──► B2 (round 1) ──┘
//!
//!   frontier = { B3 }
//! ```
//!
//! | Rule | Enforced by |
//! |------|-------------|
//! | parents must exist before a child is added | `add_block` |
//! | round = highest parent round + 1 | `create_block` |
//! | one vote per voter | `record_vote`, `record_certificate` |
//! | commit needs quorum and committed parents | `commit_ready_blocks` |
//! | digest covers every block field | `DagBlock::from_payload` |

pub mod domain;
pub mod error;

pub use domain::{DagBlock, DagLedger, QuorumCertificate, GENESIS_AUTHOR};
pub use error::{DagError, DagResult};
