//! # Tendermint-Lite (TLI) Consensus
//!
//! A single-shard prevote/precommit engine for committees whose links come
//! and go. Each validator runs one [`TliEngine`]; the network layer carries
//! proposals and votes between them.
//!
//! ```text
//!   Proposal ──on_proposal──► Prevote (own, or the locked hash)
//!   Prevote ×(2f+1) ──on_prevote──► lock + Precommit
//!   Precommit ×(2f+1) ──on_precommit──► CommitCertificate
//! ```
//!
//! ## Safety
//!
//! | Rule | Where |
//! |------|-------|
//! | `n ≥ 3f + 1` | [`TliConfig::new`] |
//! | one ballot per voter per round | `RoundState` maps keyed by voter |
//! | locked validators re-prevote their lock at the same height | `on_proposal` |
//! | certificates only count precommits for the certified hash | `on_precommit` |

pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;

pub use domain::{
    hash_payload, Ballot, CommitCertificate, Proposal, RoundState, TliConfig, Vote, VoteKind,
    DEFAULT_MAX_ROUND_SKIPS,
};
pub use engine::TliEngine;
pub use error::{ConsensusError, ConsensusResult};
pub use ports::ConsensusEngine;
