//! # Committee (mp-01)
//!
//! Turns authority performance counters into normalized voting weights and
//! answers "does this set of signers meet quorum?".
//!
//! ## Weight Formula
//!
//! ```text
//! net(a)    = max(transaction_count(a) - error_count(a), 0)
//! weight(a) = net(a) / Σ net          if Σ net > 0
//!           = 1 / N                   otherwise (bootstrap fallback)
//! ```
//!
//! Weights always sum to 1.0 for a non-empty committee. The equal-weight
//! fallback keeps a fresh committee able to reach quorum before any
//! authority has processed a transaction.
//!
//! ## Quorum Rules
//!
//! | Rule | Predicate | Entry point |
//! |------|-----------|-------------|
//! | Weighted | Σ signer weights ≥ threshold (2/3) | [`Committee::has_quorum_by_names`] |
//! | Equal weight | distinct signers ≥ ⌊N·2/3⌋ + 1 | [`has_equal_quorum`] |
//!
//! Both are exposed; [`QuorumRule`] lets callers pick one.
//!
//! ## Concurrency
//!
//! The weight cache is an immutable snapshot behind an `ArcSwapOption`.
//! Recomputation builds a new map and swaps it in; invalidation swaps in
//! `None`. Readers never observe a half-updated map.

pub mod domain;
pub mod error;

pub use domain::committee::{AuthorityInfo, Committee, WeightSnapshot, DEFAULT_QUORUM_THRESHOLD};
pub use domain::quorum::{
    has_equal_quorum, has_weighted_quorum, required_equal_quorum_count, QuorumRule,
};
pub use error::{CommitteeError, CommitteeResult};
