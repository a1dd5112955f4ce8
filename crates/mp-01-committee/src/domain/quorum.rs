//! # Quorum Predicates
//!
//! Cardinality rules that ignore performance history, plus the weighted
//! rule expressed over signer names.

use crate::domain::committee::Committee;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which rule a client uses to decide it holds enough certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    /// Count distinct signers against the committee size.
    #[default]
    EqualWeight,
    /// Sum the weights frozen into each `WeightedCertificate`.
    Weighted,
}

/// Minimum distinct signers for an equal-weight quorum: `⌊n·ratio⌋ + 1`.
///
/// Returns 0 for an empty committee.
pub fn required_equal_quorum_count(num_authorities: usize, ratio: f64) -> usize {
    if num_authorities == 0 {
        return 0;
    }
    (num_authorities as f64 * ratio).floor() as usize + 1
}

/// `true` if the distinct `signers` reach the equal-weight threshold.
pub fn has_equal_quorum<I, S>(signers: I, num_authorities: usize, ratio: f64) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unique: HashSet<String> = signers
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect();
    unique.len() >= required_equal_quorum_count(num_authorities, ratio)
}

/// `true` if the distinct `signers` hold at least `ratio` of the committee's
/// current voting power.
pub fn has_weighted_quorum<I, S>(signers: I, committee: &Committee, ratio: f64) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let weights = committee.compute_weights();
    let unique: HashSet<String> = signers
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect();
    let power: f64 = unique
        .iter()
        .map(|name| weights.get(name).copied().unwrap_or(0.0))
        .sum();
    power + 1e-9 >= ratio
}
