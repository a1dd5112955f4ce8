//! # Committee
//!
//! Authority list, quorum threshold and the weight cache.

use crate::error::{CommitteeError, CommitteeResult};
use arc_swap::ArcSwapOption;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{AuthorityName, AuthorityState};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Default fraction of total weight required for quorum.
pub const DEFAULT_QUORUM_THRESHOLD: f64 = 2.0 / 3.0;

/// Slack for float sums that should land exactly on the threshold.
const QUORUM_EPSILON: f64 = 1e-9;

/// Immutable weight map shared with readers.
pub type WeightSnapshot = Arc<HashMap<AuthorityName, f64>>;

/// Per-authority view returned by [`Committee::get_committee_info`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityInfo {
    pub transaction_count: u64,
    pub error_count: u64,
    pub net_performance: u64,
    pub normalized_weight: f64,
}

/// A committee of authorities with performance-derived voting weights.
pub struct Committee {
    authorities: RwLock<Vec<AuthorityState>>,
    quorum_threshold: f64,
    weight_cache: ArcSwapOption<HashMap<AuthorityName, f64>>,
}

impl std::fmt::Debug for Committee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Committee")
            .field("members", &self.names())
            .field("quorum_threshold", &self.quorum_threshold)
            .finish()
    }
}

impl Committee {
    /// Committee with the default 2/3 threshold.
    ///
    /// # Errors
    ///
    /// Fails if two authorities share a name.
    pub fn new(authorities: Vec<AuthorityState>) -> CommitteeResult<Self> {
        Self::with_threshold(authorities, DEFAULT_QUORUM_THRESHOLD)
    }

    pub fn with_threshold(
        authorities: Vec<AuthorityState>,
        quorum_threshold: f64,
    ) -> CommitteeResult<Self> {
        if !(quorum_threshold > 0.0 && quorum_threshold <= 1.0) {
            return Err(CommitteeError::InvalidThreshold(quorum_threshold));
        }
        let mut seen = HashSet::new();
        for auth in &authorities {
            if !seen.insert(auth.name.as_str()) {
                return Err(CommitteeError::DuplicateAuthority(auth.name.clone()));
            }
        }
        Ok(Self {
            authorities: RwLock::new(authorities),
            quorum_threshold,
            weight_cache: ArcSwapOption::const_empty(),
        })
    }

    pub fn quorum_threshold(&self) -> f64 {
        self.quorum_threshold
    }

    pub fn len(&self) -> usize {
        self.authorities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.authorities.read().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.authorities.read().iter().any(|a| a.name == name)
    }

    /// Member names in committee order.
    pub fn names(&self) -> Vec<AuthorityName> {
        self.authorities.read().iter().map(|a| a.name.clone()).collect()
    }

    /// Copy of the member list.
    pub fn authorities(&self) -> Vec<AuthorityState> {
        self.authorities.read().clone()
    }

    /// Current normalized weights, recomputed only after an invalidation.
    pub fn compute_weights(&self) -> WeightSnapshot {
        if let Some(snapshot) = self.weight_cache.load_full() {
            return snapshot;
        }
        // Hold the read lock while publishing so a concurrent update cannot
        // invalidate between our read of the counters and the store.
        let authorities = self.authorities.read();
        let snapshot = Arc::new(normalized_weights(&authorities));
        self.weight_cache.store(Some(Arc::clone(&snapshot)));
        debug!(members = authorities.len(), "Committee weights recomputed");
        snapshot
    }

    /// Weight of one authority; unknown names weigh 0.
    pub fn get_authority_weight(&self, name: &str) -> f64 {
        self.compute_weights().get(name).copied().unwrap_or(0.0)
    }

    /// Sum of all weights (1.0 for a non-empty committee).
    pub fn get_total_weight(&self) -> f64 {
        self.compute_weights().values().sum()
    }

    /// `Σ signer_weights ≥ quorum_threshold`.
    pub fn has_quorum(&self, signer_weights: &[f64]) -> bool {
        let total: f64 = signer_weights.iter().sum();
        total + QUORUM_EPSILON >= self.quorum_threshold
    }

    /// Weighted quorum over distinct signer names.
    pub fn has_quorum_by_names<I, S>(&self, signer_names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let weights = self.compute_weights();
        let mut seen = HashSet::new();
        let signer_weights: Vec<f64> = signer_names
            .into_iter()
            .filter(|name| seen.insert(name.as_ref().to_string()))
            .map(|name| weights.get(name.as_ref()).copied().unwrap_or(0.0))
            .collect();
        self.has_quorum(&signer_weights)
    }

    /// Overwrite one authority's counters and invalidate the weight cache.
    ///
    /// # Errors
    ///
    /// [`CommitteeError::UnknownAuthority`] if `name` is not a member.
    pub fn update_authority_performance(
        &self,
        name: &str,
        transaction_count: u64,
        error_count: u64,
    ) -> CommitteeResult<()> {
        let mut authorities = self.authorities.write();
        let auth = authorities
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| CommitteeError::UnknownAuthority(name.to_string()))?;
        auth.transaction_count = transaction_count;
        auth.error_count = error_count;
        auth.voting_weight = auth.net_performance() as f64;
        self.weight_cache.store(None);
        debug!(
            authority = name,
            transaction_count, error_count, "Authority performance updated"
        );
        Ok(())
    }

    /// Counters and normalized weight for every member.
    pub fn get_committee_info(&self) -> HashMap<AuthorityName, AuthorityInfo> {
        let weights = self.compute_weights();
        self.authorities
            .read()
            .iter()
            .map(|a| {
                (
                    a.name.clone(),
                    AuthorityInfo {
                        transaction_count: a.transaction_count,
                        error_count: a.error_count,
                        net_performance: a.net_performance(),
                        normalized_weight: weights.get(&a.name).copied().unwrap_or(0.0),
                    },
                )
            })
            .collect()
    }
}

fn normalized_weights(authorities: &[AuthorityState]) -> HashMap<AuthorityName, f64> {
    if authorities.is_empty() {
        return HashMap::new();
    }
    let total: u128 = authorities.iter().map(|a| a.net_performance() as u128).sum();
    if total == 0 {
        let equal = 1.0 / authorities.len() as f64;
        return authorities.iter().map(|a| (a.name.clone(), equal)).collect();
    }
    authorities
        .iter()
        .map(|a| (a.name.clone(), a.net_performance() as f64 / total as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Address, NodeType};

    fn authority(name: &str, tx: u64, err: u64) -> AuthorityState {
        let mut state = AuthorityState::new(
            name,
            Address::new(name, "10.0.0.1", 8080, NodeType::Authority),
            HashSet::new(),
        );
        state.transaction_count = tx;
        state.error_count = err;
        state
    }

    fn committee(perf: &[(&str, u64, u64)]) -> Committee {
        Committee::new(perf.iter().map(|(n, t, e)| authority(n, *t, *e)).collect()).unwrap()
    }

    fn assert_sums_to_one(c: &Committee) {
        let total: f64 = c.compute_weights().values().sum();
        assert!((total - 1.0).abs() < 1e-3, "weights sum to {total}");
    }

    #[test]
    fn test_weights_proportional_to_net_performance() {
        let c = committee(&[("auth1", 100, 0), ("auth2", 10, 0), ("auth3", 10, 0), ("auth4", 10, 0)]);
        let w = c.compute_weights();
        assert!((w["auth1"] - 100.0 / 130.0).abs() < 1e-9);
        assert!((w["auth2"] - 10.0 / 130.0).abs() < 1e-9);
        assert!(c.has_quorum_by_names(["auth1"]));
        assert_sums_to_one(&c);
    }

    #[test]
    fn test_all_zero_performance_falls_back_to_equal() {
        let c = committee(&[("a", 0, 0), ("b", 5, 5), ("c", 0, 0)]);
        let w = c.compute_weights();
        for name in ["a", "b", "c"] {
            assert!((w[name] - 1.0 / 3.0).abs() < 1e-9);
        }
        assert_sums_to_one(&c);
    }

    #[test]
    fn test_negative_net_clamped_to_zero() {
        let c = committee(&[("good", 10, 0), ("bad", 2, 50)]);
        let w = c.compute_weights();
        assert_eq!(w["bad"], 0.0);
        assert!((w["good"] - 1.0).abs() < 1e-9);
        assert_sums_to_one(&c);
    }

    #[test]
    fn test_empty_committee() {
        let c = committee(&[]);
        assert!(c.compute_weights().is_empty());
        assert!(!c.has_quorum(&[]));
        assert!(!c.has_quorum_by_names(Vec::<String>::new()));
        assert_eq!(c.get_total_weight(), 0.0);
    }

    #[test]
    fn test_single_authority_alone_meets_quorum() {
        let c = committee(&[("solo", 0, 0)]);
        assert_eq!(c.get_authority_weight("solo"), 1.0);
        assert!(c.has_quorum_by_names(["solo"]));
        c.update_authority_performance("solo", 7, 2).unwrap();
        assert_eq!(c.get_authority_weight("solo"), 1.0);
    }

    #[test]
    fn test_three_equal_authorities_two_thirds_boundary() {
        let c = committee(&[("auth1", 0, 0), ("auth2", 0, 0), ("auth3", 0, 0)]);
        assert!(c.has_quorum_by_names(["auth1", "auth2"]));
        assert!(!c.has_quorum_by_names(["auth1"]));
    }

    #[test]
    fn test_duplicate_and_unknown_signers() {
        let c = committee(&[("auth1", 0, 0), ("auth2", 0, 0), ("auth3", 0, 0)]);
        assert!(!c.has_quorum_by_names(["auth1", "auth1", "auth1"]));
        assert!(!c.has_quorum_by_names(["auth1", "mallory", "eve"]));
        assert_eq!(c.get_authority_weight("mallory"), 0.0);
    }

    #[test]
    fn test_update_invalidates_cache() {
        let c = committee(&[("auth1", 10, 0), ("auth2", 10, 0)]);
        assert!((c.get_authority_weight("auth1") - 0.5).abs() < 1e-9);
        c.update_authority_performance("auth1", 30, 0).unwrap();
        assert!((c.get_authority_weight("auth1") - 0.75).abs() < 1e-9);
        assert_eq!(c.authorities()[0].voting_weight, 30.0);
    }

    #[test]
    fn test_update_unknown_authority_errors() {
        let c = committee(&[("auth1", 1, 0)]);
        assert_eq!(
            c.update_authority_performance("nobody", 1, 0),
            Err(CommitteeError::UnknownAuthority("nobody".into()))
        );
    }

    #[test]
    fn test_quorum_monotonic_under_additional_signers() {
        let c = committee(&[("a", 50, 0), ("b", 30, 0), ("c", 15, 0), ("d", 5, 0)]);
        let names = ["a", "b", "c", "d"];
        for mask in 0u8..16 {
            let set: Vec<&str> = (0..4).filter(|i| mask & (1 << i) != 0).map(|i| names[i]).collect();
            if c.has_quorum_by_names(&set) {
                for extra in names {
                    let mut bigger = set.clone();
                    bigger.push(extra);
                    assert!(c.has_quorum_by_names(&bigger));
                }
            }
        }
    }

    #[test]
    fn test_committee_info() {
        let c = committee(&[("auth1", 8, 3), ("auth2", 5, 0)]);
        let info = c.get_committee_info();
        assert_eq!(info["auth1"].net_performance, 5);
        assert_eq!(info["auth1"].error_count, 3);
        assert!((info["auth2"].normalized_weight - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(matches!(
            Committee::with_threshold(vec![], 0.0),
            Err(CommitteeError::InvalidThreshold(_))
        ));
        assert!(matches!(
            Committee::new(vec![authority("x", 0, 0), authority("x", 1, 0)]),
            Err(CommitteeError::DuplicateAuthority(_))
        ));
    }

    #[test]
    fn test_concurrent_readers_see_complete_snapshots() {
        let c = Arc::new(committee(&[("a", 1, 0), ("b", 1, 0), ("c", 1, 0)]));
        let writer = {
            let c = Arc::clone(&c);
            std::thread::spawn(move || {
                for i in 0..500u64 {
                    c.update_authority_performance("a", i, 0).unwrap();
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let w = c.compute_weights();
                        assert_eq!(w.len(), 3);
                        let total: f64 = w.values().sum();
                        assert!((total - 1.0).abs() < 1e-6);
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }
}
