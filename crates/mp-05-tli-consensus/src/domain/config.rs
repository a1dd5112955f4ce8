//! Validated engine parameters.

use crate::error::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ROUND_SKIPS: u32 = 5;

/// Decoded configs go through [`TliConfig::new`] like constructed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTliConfig")]
pub struct TliConfig {
    n: usize,
    f: usize,
    /// Rounds a validator may skip before it stops voting on stale heights.
    pub max_round_skips: u32,
    /// Let clients gather precommits into certificates themselves.
    pub enable_client_aggregation: bool,
}

#[derive(Deserialize)]
struct RawTliConfig {
    n: usize,
    f: usize,
    #[serde(default = "default_max_round_skips")]
    max_round_skips: u32,
    #[serde(default = "default_client_aggregation")]
    enable_client_aggregation: bool,
}

fn default_max_round_skips() -> u32 {
    DEFAULT_MAX_ROUND_SKIPS
}

fn default_client_aggregation() -> bool {
    true
}

impl TryFrom<RawTliConfig> for TliConfig {
    type Error = ConsensusError;

    fn try_from(raw: RawTliConfig) -> ConsensusResult<Self> {
        let mut config = Self::new(raw.n, raw.f)?;
        config.max_round_skips = raw.max_round_skips;
        config.enable_client_aggregation = raw.enable_client_aggregation;
        Ok(config)
    }
}

impl TliConfig {
    /// Reject committees that cannot tolerate `f` Byzantine validators.
    pub fn new(n: usize, f: usize) -> ConsensusResult<Self> {
        let required = f.checked_mul(3).and_then(|v| v.checked_add(1));
        if required.map_or(true, |required| n < required) {
            return Err(ConsensusError::InsufficientValidators { n, f });
        }
        Ok(Self {
            n,
            f,
            max_round_skips: DEFAULT_MAX_ROUND_SKIPS,
            enable_client_aggregation: true,
        })
    }

    /// Largest `f` a committee of `n` tolerates.
    pub fn for_committee(n: usize) -> ConsensusResult<Self> {
        Self::new(n, n.saturating_sub(1) / 3)
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn f(&self) -> usize {
        self.f
    }

    /// `2f + 1`
    pub fn quorum(&self) -> usize {
        2 * self.f + 1
    }
}
