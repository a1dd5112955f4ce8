//! # Node Configuration
//!
//! One TOML file describes a node: its authority settings, the committee it
//! belongs to, and the accounts funded at genesis.
//!
//! ```toml
//! [authority]
//! name = "auth1"
//! port = 8001
//! transport = { kind = "tcp" }
//!
//! [[committee]]
//! name = "auth1"
//! ip_address = "127.0.0.1"
//! port = 8001
//!
//! [[genesis]]
//! address = "user1"
//! balances = { XTZ = 1000 }
//! ```
//!
//! `MESHPAY_*` environment variables are applied after the file.

use anyhow::{Context, Result};
use mp_02_authority::AuthorityConfig;
use serde::{Deserialize, Serialize};
use shared_types::{Address, NodeType, TokenRegistry};
use std::collections::HashMap;
use std::path::Path;

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub authority: AuthorityConfig,

    pub telemetry: TelemetrySection,

    /// Every authority in the committee, this node included.
    pub committee: Vec<CommitteeMember>,

    /// Accounts opened before the node starts serving.
    pub genesis: Vec<GenesisAccount>,

    /// Token table; the four default tokens when absent.
    pub tokens: Option<TokenRegistry>,
}

/// Overrides on top of `MESHPAY_*` telemetry variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySection {
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
    pub metrics_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub name: String,
    pub ip_address: String,
    pub port: u16,
}

impl CommitteeMember {
    pub fn address(&self) -> Address {
        Address::new(&self.name, &self.ip_address, self.port, NodeType::Authority)
    }
}

/// Initial balances for one account, keyed by token symbol or address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: String,
    #[serde(default)]
    pub balances: HashMap<String, u64>,
}

impl NodeConfig {
    /// Load from `path` if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.authority.apply_env_overrides();
        config.fill_committee_members();
        Ok(config)
    }

    /// Parse a TOML file without touching the environment.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.fill_committee_members();
        Ok(config)
    }

    pub fn token_registry(&self) -> TokenRegistry {
        self.tokens.clone().unwrap_or_default()
    }

    /// Committee entries imply committee membership when none is listed.
    fn fill_committee_members(&mut self) {
        if self.authority.committee_members.is_empty() {
            self.authority.committee_members =
                self.committee.iter().map(|m| m.name.clone()).collect();
        }
    }
}
