//! Authority node configuration.
//!
//! Loaded from a TOML table by `node-runtime`, or from `MESHPAY_*`
//! environment variables. Environment values override file values.

use mp_01_committee::DEFAULT_QUORUM_THRESHOLD;
use serde::{Deserialize, Serialize};
use shared_transport::{StreamOptions, TransportKind};
use shared_types::{Address, NodeType};
use std::collections::BTreeSet;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Authority name, also its node id.
    pub name: String,

    pub ip_address: String,

    pub port: u16,

    /// Names of every committee member, including this one.
    pub committee_members: BTreeSet<String>,

    pub shard_assignments: BTreeSet<String>,

    /// Worker receive timeout; bounds shutdown latency.
    pub receive_timeout_ms: u64,

    /// Upper bound on waiting for the worker to exit.
    pub shutdown_timeout_ms: u64,

    pub transport: TransportKind,

    pub quorum_threshold: f64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            name: "auth1".to_string(),
            ip_address: "127.0.0.1".to_string(),
            port: 8001,
            committee_members: BTreeSet::new(),
            shard_assignments: BTreeSet::new(),
            receive_timeout_ms: 1_000,
            shutdown_timeout_ms: 5_000,
            transport: TransportKind::default(),
            quorum_threshold: DEFAULT_QUORUM_THRESHOLD,
        }
    }
}

impl AuthorityConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Overwrite fields whose `MESHPAY_*` variable is set and parses.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(name) = env::var("MESHPAY_AUTHORITY_NAME") {
            self.name = name;
        }
        if let Ok(ip) = env::var("MESHPAY_IP_ADDRESS") {
            self.ip_address = ip;
        }
        if let Some(port) = parsed("MESHPAY_PORT") {
            self.port = port;
        }
        if let Ok(members) = env::var("MESHPAY_COMMITTEE") {
            self.committee_members = split_list(&members);
        }
        if let Ok(shards) = env::var("MESHPAY_SHARDS") {
            self.shard_assignments = split_list(&shards);
        }
        if let Some(ms) = parsed("MESHPAY_RECEIVE_TIMEOUT_MS") {
            self.receive_timeout_ms = ms;
        }
        if let Some(ms) = parsed("MESHPAY_SHUTDOWN_TIMEOUT_MS") {
            self.shutdown_timeout_ms = ms;
        }
        if let Some(kind) = env::var("MESHPAY_TRANSPORT")
            .ok()
            .and_then(|v| transport_from_name(&v))
        {
            self.transport = kind;
        }
        if let Some(threshold) = parsed("MESHPAY_QUORUM_THRESHOLD") {
            self.quorum_threshold = threshold;
        }
    }

    pub fn address(&self) -> Address {
        Address::new(&self.name, &self.ip_address, self.port, NodeType::Authority)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

pub(crate) fn split_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Transport from its short name, with default options.
pub fn transport_from_name(name: &str) -> Option<TransportKind> {
    match name.trim().to_lowercase().as_str() {
        "tcp" => Some(TransportKind::Tcp(StreamOptions::default())),
        "udp" => Some(TransportKind::Udp),
        "wifi_direct" | "wifidirect" => Some(TransportKind::WifiDirect(StreamOptions::default())),
        "in_memory" | "memory" => Some(TransportKind::InMemory),
        _ => None,
    }
}
