//! Client node configuration.

use mp_01_committee::{QuorumRule, DEFAULT_QUORUM_THRESHOLD};
use serde::{Deserialize, Serialize};
use shared_transport::TransportKind;
use shared_types::{Address, NodeType};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub name: String,

    pub ip_address: String,

    pub port: u16,

    pub receive_timeout_ms: u64,

    pub shutdown_timeout_ms: u64,

    /// How the client decides it holds enough certificates.
    pub quorum_rule: QuorumRule,

    /// Weight needed under [`QuorumRule::Weighted`].
    pub quorum_threshold: f64,

    pub transport: TransportKind,

    /// Authorities to broadcast to.
    pub committee: Vec<Address>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: "user1".to_string(),
            ip_address: "127.0.0.1".to_string(),
            port: 9000,
            receive_timeout_ms: 1_000,
            shutdown_timeout_ms: 5_000,
            quorum_rule: QuorumRule::default(),
            quorum_threshold: DEFAULT_QUORUM_THRESHOLD,
            transport: TransportKind::default(),
            committee: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: env::var("MESHPAY_CLIENT_NAME").unwrap_or(defaults.name),
            ip_address: env::var("MESHPAY_IP_ADDRESS").unwrap_or(defaults.ip_address),
            port: env::var("MESHPAY_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            receive_timeout_ms: env::var("MESHPAY_RECEIVE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.receive_timeout_ms),
            quorum_rule: match env::var("MESHPAY_QUORUM_RULE").as_deref() {
                Ok("weighted") => QuorumRule::Weighted,
                Ok("equal_weight") => QuorumRule::EqualWeight,
                _ => defaults.quorum_rule,
            },
            quorum_threshold: env::var("MESHPAY_QUORUM_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.quorum_threshold),
            ..defaults
        }
    }

    pub fn address(&self) -> Address {
        Address::new(&self.name, &self.ip_address, self.port, NodeType::Client)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
