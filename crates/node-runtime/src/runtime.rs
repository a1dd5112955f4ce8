//! # Node Runtime
//!
//! Wires one authority from a [`NodeConfig`].
//!
//! ## Startup Sequence
//!
//! 1. Build the configured transport
//! 2. Create the authority and attach the committee
//! 3. Fund genesis accounts
//! 4. Register the other committee members as peers
//! 5. Start the worker

use crate::config::NodeConfig;
use crate::genesis::{build_committee, fund_accounts};
use anyhow::{bail, Context, Result};
use mesh_telemetry::TelemetryConfig;
use mp_02_authority::{AuthorityApi, AuthorityNode};
use shared_transport::{build_transport, MeshNetwork, TransportKind};
use std::sync::Arc;
use tracing::info;

pub struct NodeRuntime {
    authority: AuthorityNode,
}

impl NodeRuntime {
    /// Build the node. An in-memory transport gets a private mesh.
    pub fn new(config: NodeConfig) -> Result<Self> {
        Self::with_mesh(config, MeshNetwork::new())
    }

    /// Build the node on a shared in-memory mesh.
    pub fn with_mesh(config: NodeConfig, mesh: Arc<MeshNetwork>) -> Result<Self> {
        let tokens = config.token_registry();
        let address = config.authority.address();
        let mesh = matches!(config.authority.transport, TransportKind::InMemory).then_some(&mesh);
        let transport = build_transport(&config.authority.transport, address.clone(), mesh)
            .context("Failed to build transport")?;

        let mut authority = AuthorityNode::new(config.authority.clone(), transport, tokens.clone());
        if let Some(committee) =
            build_committee(&config.committee, config.authority.quorum_threshold)
                .context("Invalid committee")?
        {
            authority = authority.with_committee(committee);
        }

        fund_accounts(&authority, &config.genesis, &tokens).context("Invalid genesis")?;

        for member in &config.committee {
            authority.add_peer(member.address());
        }

        info!(
            authority = %config.authority.name,
            address = %address,
            peers = authority.peers().len(),
            "Node runtime created"
        );
        Ok(Self { authority })
    }

    pub fn authority(&self) -> &AuthorityNode {
        &self.authority
    }

    pub async fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  MeshPay Node v{}", env!("CARGO_PKG_VERSION"));
        info!("  Authority: {}", self.authority.name());
        info!("===========================================");

        if !self.authority.start_fastpay_services().await {
            bail!(
                "Authority {} failed to start on {}",
                self.authority.name(),
                self.authority.address()
            );
        }
        Ok(())
    }

    pub async fn shutdown(&self) {
        info!("Shutting down node...");
        self.authority.stop_fastpay_services().await;
        info!("Node shutdown complete");
    }
}

/// Telemetry settings: environment first, then the file's overrides.
pub fn telemetry_config(config: &NodeConfig) -> TelemetryConfig {
    let mut telemetry = TelemetryConfig::for_node(&config.authority.name, "authority");
    if let Some(level) = &config.telemetry.log_level {
        telemetry.log_level = level.clone();
    }
    if let Some(json) = config.telemetry.json_logs {
        telemetry.json_logs = json;
    }
    if let Some(enabled) = config.telemetry.metrics_enabled {
        telemetry.metrics_enabled = enabled;
    }
    telemetry
}
