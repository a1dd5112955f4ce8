//! # MeshPay Node
//!
//! Runs one authority until Ctrl+C.
//!
//! ```text
//! meshpay-node [config.toml]
//! ```
//!
//! Without a file the node starts from defaults plus `MESHPAY_*` variables.

use anyhow::{Context, Result};
use node_runtime::{telemetry_config, NodeConfig, NodeRuntime};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = NodeConfig::load(path.as_deref())?;

    mesh_telemetry::init_telemetry(&telemetry_config(&config))
        .context("Failed to initialize telemetry")?;

    let runtime = NodeRuntime::new(config)?;
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
