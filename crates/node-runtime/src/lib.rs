//! # Node Runtime Library
//!
//! Everything `meshpay-node` does besides parsing arguments: configuration
//! loading, genesis funding, committee construction and the authority
//! lifecycle. Exposed as a library so integration tests can drive it.

pub mod config;
pub mod genesis;
pub mod runtime;

pub use config::{CommitteeMember, GenesisAccount, NodeConfig, TelemetrySection};
pub use genesis::{build_committee, fund_accounts, resolve_balances, GenesisError};
pub use runtime::{telemetry_config, NodeRuntime};
