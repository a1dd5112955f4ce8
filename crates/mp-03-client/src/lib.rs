//! # Client Node
//!
//! Originates transfer orders, collects authority certificates, and once a
//! quorum holds broadcasts the confirmation that makes authorities move funds.
//!
//! ## Quorum Rules
//!
//! | Rule | Counts | Reached when |
//! |------|--------|--------------|
//! | `EqualWeight` | distinct accepted responses | `count ≥ 2/3·n + 1` |
//! | `Weighted` | `WeightedCertificate.weight` attached by authorities | `Σ weight ≥ threshold` |
//!
//! Weights are frozen in each certificate when the authority signs, so a
//! later change in committee weights cannot rewrite an assembled quorum.
//!
//! ## Observable Failures
//!
//! - `transfer()` returns `false` when no authority accepted delivery.
//! - A missing quorum is visible only through `quorum_progress()`,
//!   `wait_for_quorum()` or `broadcast_confirmation()` returning
//!   `ClientError::QuorumNotReached`.

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::ClientConfig;
pub use domain::{equal_weight_threshold, ClientState, QuorumProgress};
pub use error::{ClientError, ClientResult};
pub use ports::ClientApi;
pub use service::ClientNode;
