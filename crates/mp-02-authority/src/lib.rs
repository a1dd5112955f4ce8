//! # Authority Node
//!
//! Validates transfer orders, countersigns them, and applies quorum-backed
//! confirmations to its own replica of the account table.
//!
//! ## Two-Phase Transfer
//!
//! ```text
//! Client ──TransferRequest──→ Authority   validate, set pending_confirmation, sign
//!        ←─TransferResponse──
//!   ... client collects a quorum of signatures ...
//! Client ──ConfirmationRequest──→ Authority   debit sender, credit recipient, seq + 1
//!        ←─ConfirmationResponse──
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | At most one pending order per sender | `domain/validation.rs` - `check_no_conflicting_pending()` |
//! | Balances change only on confirmation | `domain/ledger.rs` - `handle_confirmation_order()` |
//! | Each `order_id` applied at most once | `domain/validation.rs` - `validate_confirmation_order()` |
//! | Rejections never touch account state | `domain/ledger.rs` - `handle_transfer_order()` |
//! | A bad message never stops the worker | `service.rs` - `process_message()` |
//!
//! ## Module Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ service.rs   AuthorityNode: worker loop, peers, sync     │
//! ├──────────────────────────────────────────────────────────┤
//! │ ports/       AuthorityApi (start/stop, snapshot, query)  │
//! ├──────────────────────────────────────────────────────────┤
//! │ domain/      AuthorityLedger, validation rules           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Outbound I/O goes through `shared_transport::NetworkTransport`.

pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use config::AuthorityConfig;
pub use domain::AuthorityLedger;
pub use error::{AuthorityError, AuthorityResult};
pub use metrics::{MetricsCollector, PeerLinkStats, PerformanceStats, RollingAverage};
pub use ports::AuthorityApi;
pub use service::AuthorityNode;
