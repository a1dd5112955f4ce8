//! # MeshPay Test Suite
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Committee + client fixtures on an in-memory mesh
//! └── integration/      # Cross-crate flows
//!     ├── flows.rs          # Happy-path transfers
//!     ├── double_spend.rs   # Replays, conflicting orders, overdrafts
//!     ├── quorum_rules.rs   # Equal-weight vs weighted quorum
//!     ├── link_failure.rs   # Links going down mid-protocol
//!     ├── tcp_loopback.rs   # Full flow over real sockets
//!     └── agreement.rs      # DAG ledger fed by TLI certificates
//! ```
//!
//! ```bash
//! cargo test -p mp-tests
//! cargo bench -p mp-tests
//! ```

pub mod harness;
pub mod integration;
