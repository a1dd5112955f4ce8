//! Client domain: the transfer/confirmation state machine.

pub mod state;

pub use state::{equal_weight_threshold, ClientState, QuorumProgress};
