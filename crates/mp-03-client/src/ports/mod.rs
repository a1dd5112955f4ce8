//! Ports for the client node.

pub mod inbound;

pub use inbound::ClientApi;
