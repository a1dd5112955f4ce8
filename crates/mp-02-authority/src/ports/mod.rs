//! Ports for the authority node.

pub mod inbound;

pub use inbound::AuthorityApi;
