//! # Transport Port
//!
//! The interface node runtimes use to talk to the mesh.

use crate::error::TransportResult;
use async_trait::async_trait;
use shared_types::{Address, Message};
use std::time::Duration;

/// A bidirectional message transport bound to one local address.
#[async_trait]
pub trait NetworkTransport: Send + Sync {
    /// Short name of the implementation (`tcp`, `udp`, ...).
    fn kind_name(&self) -> &'static str;

    /// Address this transport receives on.
    fn local_address(&self) -> &Address;

    /// Bind and start accepting messages.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Bind`](crate::TransportError::Bind) if the
    /// local endpoint cannot be bound.
    async fn connect(&self) -> TransportResult<()>;

    /// Stop accepting messages. Idempotent.
    async fn disconnect(&self);

    /// Deliver `message` to `target`.
    async fn send_message(&self, message: &Message, target: &Address) -> TransportResult<()>;

    /// Next queued message, or `None` once `timeout` elapses.
    ///
    /// Malformed input never surfaces here; it is logged and dropped by the
    /// listener.
    async fn receive_message(&self, timeout: Duration) -> Option<Message>;
}
