//! # In-Memory Mesh
//!
//! A process-local stand-in for the wireless mesh. Every connected
//! [`InMemoryTransport`] registers its inbox with a shared [`MeshNetwork`]
//! keyed by `ip:port`; sending is a queue hand-off.

use crate::error::{TransportError, TransportResult};
use crate::inbox::Inbox;
use crate::ports::NetworkTransport;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Address, Message};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Shared routing table for in-memory transports.
#[derive(Default)]
pub struct MeshNetwork {
    routes: RwLock<HashMap<String, mpsc::Sender<Message>>>,
    /// Endpoints whose link is down; sends to and from them fail.
    down: RwLock<HashSet<String>>,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl MeshNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn register(&self, endpoint: String, inbox: mpsc::Sender<Message>) {
        self.routes.write().insert(endpoint, inbox);
    }

    fn unregister(&self, endpoint: &str) {
        self.routes.write().remove(endpoint);
    }

    /// Take a node's link down or bring it back up.
    pub fn set_link_down(&self, address: &Address, down: bool) {
        let endpoint = address.endpoint();
        let mut set = self.down.write();
        if down {
            set.insert(endpoint);
        } else {
            set.remove(&endpoint);
        }
    }

    pub fn is_registered(&self, address: &Address) -> bool {
        self.routes.read().contains_key(&address.endpoint())
    }

    pub fn messages_delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn messages_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    async fn deliver(&self, from: &Address, message: Message, target: &Address) -> TransportResult<()> {
        let endpoint = target.endpoint();
        let route = {
            let down = self.down.read();
            if down.contains(&endpoint) || down.contains(&from.endpoint()) {
                None
            } else {
                self.routes.read().get(&endpoint).cloned()
            }
        };
        let Some(route) = route else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(TransportError::Unreachable(endpoint));
        };
        route.send(message).await.map_err(|_| {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            TransportError::Unreachable(endpoint.clone())
        })?;
        self.delivered.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

pub struct InMemoryTransport {
    address: Address,
    network: Arc<MeshNetwork>,
    inbox: Inbox,
}

impl InMemoryTransport {
    pub fn new(address: Address, network: Arc<MeshNetwork>) -> Self {
        Self {
            address,
            network,
            inbox: Inbox::default(),
        }
    }
}

#[async_trait]
impl NetworkTransport for InMemoryTransport {
    fn kind_name(&self) -> &'static str {
        "in_memory"
    }

    fn local_address(&self) -> &Address {
        &self.address
    }

    async fn connect(&self) -> TransportResult<()> {
        self.network
            .register(self.address.endpoint(), self.inbox.sender());
        debug!(node = %self.address.node_id, "Joined in-memory mesh");
        Ok(())
    }

    async fn disconnect(&self) {
        self.network.unregister(&self.address.endpoint());
    }

    async fn send_message(&self, message: &Message, target: &Address) -> TransportResult<()> {
        self.network
            .deliver(&self.address, message.clone(), target)
            .await
    }

    async fn receive_message(&self, timeout: Duration) -> Option<Message> {
        self.inbox.recv_timeout(timeout).await
    }
}
