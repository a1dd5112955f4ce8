//! # WiFi-Direct Transport
//!
//! Same framing as [`TcpTransport`], carried over a WiFi-Direct P2P group
//! instead of an access-point network. The link layer is set up outside
//! this crate; the node only needs its P2P interface address.

use crate::adapters::tcp::TcpTransport;
use crate::config::StreamOptions;
use crate::error::TransportResult;
use crate::ports::NetworkTransport;
use async_trait::async_trait;
use shared_types::{Address, Message};
use std::net::SocketAddr;
use std::time::Duration;

pub struct WifiDirectTransport {
    inner: TcpTransport,
}

impl WifiDirectTransport {
    /// `address` must carry the node's P2P group interface IP.
    pub fn new(address: Address, options: StreamOptions) -> Self {
        Self {
            inner: TcpTransport::with_kind_name(address, options, "wifi_direct"),
        }
    }

    pub fn bound_addr(&self) -> Option<SocketAddr> {
        self.inner.bound_addr()
    }
}

#[async_trait]
impl NetworkTransport for WifiDirectTransport {
    fn kind_name(&self) -> &'static str {
        self.inner.kind_name()
    }

    fn local_address(&self) -> &Address {
        self.inner.local_address()
    }

    async fn connect(&self) -> TransportResult<()> {
        self.inner.connect().await
    }

    async fn disconnect(&self) {
        self.inner.disconnect().await
    }

    async fn send_message(&self, message: &Message, target: &Address) -> TransportResult<()> {
        self.inner.send_message(message, target).await
    }

    async fn receive_message(&self, timeout: Duration) -> Option<Message> {
        self.inner.receive_message(timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Heartbeat, MessageBody, NodeType};

    #[tokio::test]
    async fn test_wifi_direct_uses_stream_framing() {
        let server = WifiDirectTransport::new(
            Address::new("go", "127.0.0.1", 0, NodeType::Authority),
            StreamOptions::default(),
        );
        server.connect().await.unwrap();
        let port = server.bound_addr().unwrap().port();
        let target = Address::new("go", "127.0.0.1", port, NodeType::Authority);

        let peer = WifiDirectTransport::new(
            Address::new("peer", "127.0.0.1", 0, NodeType::Client),
            StreamOptions::default(),
        );
        let msg = Message::new(
            peer.local_address().clone(),
            Some(target.clone()),
            MessageBody::Heartbeat(Heartbeat::default()),
        );
        peer.send_message(&msg, &target).await.unwrap();
        assert_eq!(server.receive_message(Duration::from_secs(2)).await, Some(msg));
        assert_eq!(server.kind_name(), "wifi_direct");
        server.disconnect().await;
    }
}
