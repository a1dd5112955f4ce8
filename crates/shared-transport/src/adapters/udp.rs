//! # UDP Transport
//!
//! One JSON datagram per message, no length prefix and no fragmentation.
//! Messages must fit in [`MAX_DATAGRAM_SIZE`] bytes.

use crate::error::{TransportError, TransportResult};
use crate::inbox::Inbox;
use crate::ports::NetworkTransport;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::codec::encode_datagram;
use shared_types::{Address, Message, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct UdpTransport {
    address: Address,
    inbox: Arc<Inbox>,
    socket: RwLock<Option<Arc<UdpSocket>>>,
    shutdown: Mutex<Option<CancellationToken>>,
}

impl UdpTransport {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            inbox: Arc::new(Inbox::default()),
            socket: RwLock::new(None),
            shutdown: Mutex::new(None),
        }
    }

    pub fn bound_addr(&self) -> Option<SocketAddr> {
        self.socket
            .read()
            .as_ref()
            .and_then(|s| s.local_addr().ok())
    }

    async fn recv_loop(
        socket: Arc<UdpSocket>,
        inbox: mpsc::Sender<Message>,
        node_id: String,
        shutdown: CancellationToken,
    ) {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = socket.recv_from(&mut buf) => received,
            };
            match received {
                Ok((len, peer)) => match Message::from_json_bytes(&buf[..len]) {
                    Ok(message) => {
                        debug!(peer = %peer, message_type = %message.message_type(), "Datagram received");
                        if inbox.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(peer = %peer, error = %e, "Dropping malformed datagram"),
                },
                Err(e) => warn!(node = %node_id, error = %e, "UDP receive failed"),
            }
        }
        debug!(node = %node_id, "UDP listener stopped");
    }
}

#[async_trait]
impl NetworkTransport for UdpTransport {
    fn kind_name(&self) -> &'static str {
        "udp"
    }

    fn local_address(&self) -> &Address {
        &self.address
    }

    async fn connect(&self) -> TransportResult<()> {
        if self.socket.read().is_some() {
            return Ok(());
        }
        let endpoint = self.address.endpoint();
        let socket = UdpSocket::bind(&endpoint)
            .await
            .map(Arc::new)
            .map_err(|e| TransportError::Bind {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        let token = CancellationToken::new();
        *self.socket.write() = Some(Arc::clone(&socket));
        *self.shutdown.lock() = Some(token.clone());

        tokio::spawn(Self::recv_loop(
            socket,
            self.inbox.sender(),
            self.address.node_id.clone(),
            token,
        ));
        info!(node = %self.address.node_id, endpoint = %endpoint, "UDP transport listening");
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(token) = self.shutdown.lock().take() {
            token.cancel();
        }
        *self.socket.write() = None;
    }

    async fn send_message(&self, message: &Message, target: &Address) -> TransportResult<()> {
        let socket = self
            .socket
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(TransportError::NotConnected)?;
        let datagram = encode_datagram(message)?;
        socket.send_to(&datagram, target.endpoint()).await?;
        Ok(())
    }

    async fn receive_message(&self, timeout: Duration) -> Option<Message> {
        self.inbox.recv_timeout(timeout).await
    }
}
