//! # TCP Transport
//!
//! Each message is one length-prefixed frame on a fresh connection. The
//! listener answers every decoded frame with a [`FrameAck`].

use crate::adapters::framing::{read_frame, write_frame};
use crate::config::StreamOptions;
use crate::error::{TransportError, TransportResult};
use crate::inbox::Inbox;
use crate::ports::NetworkTransport;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::codec::encode_message_frame;
use shared_types::{Address, FrameAck, Message};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Stream transport over plain TCP.
pub struct TcpTransport {
    address: Address,
    options: StreamOptions,
    inbox: Arc<Inbox>,
    shutdown: Mutex<Option<CancellationToken>>,
    bound: Mutex<Option<SocketAddr>>,
    kind_name: &'static str,
}

impl TcpTransport {
    pub fn new(address: Address, options: StreamOptions) -> Self {
        Self::with_kind_name(address, options, "tcp")
    }

    pub(crate) fn with_kind_name(address: Address, options: StreamOptions, kind_name: &'static str) -> Self {
        let inbox = Arc::new(Inbox::new(options.inbox_capacity));
        Self {
            address,
            options,
            inbox,
            shutdown: Mutex::new(None),
            bound: Mutex::new(None),
            kind_name,
        }
    }

    /// Socket address actually bound, useful when configured with port 0.
    pub fn bound_addr(&self) -> Option<SocketAddr> {
        *self.bound.lock()
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    async fn accept_loop(
        listener: TcpListener,
        inbox: mpsc::Sender<Message>,
        node_id: String,
        max_frame_size: usize,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(Self::serve_connection(
                            stream,
                            peer,
                            inbox.clone(),
                            node_id.clone(),
                            max_frame_size,
                            shutdown.child_token(),
                        ));
                    }
                    Err(e) => warn!(node = %node_id, error = %e, "Accept failed"),
                },
            }
        }
        debug!(node = %node_id, "TCP listener stopped");
    }

    async fn serve_connection(
        mut stream: TcpStream,
        peer: SocketAddr,
        inbox: mpsc::Sender<Message>,
        node_id: String,
        max_frame_size: usize,
        shutdown: CancellationToken,
    ) {
        let ack = match serde_json::to_vec(&FrameAck::received(&node_id)) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode ack");
                return;
            }
        };

        loop {
            let frame = tokio::select! {
                _ = shutdown.cancelled() => break,
                frame = read_frame(&mut stream, max_frame_size) => frame,
            };
            let body = match frame {
                Ok(Some(body)) => body,
                Ok(None) => break,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "Dropping connection after bad frame");
                    break;
                }
            };
            match Message::from_json_bytes(&body) {
                Ok(message) => {
                    debug!(peer = %peer, message_type = %message.message_type(), "Frame received");
                    if inbox.send(message).await.is_err() {
                        break;
                    }
                    if let Err(e) = write_frame(&mut stream, &ack, max_frame_size).await {
                        debug!(peer = %peer, error = %e, "Ack write failed");
                        break;
                    }
                }
                Err(e) => warn!(peer = %peer, error = %e, "Dropping malformed message"),
            }
        }
        let _ = stream.shutdown().await;
    }

    async fn read_ack(&self, stream: &mut TcpStream, endpoint: &str) {
        match tokio::time::timeout(
            self.options.ack_timeout(),
            read_frame(stream, self.options.max_frame_size),
        )
        .await
        {
            Ok(Ok(Some(bytes))) => match serde_json::from_slice::<FrameAck>(&bytes) {
                Ok(ack) => debug!(endpoint, from = %ack.node_id, status = %ack.status, "Ack received"),
                Err(e) => debug!(endpoint, error = %e, "Unreadable ack"),
            },
            Ok(Ok(None)) => debug!(endpoint, "Peer closed before ack"),
            Ok(Err(e)) => debug!(endpoint, error = %e, "Ack read failed"),
            Err(_) => debug!(endpoint, "No ack before timeout"),
        }
    }
}

#[async_trait]
impl NetworkTransport for TcpTransport {
    fn kind_name(&self) -> &'static str {
        self.kind_name
    }

    fn local_address(&self) -> &Address {
        &self.address
    }

    async fn connect(&self) -> TransportResult<()> {
        if self.shutdown.lock().is_some() {
            return Ok(());
        }
        let endpoint = self.address.endpoint();
        let listener = TcpListener::bind(&endpoint)
            .await
            .map_err(|e| TransportError::Bind {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        let bound = listener.local_addr()?;
        let token = CancellationToken::new();
        *self.bound.lock() = Some(bound);
        *self.shutdown.lock() = Some(token.clone());

        tokio::spawn(Self::accept_loop(
            listener,
            self.inbox.sender(),
            self.address.node_id.clone(),
            self.options.max_frame_size,
            token,
        ));
        info!(node = %self.address.node_id, kind = self.kind_name, addr = %bound, "Transport listening");
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(token) = self.shutdown.lock().take() {
            token.cancel();
            info!(node = %self.address.node_id, kind = self.kind_name, "Transport stopped");
        }
        *self.bound.lock() = None;
    }

    async fn send_message(&self, message: &Message, target: &Address) -> TransportResult<()> {
        let endpoint = target.endpoint();
        let frame = encode_message_frame(message, self.options.max_frame_size)?;
        let timeout = self.options.connect_timeout();

        let mut stream = tokio::time::timeout(timeout, TcpStream::connect(&endpoint))
            .await
            .map_err(|_| TransportError::Timeout {
                endpoint: endpoint.clone(),
                after_ms: duration_ms(timeout),
            })?
            .map_err(|e| TransportError::Connect {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        stream.write_all(&frame).await?;
        stream.flush().await?;
        self.read_ack(&mut stream, &endpoint).await;
        let _ = stream.shutdown().await;
        Ok(())
    }

    async fn receive_message(&self, timeout: Duration) -> Option<Message> {
        self.inbox.recv_timeout(timeout).await
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
