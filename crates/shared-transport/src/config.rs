//! # Transport Configuration
//!
//! A tagged enum selects the transport at construction time:
//!
//! ```toml
//! [transport]
//! kind = "tcp"
//! connect_timeout_ms = 5000
//! ```

use crate::inbox::DEFAULT_INBOX_CAPACITY;
use serde::{Deserialize, Serialize};
use shared_types::DEFAULT_MAX_FRAME_SIZE;
use std::time::Duration;

/// Options shared by the stream transports (TCP and WiFi-Direct).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamOptions {
    /// Outbound connect timeout.
    pub connect_timeout_ms: u64,
    /// How long a sender waits for the receiver's ACK frame.
    pub ack_timeout_ms: u64,
    /// Frames above this size are refused.
    pub max_frame_size: usize,
    pub inbox_capacity: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            ack_timeout_ms: 2_000,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
        }
    }
}

impl StreamOptions {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

/// Which transport a node uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportKind {
    Tcp(StreamOptions),
    Udp,
    WifiDirect(StreamOptions),
    /// Simulated mesh inside one process.
    InMemory,
}

impl Default for TransportKind {
    fn default() -> Self {
        TransportKind::Tcp(StreamOptions::default())
    }
}

impl TransportKind {
    pub fn name(&self) -> &'static str {
        match self {
            TransportKind::Tcp(_) => "tcp",
            TransportKind::Udp => "udp",
            TransportKind::WifiDirect(_) => "wifi_direct",
            TransportKind::InMemory => "in_memory",
        }
    }
}
