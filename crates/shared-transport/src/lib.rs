//! # Shared Transport
//!
//! Moves [`Message`](shared_types::Message)s between MeshPay nodes.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────┐   send_message    ┌──────────────┐
//!   │  node worker │ ────────────────▶ │ remote peer  │
//!   └──────┬───────┘                   └──────┬───────┘
//!          │ receive_message(timeout)         │ frames / datagrams
//!          ▼                                  ▼
//!   ┌──────────────┐   one task per    ┌──────────────┐
//!   │    Inbox     │ ◀──────────────── │   listener   │
//!   │ (mpsc queue) │   connection      │ accept loop  │
//!   └──────────────┘                   └──────────────┘
//! ```
//!
//! Listeners may run many connection tasks at once, but every decoded
//! message is pushed into a single [`Inbox`](inbox::Inbox). The node's worker
//! drains that queue, so state machines only ever see one message at a time.
//!
//! ## Implementations
//!
//! | Kind | Type | Framing |
//! |------|------|---------|
//! | `tcp` | [`TcpTransport`] | 4-byte BE length prefix + JSON, ACK per frame |
//! | `udp` | [`UdpTransport`] | one JSON datagram per message |
//! | `wifi_direct` | [`WifiDirectTransport`] | TCP framing over the P2P link |
//! | `in_memory` | [`InMemoryTransport`] | direct queue hand-off via [`MeshNetwork`] |

pub mod adapters;
pub mod config;
pub mod error;
pub mod inbox;
pub mod ports;

pub use adapters::memory::{InMemoryTransport, MeshNetwork};
pub use adapters::tcp::TcpTransport;
pub use adapters::udp::UdpTransport;
pub use adapters::wifi_direct::WifiDirectTransport;
pub use config::{StreamOptions, TransportKind};
pub use error::{TransportError, TransportResult};
pub use ports::NetworkTransport;

use shared_types::Address;
use std::sync::Arc;

/// Build the transport selected by `kind` for the node at `address`.
///
/// `mesh` is only consulted for [`TransportKind::InMemory`].
pub fn build_transport(
    kind: &TransportKind,
    address: Address,
    mesh: Option<&Arc<MeshNetwork>>,
) -> TransportResult<Arc<dyn NetworkTransport>> {
    let transport: Arc<dyn NetworkTransport> = match kind {
        TransportKind::Tcp(options) => Arc::new(TcpTransport::new(address, options.clone())),
        TransportKind::Udp => Arc::new(UdpTransport::new(address)),
        TransportKind::WifiDirect(options) => {
            Arc::new(WifiDirectTransport::new(address, options.clone()))
        }
        TransportKind::InMemory => {
            let mesh = mesh.ok_or(TransportError::NoMeshNetwork)?;
            Arc::new(InMemoryTransport::new(address, Arc::clone(mesh)))
        }
    };
    Ok(transport)
}
