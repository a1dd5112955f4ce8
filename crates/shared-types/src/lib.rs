//! # Shared Types Crate
//!
//! Domain entities, the message envelope, typed payloads and the wire codec
//! used by every MeshPay node.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a node boundary is
//!   defined here, so authorities, clients and transports agree on shape.
//! - **Typed Payloads**: each [`MessageType`] maps to exactly one payload
//!   struct. Decoding a message either yields a fully typed [`MessageBody`]
//!   or a [`TypesError`]; there is no untyped dictionary access.
//! - **Stable Wire Names**: field names and enum strings match the JSON the
//!   rest of the mesh already speaks (`transfer_request`, `authority`, ...).
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`entities`] | Address, orders, account and authority state |
//! | [`tokens`] | Supported token table and zero-balance rows |
//! | [`messages`] | `MessageType` and per-type payload structs |
//! | [`envelope`] | The `Message` envelope and its JSON form |
//! | [`codec`] | Length-prefixed framing for stream transports |
//! | [`canonical`] | Sorted-key, ASCII-only JSON that digests are taken over |
//! | [`errors`] | `TypesError` |

pub mod canonical;
pub mod codec;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod messages;
pub mod tokens;

pub use canonical::canonical_json;
pub use codec::{FrameAck, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_LEN, MAX_DATAGRAM_SIZE};
pub use entities::*;
pub use envelope::{Message, WireMessage};
pub use errors::{TypesError, TypesResult};
pub use messages::*;
pub use tokens::{TokenInfo, TokenRegistry, NATIVE_TOKEN_ADDRESS};
