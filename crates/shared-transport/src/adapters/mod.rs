//! Transport implementations.

pub(crate) mod framing;
pub mod memory;
pub mod tcp;
pub mod udp;
pub mod wifi_direct;
