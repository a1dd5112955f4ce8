//! # Frame Codec
//!
//! Stream transports send each message as a 4-byte big-endian length prefix
//! followed by that many bytes of UTF-8 JSON. Datagram transports send the
//! JSON alone, one message per datagram.

use crate::envelope::Message;
use crate::errors::{TypesError, TypesResult};
use serde::{Deserialize, Serialize};

/// Size of the length prefix.
pub const FRAME_HEADER_LEN: usize = 4;

/// Default ceiling for a single frame body (1 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Receive buffer for one datagram.
pub const MAX_DATAGRAM_SIZE: usize = 65536;

/// Acknowledgement written back by a stream server for each received frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameAck {
    pub status: String,
    pub node_id: String,
}

impl FrameAck {
    pub fn received(node_id: impl Into<String>) -> Self {
        Self {
            status: "received".to_string(),
            node_id: node_id.into(),
        }
    }
}

/// Prefix `body` with its length.
pub fn encode_frame(body: &[u8], max_frame_size: usize) -> TypesResult<Vec<u8>> {
    if body.len() > max_frame_size {
        return Err(TypesError::FrameTooLarge {
            size: body.len(),
            max: max_frame_size,
        });
    }
    let len = u32::try_from(body.len()).map_err(|_| TypesError::FrameTooLarge {
        size: body.len(),
        max: u32::MAX as usize,
    })?;
    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(body);
    Ok(frame)
}

/// Parse a length prefix, rejecting lengths above the ceiling before any
/// body buffer is allocated.
pub fn frame_length(header: [u8; FRAME_HEADER_LEN], max_frame_size: usize) -> TypesResult<usize> {
    let len = u32::from_be_bytes(header) as usize;
    if len > max_frame_size {
        return Err(TypesError::FrameTooLarge {
            size: len,
            max: max_frame_size,
        });
    }
    Ok(len)
}

/// Split one complete frame off the front of `buf`, returning the body.
pub fn decode_frame(buf: &[u8], max_frame_size: usize) -> TypesResult<&[u8]> {
    if buf.len() < FRAME_HEADER_LEN {
        return Err(TypesError::TruncatedFrame {
            expected: FRAME_HEADER_LEN,
            actual: buf.len(),
        });
    }
    let mut header = [0u8; FRAME_HEADER_LEN];
    header.copy_from_slice(&buf[..FRAME_HEADER_LEN]);
    let len = frame_length(header, max_frame_size)?;
    let body = &buf[FRAME_HEADER_LEN..];
    if body.len() < len {
        return Err(TypesError::TruncatedFrame {
            expected: len,
            actual: body.len(),
        });
    }
    Ok(&body[..len])
}

/// Encode a message as a length-prefixed frame.
pub fn encode_message_frame(message: &Message, max_frame_size: usize) -> TypesResult<Vec<u8>> {
    encode_frame(&message.to_json_bytes()?, max_frame_size)
}

/// Encode a message as a single datagram.
pub fn encode_datagram(message: &Message) -> TypesResult<Vec<u8>> {
    let bytes = message.to_json_bytes()?;
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(TypesError::FrameTooLarge {
            size: bytes.len(),
            max: MAX_DATAGRAM_SIZE,
        });
    }
    Ok(bytes)
}
