//! # `Message` Envelope
//!
//! The wrapper every node-to-node message travels in.
//!
//! Two representations exist:
//!
//! - [`Message`]: what node code works with. The payload is a typed
//!   [`MessageBody`], so the type and payload can never disagree.
//! - [`WireMessage`]: the JSON shape on the wire, with a separate
//!   `message_type` string and an untyped `payload` object.
//!
//! [`Message::to_wire`] and [`Message::from_wire`] are the only bridges.

use crate::entities::{unix_timestamp, Address};
use crate::errors::TypesResult;
use crate::messages::{MessageBody, MessageType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// JSON form of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub message_id: Uuid,
    pub message_type: MessageType,
    pub sender: Address,
    #[serde(default)]
    pub recipient: Option<Address>,
    pub timestamp: f64,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// A typed message between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub message_id: Uuid,
    pub sender: Address,
    /// `None` for broadcasts.
    pub recipient: Option<Address>,
    pub timestamp: f64,
    pub body: MessageBody,
    pub signature: Option<String>,
}

impl Message {
    /// New message with a fresh id and the current time.
    pub fn new(sender: Address, recipient: Option<Address>, body: MessageBody) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            sender,
            recipient,
            timestamp: unix_timestamp(),
            body,
            signature: None,
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.body.message_type()
    }

    pub fn to_wire(&self) -> TypesResult<WireMessage> {
        Ok(WireMessage {
            message_id: self.message_id,
            message_type: self.message_type(),
            sender: self.sender.clone(),
            recipient: self.recipient.clone(),
            timestamp: self.timestamp,
            payload: self.body.to_payload()?,
            signature: self.signature.clone(),
        })
    }

    pub fn from_wire(wire: WireMessage) -> TypesResult<Self> {
        let body = MessageBody::from_payload(wire.message_type, wire.payload)?;
        Ok(Self {
            message_id: wire.message_id,
            sender: wire.sender,
            recipient: wire.recipient,
            timestamp: wire.timestamp,
            body,
            signature: wire.signature,
        })
    }

    /// UTF-8 JSON bytes.
    pub fn to_json_bytes(&self) -> TypesResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_wire()?)?)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> TypesResult<Self> {
        let wire: WireMessage = serde_json::from_slice(bytes)?;
        Self::from_wire(wire)
    }
}
