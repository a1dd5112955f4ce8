//! # Message Types and Payloads
//!
//! Every [`MessageType`] has exactly one payload struct. [`MessageBody`] is the
//! sum of all of them; converting between a body and its `(message_type,
//! payload)` JSON pair goes through [`MessageBody::from_payload`] and
//! [`MessageBody::to_payload`].

use crate::entities::{Address, AuthorityName, ConfirmationOrder, NetworkMetrics, TransferOrder, WeightedCertificate};
use crate::errors::{TypesError, TypesResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Wire discriminator carried in the envelope's `message_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    TransferRequest,
    TransferResponse,
    ConfirmationRequest,
    ConfirmationResponse,
    SyncRequest,
    SyncResponse,
    PeerDiscovery,
    Heartbeat,
    Error,
    Preendorsement,
    Certificate,
    AnchorCommitment,
    ReconcileRequest,
    ReconcileResponse,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::TransferRequest => "transfer_request",
            MessageType::TransferResponse => "transfer_response",
            MessageType::ConfirmationRequest => "confirmation_request",
            MessageType::ConfirmationResponse => "confirmation_response",
            MessageType::SyncRequest => "sync_request",
            MessageType::SyncResponse => "sync_response",
            MessageType::PeerDiscovery => "peer_discovery",
            MessageType::Heartbeat => "heartbeat",
            MessageType::Error => "error",
            MessageType::Preendorsement => "preendorsement",
            MessageType::Certificate => "certificate",
            MessageType::AnchorCommitment => "anchor_commitment",
            MessageType::ReconcileRequest => "reconcile_request",
            MessageType::ReconcileResponse => "reconcile_response",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PAYLOADS: FASTPAY CORE
// =============================================================================

/// Client → authority: please validate and sign this order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub transfer_order: TransferOrder,
}

/// Authority → client: verdict on a transfer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferResponse {
    pub transfer_order: TransferOrder,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub authority_signature: Option<String>,
    /// Set by committee-aware authorities; omitted from JSON otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted_certificate: Option<WeightedCertificate>,
}

impl TransferResponse {
    /// Successful verdict carrying the authority's signature.
    pub fn accepted(transfer_order: TransferOrder, authority_signature: impl Into<String>) -> Self {
        Self {
            transfer_order,
            success: true,
            error_message: None,
            authority_signature: Some(authority_signature.into()),
            weighted_certificate: None,
        }
    }

    /// Failed verdict with a reason.
    pub fn rejected(transfer_order: TransferOrder, error_message: impl Into<String>) -> Self {
        Self {
            transfer_order,
            success: false,
            error_message: Some(error_message.into()),
            authority_signature: None,
            weighted_certificate: None,
        }
    }
}

/// Client → authorities: apply this quorum-backed transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    pub confirmation_order: ConfirmationOrder,
}

/// Authority → client: outcome of applying a confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationResponse {
    pub order_id: Uuid,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

// =============================================================================
// PAYLOADS: MESH MAINTENANCE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub last_sync_time: f64,
    pub account_addresses: Vec<String>,
}

/// Balances and sequence number of one account as seen by the responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub address: String,
    pub sequence_number: u64,
    /// token_address -> meshpay balance
    pub balances: HashMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub authority: AuthorityName,
    pub accounts: Vec<AccountSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerDiscovery {
    pub node_info: Address,
    #[serde(default)]
    pub service_capabilities: Vec<String>,
    #[serde(default)]
    pub network_metrics: Option<NetworkMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Heartbeat {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}

// =============================================================================
// PAYLOADS: CONSENSUS EXTENSIONS
// =============================================================================

/// An authority's early endorsement of a proposal hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preendorsement {
    pub order_id: Uuid,
    pub authority: AuthorityName,
    pub proposal_hash: String,
    pub signature: String,
}

/// Commit certificate for an order, keyed by precommitting authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub order_id: Uuid,
    pub proposal_hash: String,
    pub precommits: HashMap<AuthorityName, String>,
    pub threshold: u32,
}

/// Shard state root anchored by a set of authority signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorCommitment {
    pub shard_id: String,
    pub height: u64,
    pub state_root: String,
    pub signatures: HashMap<AuthorityName, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileRequest {
    pub shard_id: String,
    pub from_height: u64,
    #[serde(default)]
    pub to_height: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub shard_id: String,
    pub certificates: Vec<Certificate>,
}

// =============================================================================
// MESSAGE BODY
// =============================================================================

/// Typed payload of a [`crate::Message`], one variant per [`MessageType`].
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    TransferRequest(TransferRequest),
    TransferResponse(TransferResponse),
    ConfirmationRequest(ConfirmationRequest),
    ConfirmationResponse(ConfirmationResponse),
    SyncRequest(SyncRequest),
    SyncResponse(SyncResponse),
    PeerDiscovery(PeerDiscovery),
    Heartbeat(Heartbeat),
    Error(ErrorMessage),
    Preendorsement(Preendorsement),
    Certificate(Certificate),
    AnchorCommitment(AnchorCommitment),
    ReconcileRequest(ReconcileRequest),
    ReconcileResponse(ReconcileResponse),
}

fn parse<T: DeserializeOwned>(message_type: MessageType, payload: Value) -> TypesResult<T> {
    serde_json::from_value(payload).map_err(|e| TypesError::MalformedPayload {
        message_type,
        reason: e.to_string(),
    })
}

impl MessageBody {
    /// Discriminator for this body.
    pub fn message_type(&self) -> MessageType {
        match self {
            MessageBody::TransferRequest(_) => MessageType::TransferRequest,
            MessageBody::TransferResponse(_) => MessageType::TransferResponse,
            MessageBody::ConfirmationRequest(_) => MessageType::ConfirmationRequest,
            MessageBody::ConfirmationResponse(_) => MessageType::ConfirmationResponse,
            MessageBody::SyncRequest(_) => MessageType::SyncRequest,
            MessageBody::SyncResponse(_) => MessageType::SyncResponse,
            MessageBody::PeerDiscovery(_) => MessageType::PeerDiscovery,
            MessageBody::Heartbeat(_) => MessageType::Heartbeat,
            MessageBody::Error(_) => MessageType::Error,
            MessageBody::Preendorsement(_) => MessageType::Preendorsement,
            MessageBody::Certificate(_) => MessageType::Certificate,
            MessageBody::AnchorCommitment(_) => MessageType::AnchorCommitment,
            MessageBody::ReconcileRequest(_) => MessageType::ReconcileRequest,
            MessageBody::ReconcileResponse(_) => MessageType::ReconcileResponse,
        }
    }

    /// Decode the payload object that accompanies `message_type`.
    pub fn from_payload(message_type: MessageType, payload: Value) -> TypesResult<Self> {
        let body = match message_type {
            MessageType::TransferRequest => Self::TransferRequest(parse(message_type, payload)?),
            MessageType::TransferResponse => Self::TransferResponse(parse(message_type, payload)?),
            MessageType::ConfirmationRequest => {
                Self::ConfirmationRequest(parse(message_type, payload)?)
            }
            MessageType::ConfirmationResponse => {
                Self::ConfirmationResponse(parse(message_type, payload)?)
            }
            MessageType::SyncRequest => Self::SyncRequest(parse(message_type, payload)?),
            MessageType::SyncResponse => Self::SyncResponse(parse(message_type, payload)?),
            MessageType::PeerDiscovery => Self::PeerDiscovery(parse(message_type, payload)?),
            MessageType::Heartbeat => Self::Heartbeat(parse(message_type, payload)?),
            MessageType::Error => Self::Error(parse(message_type, payload)?),
            MessageType::Preendorsement => Self::Preendorsement(parse(message_type, payload)?),
            MessageType::Certificate => Self::Certificate(parse(message_type, payload)?),
            MessageType::AnchorCommitment => Self::AnchorCommitment(parse(message_type, payload)?),
            MessageType::ReconcileRequest => Self::ReconcileRequest(parse(message_type, payload)?),
            MessageType::ReconcileResponse => {
                Self::ReconcileResponse(parse(message_type, payload)?)
            }
        };
        Ok(body)
    }

    /// Encode the payload object for the envelope's `payload` field.
    pub fn to_payload(&self) -> TypesResult<Value> {
        let value = match self {
            MessageBody::TransferRequest(p) => serde_json::to_value(p),
            MessageBody::TransferResponse(p) => serde_json::to_value(p),
            MessageBody::ConfirmationRequest(p) => serde_json::to_value(p),
            MessageBody::ConfirmationResponse(p) => serde_json::to_value(p),
            MessageBody::SyncRequest(p) => serde_json::to_value(p),
            MessageBody::SyncResponse(p) => serde_json::to_value(p),
            MessageBody::PeerDiscovery(p) => serde_json::to_value(p),
            MessageBody::Heartbeat(p) => serde_json::to_value(p),
            MessageBody::Error(p) => serde_json::to_value(p),
            MessageBody::Preendorsement(p) => serde_json::to_value(p),
            MessageBody::Certificate(p) => serde_json::to_value(p),
            MessageBody::AnchorCommitment(p) => serde_json::to_value(p),
            MessageBody::ReconcileRequest(p) => serde_json::to_value(p),
            MessageBody::ReconcileResponse(p) => serde_json::to_value(p),
        };
        value.map_err(|e| TypesError::MalformedPayload {
            message_type: self.message_type(),
            reason: e.to_string(),
        })
    }
}
