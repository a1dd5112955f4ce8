//! Error types for the client node.

use shared_transport::TransportError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// A response or confirmation arrived with no transfer in flight.
    #[error("No transfer pending")]
    NoPendingTransfer,

    #[error("Response for sender {got}, client is {expected}")]
    SenderMismatch { expected: String, got: String },

    #[error("Response sequence number {got}, client is at {expected}")]
    SequenceMismatch { expected: u64, got: u64 },

    #[error("Response for order {got}, pending order is {expected}")]
    OrderMismatch { expected: Uuid, got: Uuid },

    /// The authority refused the order.
    #[error("Transfer rejected by authority: {0}")]
    Rejected(String),

    /// Accepted response with no signature.
    #[error("Accepted response carries no authority signature")]
    MissingSignature,

    /// Same authority answered twice.
    #[error("Duplicate certificate from {0}")]
    DuplicateCertificate(String),

    #[error("Quorum not reached: have {have:.3}, need {need:.3}")]
    QuorumNotReached { have: f64, need: f64 },

    #[error("Confirmation {0} is not addressed to this client")]
    NotRecipient(Uuid),

    #[error("Confirmation {0} already received")]
    AlreadyReceived(Uuid),

    /// An earlier order is still waiting for its confirmation.
    #[error("Transfer {0} still awaiting confirmation")]
    TransferInProgress(Uuid),

    #[error("Amount must be positive")]
    InvalidAmount,

    /// No authority could be reached.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Transport(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
