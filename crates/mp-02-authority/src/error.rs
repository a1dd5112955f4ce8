//! Error types for the authority node.

use shared_transport::TransportError;
use thiserror::Error;
use uuid::Uuid;

/// Authority errors.
///
/// Validation variants never leave the node as errors: the authority turns
/// them into `success: false` responses carrying the `Display` text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    /// Transfer amount is zero.
    #[error("Invalid amount: transfers must move a positive amount")]
    InvalidAmount,

    /// Sender and recipient are the same address.
    #[error("Sender and recipient must differ")]
    SameSenderRecipient,

    /// Sender or recipient is empty.
    #[error("Sender and recipient must be non-empty")]
    EmptyParty,

    /// No account row for the sender.
    #[error("Unknown sender account: {0}")]
    UnknownSender(String),

    /// Order sequence number is behind the account.
    #[error("Stale sequence number {got}: account is at {current}")]
    StaleSequence { got: u64, current: u64 },

    /// Sender holds no balance row for the token.
    #[error("Token {token} not tracked for account {address}")]
    UnknownToken { address: String, token: String },

    /// Not enough MeshPay balance.
    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: u64, available: u64 },

    /// Crediting would push a balance past `u64::MAX`.
    #[error("Crediting {amount} would overflow {token} balance of {address}")]
    BalanceOverflow {
        address: String,
        token: String,
        amount: u64,
    },

    /// Another order is already awaiting confirmation for this sender.
    #[error("Account {address} already has order {order_id} awaiting confirmation")]
    PendingConfirmationExists { address: String, order_id: Uuid },

    /// Confirmation replayed.
    #[error("Order {0} already confirmed")]
    AlreadyConfirmed(Uuid),

    /// Confirmation names a different order than the one pending.
    #[error("Confirmation for {got} does not match pending order {expected}")]
    PendingMismatch { expected: Uuid, got: Uuid },

    /// Confirmation id and embedded transfer id disagree.
    #[error("Confirmation id {confirmation} does not match transfer order {transfer}")]
    InconsistentConfirmation { confirmation: Uuid, transfer: Uuid },

    /// Genesis funding for an address that already has a row.
    #[error("Account already exists: {0}")]
    AccountExists(String),

    /// Account lookup failed.
    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    /// Transport failure while sending or binding.
    #[error("Transport error: {0}")]
    Transport(String),

    /// `start_fastpay_services` called twice.
    #[error("Authority services already running")]
    AlreadyRunning,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthorityError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthorityError::InvalidAmount => "invalid_amount",
            AuthorityError::SameSenderRecipient => "same_sender_recipient",
            AuthorityError::EmptyParty => "empty_party",
            AuthorityError::UnknownSender(_) => "unknown_sender",
            AuthorityError::StaleSequence { .. } => "stale_sequence",
            AuthorityError::UnknownToken { .. } => "unknown_token",
            AuthorityError::InsufficientBalance { .. } => "insufficient_balance",
            AuthorityError::BalanceOverflow { .. } => "balance_overflow",
            AuthorityError::PendingConfirmationExists { .. } => "pending_confirmation_exists",
            AuthorityError::AlreadyConfirmed(_) => "already_confirmed",
            AuthorityError::PendingMismatch { .. } => "pending_mismatch",
            AuthorityError::InconsistentConfirmation { .. } => "inconsistent_confirmation",
            AuthorityError::AccountExists(_) => "account_exists",
            AuthorityError::UnknownAccount(_) => "unknown_account",
            AuthorityError::Transport(_) => "transport",
            AuthorityError::AlreadyRunning => "already_running",
            AuthorityError::Internal(_) => "internal",
        }
    }
}

impl From<TransportError> for AuthorityError {
    fn from(err: TransportError) -> Self {
        AuthorityError::Transport(err.to_string())
    }
}

/// Result alias for authority operations.
pub type AuthorityResult<T> = Result<T, AuthorityError>;
