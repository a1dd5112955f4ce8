//! # Core Domain Entities
//!
//! Value types of the MeshPay protocol.
//!
//! ## Clusters
//!
//! - **Identity**: [`Address`], [`NodeType`]
//! - **Orders**: [`TransferOrder`], [`SignedTransferOrder`], [`ConfirmationOrder`],
//!   [`WeightedCertificate`], [`TransactionStatus`]
//! - **Ledger**: [`TokenBalance`], [`AccountOffchainState`]
//! - **Authority**: [`AuthorityState`], [`NetworkMetrics`]

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Name of an authority inside a committee.
pub type AuthorityName = String;

/// Seconds since the Unix epoch as a float, the timestamp unit used on the wire.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Role of a node in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Committee member that validates and co-signs transfers.
    Authority,
    /// Originator of transfer orders.
    Client,
    /// Bridge between the mesh and an external network.
    Gateway,
}

impl NodeType {
    /// Wire name of the node type.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Authority => "authority",
            NodeType::Client => "client",
            NodeType::Gateway => "gateway",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network endpoint. Immutable and copied by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Logical node name, e.g. `auth1` or `user3`.
    pub node_id: String,
    /// IP address without prefix length.
    pub ip_address: String,
    /// Listening port.
    pub port: u16,
    /// Role of the node.
    pub node_type: NodeType,
}

impl Address {
    /// Create a new address.
    pub fn new(
        node_id: impl Into<String>,
        ip_address: impl Into<String>,
        port: u16,
        node_type: NodeType,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            ip_address: ip_address.into(),
            port,
            node_type,
        }
    }

    /// `ip:port` string suitable for socket APIs.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.ip_address, self.port)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}@{}:{}",
            self.node_type, self.node_id, self.ip_address, self.port
        )
    }
}

// =============================================================================
// CLUSTER B: ORDERS
// =============================================================================

/// Lifecycle status of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Accepted by authorities, awaiting confirmation.
    #[default]
    Pending,
    /// Balance change applied.
    Confirmed,
    /// Refused by an authority.
    Rejected,
    /// Settled beyond the mesh.
    Finalized,
}

/// A client request to move `amount` of a token from `sender` to `recipient`.
///
/// Immutable once signed and broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferOrder {
    /// Unique order identifier.
    pub order_id: Uuid,
    /// Sending account.
    pub sender: String,
    /// Receiving account.
    pub recipient: String,
    /// Token contract address (see [`crate::tokens`]).
    pub token_address: String,
    /// Amount in the token's smallest unit. Must be positive to validate.
    pub amount: u64,
    /// Sender sequence number at order creation.
    pub sequence_number: u64,
    /// Creation time.
    pub timestamp: f64,
    /// Client signature, if any.
    #[serde(default)]
    pub signature: Option<String>,
}

impl TransferOrder {
    /// Build an unsigned order with a fresh id and the current time.
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        token_address: impl Into<String>,
        amount: u64,
        sequence_number: u64,
    ) -> Self {
        Self {
            order_id: Uuid::new_v4(),
            sender: sender.into(),
            recipient: recipient.into(),
            token_address: token_address.into(),
            amount,
            sequence_number,
            timestamp: unix_timestamp(),
            signature: None,
        }
    }

    /// Attach a client signature.
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

/// A transfer order countersigned by one authority.
///
/// Stored as the account's `pending_confirmation` between the two phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransferOrder {
    pub order_id: Uuid,
    pub transfer_order: TransferOrder,
    pub authority_signature: String,
    pub timestamp: f64,
}

impl SignedTransferOrder {
    /// Countersign `order` with `authority_signature`.
    pub fn new(transfer_order: TransferOrder, authority_signature: impl Into<String>) -> Self {
        Self {
            order_id: transfer_order.order_id,
            transfer_order,
            authority_signature: authority_signature.into(),
            timestamp: unix_timestamp(),
        }
    }
}

/// An authority's acceptance of a transfer, tagged with its voting weight.
///
/// The weight is fixed when the certificate is created and never
/// re-evaluated, so later weight changes cannot retroactively alter a quorum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCertificate {
    pub authority_name: AuthorityName,
    pub authority_signature: String,
    /// Normalized weight in `[0, 1]`.
    pub weight: f64,
    pub timestamp: f64,
}

impl WeightedCertificate {
    /// Create a certificate, clamping `weight` into `[0, 1]`.
    pub fn new(
        authority_name: impl Into<String>,
        authority_signature: impl Into<String>,
        weight: f64,
    ) -> Self {
        let weight = if weight.is_finite() {
            weight.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            authority_name: authority_name.into(),
            authority_signature: authority_signature.into(),
            weight,
            timestamp: unix_timestamp(),
        }
    }
}

/// A quorum-backed instruction for authorities to apply a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationOrder {
    pub order_id: Uuid,
    pub transfer_order: TransferOrder,
    pub authority_signatures: Vec<String>,
    /// Present when the quorum was assembled under the weighted rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weighted_certificates: Vec<WeightedCertificate>,
    pub timestamp: f64,
    pub status: TransactionStatus,
    #[serde(default)]
    pub total_weight: f64,
}

impl ConfirmationOrder {
    /// Assemble a pending confirmation from collected authority signatures.
    pub fn new(transfer_order: TransferOrder, authority_signatures: Vec<String>) -> Self {
        Self {
            order_id: transfer_order.order_id,
            transfer_order,
            authority_signatures,
            weighted_certificates: Vec::new(),
            timestamp: unix_timestamp(),
            status: TransactionStatus::Pending,
            total_weight: 0.0,
        }
    }

    /// Attach weighted certificates and record their combined weight.
    pub fn with_weighted_certificates(mut self, certificates: Vec<WeightedCertificate>) -> Self {
        self.total_weight = certificates.iter().map(|c| c.weight).sum();
        self.weighted_certificates = certificates;
        self
    }

    /// The outer id must name the embedded transfer order.
    pub fn is_consistent(&self) -> bool {
        self.order_id == self.transfer_order.order_id
    }
}

// =============================================================================
// CLUSTER C: LEDGER
// =============================================================================

/// Balance of one token in one account.
///
/// `meshpay_balance` is the amount the protocol moves; `total_balance` is
/// kept equal to `wallet_balance + meshpay_balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub token_symbol: String,
    pub token_address: String,
    pub wallet_balance: u64,
    pub meshpay_balance: u64,
    pub total_balance: u64,
    pub decimals: u8,
}

impl TokenBalance {
    /// Empty balance row.
    pub fn zero(token_symbol: impl Into<String>, token_address: impl Into<String>, decimals: u8) -> Self {
        Self {
            token_symbol: token_symbol.into(),
            token_address: token_address.into(),
            wallet_balance: 0,
            meshpay_balance: 0,
            total_balance: 0,
            decimals,
        }
    }

    /// Add to the MeshPay balance. Returns `false` and leaves the balance
    /// untouched if it would overflow.
    #[must_use]
    pub fn credit(&mut self, amount: u64) -> bool {
        match self.meshpay_balance.checked_add(amount) {
            Some(total) => {
                self.meshpay_balance = total;
                self.refresh_total();
                true
            }
            None => false,
        }
    }

    /// Subtract from the MeshPay balance. Returns `false` and leaves the
    /// balance untouched if funds are insufficient.
    pub fn debit(&mut self, amount: u64) -> bool {
        match self.meshpay_balance.checked_sub(amount) {
            Some(remaining) => {
                self.meshpay_balance = remaining;
                self.refresh_total();
                true
            }
            None => false,
        }
    }

    fn refresh_total(&mut self) {
        self.total_balance = self.wallet_balance.saturating_add(self.meshpay_balance);
    }
}

/// Ledger row for one address, held by exactly one authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountOffchainState {
    pub address: String,
    /// token_address -> balance
    pub balances: HashMap<String, TokenBalance>,
    pub sequence_number: u64,
    pub last_update: f64,
    /// At most one signed-but-unconfirmed order per account.
    pub pending_confirmation: Option<SignedTransferOrder>,
    /// order_id -> applied confirmation
    pub confirmed_transfers: HashMap<Uuid, ConfirmationOrder>,
}

impl AccountOffchainState {
    /// New account with sequence number zero.
    pub fn new(address: impl Into<String>, balances: HashMap<String, TokenBalance>) -> Self {
        Self {
            address: address.into(),
            balances,
            sequence_number: 0,
            last_update: unix_timestamp(),
            pending_confirmation: None,
            confirmed_transfers: HashMap::new(),
        }
    }

    /// MeshPay balance of `token_address`, if the account tracks that token.
    pub fn balance_of(&self, token_address: &str) -> Option<u64> {
        self.balances.get(token_address).map(|b| b.meshpay_balance)
    }

    pub fn touch(&mut self) {
        self.last_update = unix_timestamp();
    }
}

// =============================================================================
// CLUSTER D: AUTHORITY
// =============================================================================

/// Full state of one authority.
///
/// `transaction_count` and `error_count` only ever increase; the committee
/// derives voting weight from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityState {
    pub name: AuthorityName,
    pub address: Address,
    pub shard_assignments: HashSet<String>,
    pub accounts: HashMap<String, AccountOffchainState>,
    pub committee_members: HashSet<AuthorityName>,
    pub last_sync_time: f64,
    pub authority_signature: String,
    pub transaction_count: u64,
    pub error_count: u64,
    pub voting_weight: f64,
    pub stake: u64,
}

impl AuthorityState {
    /// Fresh state for an authority joining `committee_members`.
    pub fn new(
        name: impl Into<String>,
        address: Address,
        committee_members: HashSet<AuthorityName>,
    ) -> Self {
        let name = name.into();
        Self {
            authority_signature: format!("signed_by_authority_{name}"),
            name,
            address,
            shard_assignments: HashSet::new(),
            accounts: HashMap::new(),
            committee_members,
            last_sync_time: unix_timestamp(),
            transaction_count: 0,
            error_count: 0,
            voting_weight: 0.0,
            stake: 0,
        }
    }

    /// Performance counters used for voting weight, `max(tx - err, 0)`.
    pub fn net_performance(&self) -> u64 {
        self.transaction_count.saturating_sub(self.error_count)
    }
}

/// Link quality as observed by one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NetworkMetrics {
    pub latency_ms: f64,
    pub bandwidth_mbps: f64,
    pub packet_loss: f64,
    pub connectivity_ratio: f64,
    pub last_update: f64,
}
