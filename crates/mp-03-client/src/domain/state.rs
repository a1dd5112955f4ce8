//! # Client State Machine
//!
//! ```text
//! [IDLE] ──transfer()──→ [AWAITING RESPONSES] ──responses──→ [QUORUM] ──confirm──→ [IDLE]
//!                              │                                │               seq + 1
//!                              │                                └── not delivered: stays put
//!                              └── not enough certificates: stays put, retry later
//! ```
//!
//! The state only returns to idle once a confirmation has reached at least
//! one authority. Until then the same confirmation can be rebuilt and
//! re-sent, because every authority keeps the order pending.
//!
//! Accumulation is order-insensitive: any authority's accepted response
//! counts, at most once per authority.

use crate::error::{ClientError, ClientResult};
use mp_01_committee::QuorumRule;
use shared_types::{
    unix_timestamp, Address, ConfirmationOrder, TransactionStatus, TransferOrder,
    TransferResponse, WeightedCertificate,
};
use std::collections::HashMap;
use uuid::Uuid;

const EPSILON: f64 = 1e-9;

/// Certificates needed under the equal-weight rule: `2/3·n + 1`.
pub fn equal_weight_threshold(committee_size: usize) -> f64 {
    2.0 / 3.0 * committee_size as f64 + 1.0
}

/// Where a pending transfer stands against the configured rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuorumProgress {
    pub have: f64,
    pub need: f64,
}

impl QuorumProgress {
    pub fn reached(&self) -> bool {
        self.have + EPSILON >= self.need
    }
}

/// Local view of one client.
#[derive(Debug, Clone)]
pub struct ClientState {
    pub name: String,
    pub address: Address,
    /// Placeholder signing secret attached to every order.
    pub secret: String,
    pub sequence_number: u64,
    /// Authorities the client talks to.
    pub committee: Vec<Address>,
    pub pending_transfer: Option<TransferOrder>,
    /// Accepted responses for the pending transfer, one per authority.
    pub sent_certificates: Vec<TransferResponse>,
    /// Confirmations received as recipient, by order id.
    pub received_certificates: HashMap<Uuid, ConfirmationOrder>,
    /// Locally tracked balance.
    pub balance: u64,
    /// Weighted certificates for the pending transfer.
    pub weighted_certificates: Vec<WeightedCertificate>,
    pub transfer_started_at: Option<f64>,
    pub quorum_reached_time: Option<f64>,
}

impl ClientState {
    /// Fresh client. Sequence numbers start at 1.
    pub fn new(name: impl Into<String>, address: Address, committee: Vec<Address>) -> Self {
        let name = name.into();
        Self {
            secret: format!("secret_of_{name}"),
            name,
            address,
            sequence_number: 1,
            committee,
            pending_transfer: None,
            sent_certificates: Vec::new(),
            received_certificates: HashMap::new(),
            balance: 0,
            weighted_certificates: Vec::new(),
            transfer_started_at: None,
            quorum_reached_time: None,
        }
    }

    /// Build the next order and make it the pending transfer.
    ///
    /// Refused with `TransferInProgress` while another order is pending:
    /// authorities hold that order until it is confirmed, so a second one
    /// would be rejected everywhere. See [`ClientState::abandon_transfer`].
    pub fn begin_transfer(
        &mut self,
        recipient: &str,
        token_address: &str,
        amount: u64,
    ) -> ClientResult<TransferOrder> {
        if amount == 0 {
            return Err(ClientError::InvalidAmount);
        }
        if let Some(pending) = &self.pending_transfer {
            return Err(ClientError::TransferInProgress(pending.order_id));
        }
        let order = TransferOrder::new(
            self.name.clone(),
            recipient,
            token_address,
            amount,
            self.sequence_number,
        )
        .with_signature(self.secret.clone());
        self.pending_transfer = Some(order.clone());
        self.sent_certificates.clear();
        self.weighted_certificates.clear();
        self.transfer_started_at = Some(unix_timestamp());
        self.quorum_reached_time = None;
        Ok(order)
    }

    /// Record one authority's response to the pending transfer.
    pub fn accept_response(&mut self, response: TransferResponse) -> ClientResult<()> {
        let order = &response.transfer_order;
        if order.sender != self.name {
            return Err(ClientError::SenderMismatch {
                expected: self.name.clone(),
                got: order.sender.clone(),
            });
        }
        if order.sequence_number != self.sequence_number {
            return Err(ClientError::SequenceMismatch {
                expected: self.sequence_number,
                got: order.sequence_number,
            });
        }
        let pending = self
            .pending_transfer
            .as_ref()
            .ok_or(ClientError::NoPendingTransfer)?;
        if pending.order_id != order.order_id {
            return Err(ClientError::OrderMismatch {
                expected: pending.order_id,
                got: order.order_id,
            });
        }
        if !response.success {
            return Err(ClientError::Rejected(
                response.error_message.unwrap_or_default(),
            ));
        }
        let signature = response
            .authority_signature
            .clone()
            .ok_or(ClientError::MissingSignature)?;
        if self
            .sent_certificates
            .iter()
            .any(|c| c.authority_signature.as_deref() == Some(signature.as_str()))
        {
            return Err(ClientError::DuplicateCertificate(signature));
        }

        if let Some(cert) = &response.weighted_certificate {
            if !self
                .weighted_certificates
                .iter()
                .any(|c| c.authority_name == cert.authority_name)
            {
                self.weighted_certificates.push(cert.clone());
            }
        }
        self.sent_certificates.push(response);
        Ok(())
    }

    /// Progress of the pending transfer under `rule`.
    pub fn quorum_progress(&self, rule: QuorumRule, threshold: f64) -> QuorumProgress {
        match rule {
            QuorumRule::EqualWeight => QuorumProgress {
                have: self.sent_certificates.len() as f64,
                need: equal_weight_threshold(self.committee.len()),
            },
            QuorumRule::Weighted => QuorumProgress {
                have: self.weighted_certificates.iter().map(|c| c.weight).sum(),
                need: threshold,
            },
        }
    }

    /// Assemble the confirmation for the pending transfer.
    ///
    /// Nothing changes here: on `QuorumNotReached` the caller may retry once
    /// more certificates arrive, and a built confirmation that fails to go
    /// out can simply be built again.
    pub fn build_confirmation(
        &self,
        rule: QuorumRule,
        threshold: f64,
    ) -> ClientResult<ConfirmationOrder> {
        let progress = self.quorum_progress(rule, threshold);
        if !progress.reached() {
            return Err(ClientError::QuorumNotReached {
                have: progress.have,
                need: progress.need,
            });
        }
        let order = self
            .pending_transfer
            .clone()
            .ok_or(ClientError::NoPendingTransfer)?;

        let signatures = self
            .sent_certificates
            .iter()
            .filter_map(|c| c.authority_signature.clone())
            .collect();
        let mut confirmation = ConfirmationOrder::new(order, signatures);
        if rule == QuorumRule::Weighted {
            confirmation = confirmation.with_weighted_certificates(self.weighted_certificates.clone());
        }
        confirmation.status = TransactionStatus::Confirmed;
        Ok(confirmation)
    }

    /// Return to idle after the confirmation for `order_id` went out.
    pub fn complete_confirmation(&mut self, order_id: Uuid) -> ClientResult<()> {
        let pending = self
            .pending_transfer
            .as_ref()
            .ok_or(ClientError::NoPendingTransfer)?;
        if pending.order_id != order_id {
            return Err(ClientError::OrderMismatch {
                expected: pending.order_id,
                got: order_id,
            });
        }
        let amount = pending.amount;
        self.pending_transfer = None;
        self.sent_certificates.clear();
        self.weighted_certificates.clear();
        self.sequence_number += 1;
        self.balance = self.balance.saturating_sub(amount);
        self.transfer_started_at = None;
        Ok(())
    }

    /// Drop the pending transfer without confirming it.
    ///
    /// The sequence number is kept. Authorities still hold the order until
    /// their `clear_pending_confirmation` is called for this account.
    pub fn abandon_transfer(&mut self) -> Option<TransferOrder> {
        let order = self.pending_transfer.take()?;
        self.sent_certificates.clear();
        self.weighted_certificates.clear();
        self.transfer_started_at = None;
        self.quorum_reached_time = None;
        Some(order)
    }

    /// Accept a confirmation naming this client as recipient.
    pub fn receive_confirmation(&mut self, confirmation: ConfirmationOrder) -> ClientResult<u64> {
        if confirmation.transfer_order.recipient != self.name {
            return Err(ClientError::NotRecipient(confirmation.order_id));
        }
        if self.received_certificates.contains_key(&confirmation.order_id) {
            return Err(ClientError::AlreadyReceived(confirmation.order_id));
        }
        let amount = confirmation.transfer_order.amount;
        self.balance = self.balance.saturating_add(amount);
        self.received_certificates
            .insert(confirmation.order_id, confirmation);
        Ok(amount)
    }
}
