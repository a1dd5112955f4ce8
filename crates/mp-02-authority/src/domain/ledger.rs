//! # Authority Ledger
//!
//! The per-authority account table and the two-phase transfer state machine.
//!
//! ```text
//! [NO PENDING] ──transfer order──→ [PENDING_CONFIRMATION] ──confirmation──→ [CONFIRMED]
//!       ↑                                   │                                  │
//!       └──────── clear_pending ────────────┘                                  │
//!       └────────────────── balances moved, sequence + 1 ─────────────────────┘
//! ```
//!
//! Phase one reserves nothing economically; it only blocks a second order
//! from the same sender. Balances change in exactly one place,
//! [`AuthorityLedger::handle_confirmation_order`].

use crate::domain::validation::{
    check_no_conflicting_pending, validate_confirmation_order, validate_transfer_order,
};
use crate::error::{AuthorityError, AuthorityResult};
use mp_01_committee::Committee;
use shared_types::{
    AccountOffchainState, AccountSummary, AuthorityState, ConfirmationOrder, SignedTransferOrder,
    TokenBalance, TokenRegistry, TransactionStatus, TransferOrder, TransferResponse,
    WeightedCertificate,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Account table plus counters for one authority.
pub struct AuthorityLedger {
    state: AuthorityState,
    tokens: TokenRegistry,
    committee: Option<Arc<Committee>>,
}

impl AuthorityLedger {
    pub fn new(state: AuthorityState, tokens: TokenRegistry) -> Self {
        Self {
            state,
            tokens,
            committee: None,
        }
    }

    /// Attach the committee so accepted transfers carry a weighted certificate.
    pub fn with_committee(mut self, committee: Arc<Committee>) -> Self {
        self.committee = Some(committee);
        self
    }

    pub fn set_committee(&mut self, committee: Arc<Committee>) {
        self.committee = Some(committee);
    }

    pub fn state(&self) -> &AuthorityState {
        &self.state
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn committee(&self) -> Option<&Arc<Committee>> {
        self.committee.as_ref()
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    pub fn account(&self, address: &str) -> Option<&AccountOffchainState> {
        self.state.accounts.get(address)
    }

    // =========================================================================
    // GENESIS FUNDING
    // =========================================================================

    /// Create an account row with the registry's zero balances overlaid by
    /// `initial` (token_address -> meshpay balance).
    pub fn open_account(
        &mut self,
        address: &str,
        initial: &HashMap<String, u64>,
    ) -> AuthorityResult<()> {
        if self.state.accounts.contains_key(address) {
            return Err(AuthorityError::AccountExists(address.to_string()));
        }
        let mut account = AccountOffchainState::new(address, self.tokens.zero_balances());
        for (token, amount) in initial {
            let row = account
                .balances
                .entry(token.clone())
                .or_insert_with(|| unregistered_token(token));
            if !row.credit(*amount) {
                return Err(overflow(address, token, *amount));
            }
        }
        self.state.accounts.insert(address.to_string(), account);
        info!(authority = %self.state.name, account = address, "Account opened");
        Ok(())
    }

    /// Add `amount` of `token` to an account, creating the row if needed.
    /// An overflowing credit is refused and leaves the balance as it was.
    pub fn credit_account(&mut self, address: &str, token: &str, amount: u64) -> AuthorityResult<()> {
        let account = self.account_or_default(address);
        let row = account
            .balances
            .entry(token.to_string())
            .or_insert_with(|| unregistered_token(token));
        if !row.credit(amount) {
            return Err(overflow(address, token, amount));
        }
        account.touch();
        Ok(())
    }

    /// Drop the pending order of `address`, returning it.
    pub fn clear_pending_confirmation(
        &mut self,
        address: &str,
    ) -> AuthorityResult<Option<SignedTransferOrder>> {
        let account = self
            .state
            .accounts
            .get_mut(address)
            .ok_or_else(|| AuthorityError::UnknownAccount(address.to_string()))?;
        let cleared = account.pending_confirmation.take();
        if let Some(p) = &cleared {
            info!(authority = %self.state.name, account = address, order_id = %p.order_id, "Pending order cleared");
        }
        Ok(cleared)
    }

    // =========================================================================
    // PHASE ONE: TRANSFER ORDER
    // =========================================================================

    /// Validate and countersign a transfer order.
    ///
    /// Never fails: rejections come back as `success: false` responses,
    /// bump `error_count` and leave the account table untouched.
    pub fn handle_transfer_order(&mut self, order: TransferOrder) -> TransferResponse {
        match self.accept_transfer(&order) {
            Ok(()) => {
                self.state.transaction_count += 1;
                mesh_telemetry::metrics::record_transfer_accepted();
                info!(
                    authority = %self.state.name,
                    order_id = %order.order_id,
                    sender = %order.sender,
                    amount = order.amount,
                    "Transfer order accepted"
                );
                let mut response =
                    TransferResponse::accepted(order, self.state.authority_signature.clone());
                response.weighted_certificate = self.weighted_certificate();
                response
            }
            Err(e) => {
                self.state.error_count += 1;
                mesh_telemetry::metrics::record_transfer_rejected(e.reason());
                warn!(
                    authority = %self.state.name,
                    order_id = %order.order_id,
                    error = %e,
                    "Transfer order rejected"
                );
                let mut response = TransferResponse::rejected(order, e.to_string());
                response.authority_signature = Some(self.state.authority_signature.clone());
                response
            }
        }
    }

    fn accept_transfer(&mut self, order: &TransferOrder) -> AuthorityResult<()> {
        validate_transfer_order(order, &self.state.accounts)?;
        check_no_conflicting_pending(order, &self.state.accounts)?;

        let signature = self.state.authority_signature.clone();
        let sender = self
            .state
            .accounts
            .get_mut(&order.sender)
            .ok_or_else(|| AuthorityError::UnknownSender(order.sender.clone()))?;
        sender.pending_confirmation = Some(SignedTransferOrder::new(order.clone(), signature));
        sender.touch();

        self.account_or_default(&order.recipient);
        Ok(())
    }

    fn weighted_certificate(&self) -> Option<WeightedCertificate> {
        let committee = self.committee.as_ref()?;
        let weight = committee.get_authority_weight(&self.state.name);
        Some(WeightedCertificate::new(
            self.state.name.clone(),
            self.state.authority_signature.clone(),
            weight,
        ))
    }

    // =========================================================================
    // PHASE TWO: CONFIRMATION ORDER
    // =========================================================================

    /// Apply a quorum-backed confirmation exactly once.
    ///
    /// Debits the sender, bumps its sequence number and credits the
    /// recipient. A replayed `order_id`, or an amount the recipient's balance
    /// cannot hold, is rejected and changes nothing.
    pub fn handle_confirmation_order(
        &mut self,
        mut confirmation: ConfirmationOrder,
    ) -> AuthorityResult<()> {
        let checked = validate_confirmation_order(&confirmation, &self.state.accounts)
            .and_then(|()| self.check_credit_headroom(&confirmation.transfer_order));
        if let Err(e) = checked {
            mesh_telemetry::metrics::record_confirmation_rejected(e.reason());
            warn!(
                authority = %self.state.name,
                order_id = %confirmation.order_id,
                error = %e,
                "Confirmation order rejected"
            );
            return Err(e);
        }

        let transfer = confirmation.transfer_order.clone();
        let sender = self
            .state
            .accounts
            .get_mut(&transfer.sender)
            .ok_or_else(|| AuthorityError::UnknownSender(transfer.sender.clone()))?;
        let sender_row = sender
            .balances
            .get_mut(&transfer.token_address)
            .ok_or_else(|| AuthorityError::UnknownToken {
                address: transfer.sender.clone(),
                token: transfer.token_address.clone(),
            })?;
        let available = sender_row.meshpay_balance;
        if !sender_row.debit(transfer.amount) {
            return Err(AuthorityError::InsufficientBalance {
                required: transfer.amount,
                available,
            });
        }
        let template = sender_row.clone();

        confirmation.status = TransactionStatus::Confirmed;
        sender.sequence_number += 1;
        sender.pending_confirmation = None;
        sender
            .confirmed_transfers
            .insert(confirmation.order_id, confirmation);
        sender.touch();

        let recipient = self.account_or_default(&transfer.recipient);
        let credited = recipient
            .balances
            .entry(transfer.token_address.clone())
            .or_insert_with(|| TokenBalance::zero(template.token_symbol, template.token_address, template.decimals))
            .credit(transfer.amount);
        debug_assert!(credited, "headroom checked before the debit");
        recipient.touch();

        mesh_telemetry::metrics::record_confirmation_applied();
        info!(
            authority = %self.state.name,
            order_id = %transfer.order_id,
            sender = %transfer.sender,
            recipient = %transfer.recipient,
            amount = transfer.amount,
            "Confirmation order applied"
        );
        Ok(())
    }

    /// The recipient must be able to absorb the amount before the sender is
    /// debited, so a confirmation either moves the full amount or nothing.
    fn check_credit_headroom(&self, transfer: &TransferOrder) -> AuthorityResult<()> {
        let current = self
            .state
            .accounts
            .get(&transfer.recipient)
            .and_then(|account| account.balances.get(&transfer.token_address))
            .map_or(0, |row| row.meshpay_balance);
        match current.checked_add(transfer.amount) {
            Some(_) => Ok(()),
            None => Err(overflow(&transfer.recipient, &transfer.token_address, transfer.amount)),
        }
    }

    // =========================================================================
    // QUERIES & COUNTERS
    // =========================================================================

    /// MeshPay balance of `token` held by `address`.
    pub fn get_account_balance(&self, address: &str, token: &str) -> Option<u64> {
        self.state.accounts.get(address)?.balance_of(token)
    }

    /// All balance rows of `address`.
    pub fn get_account_balances(&self, address: &str) -> Option<&HashMap<String, TokenBalance>> {
        self.state.accounts.get(address).map(|a| &a.balances)
    }

    /// Summaries for sync replies. Unknown addresses are skipped; an empty
    /// request returns every account.
    pub fn account_summaries(&self, addresses: &[String]) -> Vec<AccountSummary> {
        let summarize = |a: &AccountOffchainState| AccountSummary {
            address: a.address.clone(),
            sequence_number: a.sequence_number,
            balances: a
                .balances
                .iter()
                .map(|(token, b)| (token.clone(), b.meshpay_balance))
                .collect(),
        };
        if addresses.is_empty() {
            return self.state.accounts.values().map(summarize).collect();
        }
        addresses
            .iter()
            .filter_map(|addr| self.state.accounts.get(addr))
            .map(summarize)
            .collect()
    }

    pub fn record_error(&mut self) {
        self.state.error_count += 1;
    }

    pub fn mark_synced(&mut self) {
        self.state.last_sync_time = shared_types::unix_timestamp();
    }

    /// Push local counters into the committee so weights follow performance.
    pub fn publish_performance(&self) {
        if let Some(committee) = &self.committee {
            if let Err(e) = committee.update_authority_performance(
                &self.state.name,
                self.state.transaction_count,
                self.state.error_count,
            ) {
                debug!(authority = %self.state.name, error = %e, "Performance not published");
            }
        }
    }

    /// JSON snapshot of the full authority state.
    pub fn state_snapshot(&self) -> AuthorityResult<serde_json::Value> {
        serde_json::to_value(&self.state).map_err(|e| AuthorityError::Internal(e.to_string()))
    }

    fn account_or_default(&mut self, address: &str) -> &mut AccountOffchainState {
        let tokens = &self.tokens;
        self.state
            .accounts
            .entry(address.to_string())
            .or_insert_with(|| AccountOffchainState::new(address, tokens.zero_balances()))
    }
}

fn unregistered_token(token: &str) -> TokenBalance {
    TokenBalance::zero("UNKNOWN", token, 0)
}

fn overflow(address: &str, token: &str, amount: u64) -> AuthorityError {
    AuthorityError::BalanceOverflow {
        address: address.to_string(),
        token: token.to_string(),
        amount,
    }
}
