//! # Order Validation
//!
//! Pure checks over an authority's account table. Nothing here mutates state.
//!
//! | Rule | Error |
//! |------|-------|
//! | `amount > 0` | `InvalidAmount` |
//! | `sender != recipient` | `SameSenderRecipient` |
//! | sender and recipient non-empty | `EmptyParty` |
//! | sender account exists | `UnknownSender` |
//! | `sequence_number >= account.sequence_number` | `StaleSequence` |
//! | token row exists and covers `amount` | `UnknownToken`, `InsufficientBalance` |

use crate::error::{AuthorityError, AuthorityResult};
use shared_types::{AccountOffchainState, ConfirmationOrder, TransferOrder};
use std::collections::HashMap;

/// Validate a transfer order against the current account table.
///
/// An order whose sequence number equals the account's is accepted.
pub fn validate_transfer_order(
    order: &TransferOrder,
    accounts: &HashMap<String, AccountOffchainState>,
) -> AuthorityResult<()> {
    if order.amount == 0 {
        return Err(AuthorityError::InvalidAmount);
    }
    if order.sender.is_empty() || order.recipient.is_empty() {
        return Err(AuthorityError::EmptyParty);
    }
    if order.sender == order.recipient {
        return Err(AuthorityError::SameSenderRecipient);
    }

    let account = accounts
        .get(&order.sender)
        .ok_or_else(|| AuthorityError::UnknownSender(order.sender.clone()))?;

    if order.sequence_number < account.sequence_number {
        return Err(AuthorityError::StaleSequence {
            got: order.sequence_number,
            current: account.sequence_number,
        });
    }

    let available = account
        .balance_of(&order.token_address)
        .ok_or_else(|| AuthorityError::UnknownToken {
            address: order.sender.clone(),
            token: order.token_address.clone(),
        })?;
    if available < order.amount {
        return Err(AuthorityError::InsufficientBalance {
            required: order.amount,
            available,
        });
    }
    Ok(())
}

/// Enforce one outstanding order per sender.
///
/// Re-submitting the order that is already pending is allowed.
pub fn check_no_conflicting_pending(
    order: &TransferOrder,
    accounts: &HashMap<String, AccountOffchainState>,
) -> AuthorityResult<()> {
    let pending = accounts
        .get(&order.sender)
        .and_then(|a| a.pending_confirmation.as_ref());
    match pending {
        Some(p) if p.order_id != order.order_id => Err(AuthorityError::PendingConfirmationExists {
            address: order.sender.clone(),
            order_id: p.order_id,
        }),
        _ => Ok(()),
    }
}

/// Validate a confirmation order before it is applied.
///
/// Replays are rejected before the embedded transfer is re-validated, so a
/// duplicate reports `AlreadyConfirmed` rather than a balance error.
pub fn validate_confirmation_order(
    confirmation: &ConfirmationOrder,
    accounts: &HashMap<String, AccountOffchainState>,
) -> AuthorityResult<()> {
    if !confirmation.is_consistent() {
        return Err(AuthorityError::InconsistentConfirmation {
            confirmation: confirmation.order_id,
            transfer: confirmation.transfer_order.order_id,
        });
    }

    let order = &confirmation.transfer_order;
    if let Some(account) = accounts.get(&order.sender) {
        if account.confirmed_transfers.contains_key(&confirmation.order_id) {
            return Err(AuthorityError::AlreadyConfirmed(confirmation.order_id));
        }
        if let Some(pending) = &account.pending_confirmation {
            if pending.order_id != order.order_id {
                return Err(AuthorityError::PendingMismatch {
                    expected: pending.order_id,
                    got: order.order_id,
                });
            }
        }
    }

    validate_transfer_order(order, accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{SignedTransferOrder, TokenRegistry, NATIVE_TOKEN_ADDRESS};

    fn funded(address: &str, amount: u64) -> AccountOffchainState {
        let mut account = AccountOffchainState::new(address, TokenRegistry::default().zero_balances());
        if let Some(b) = account.balances.get_mut(NATIVE_TOKEN_ADDRESS) {
            assert!(b.credit(amount));
        }
        account
    }

    fn table() -> HashMap<String, AccountOffchainState> {
        let mut accounts = HashMap::new();
        accounts.insert("alice".to_string(), funded("alice", 100));
        accounts
    }

    fn order(amount: u64, seq: u64) -> TransferOrder {
        TransferOrder::new("alice", "bob", NATIVE_TOKEN_ADDRESS, amount, seq)
    }

    #[test]
    fn test_valid_order_passes() {
        assert_eq!(validate_transfer_order(&order(40, 1), &table()), Ok(()));
    }

    #[test]
    fn test_rejections() {
        let accounts = table();
        assert_eq!(
            validate_transfer_order(&order(0, 1), &accounts),
            Err(AuthorityError::InvalidAmount)
        );
        let to_self = TransferOrder::new("alice", "alice", NATIVE_TOKEN_ADDRESS, 1, 1);
        assert_eq!(
            validate_transfer_order(&to_self, &accounts),
            Err(AuthorityError::SameSenderRecipient)
        );
        let empty = TransferOrder::new("alice", "", NATIVE_TOKEN_ADDRESS, 1, 1);
        assert_eq!(validate_transfer_order(&empty, &accounts), Err(AuthorityError::EmptyParty));
        let stranger = TransferOrder::new("carol", "bob", NATIVE_TOKEN_ADDRESS, 1, 1);
        assert!(matches!(
            validate_transfer_order(&stranger, &accounts),
            Err(AuthorityError::UnknownSender(_))
        ));
        let odd_token = TransferOrder::new("alice", "bob", "0xdead", 1, 1);
        assert!(matches!(
            validate_transfer_order(&odd_token, &accounts),
            Err(AuthorityError::UnknownToken { .. })
        ));
        assert_eq!(
            validate_transfer_order(&order(101, 1), &accounts),
            Err(AuthorityError::InsufficientBalance {
                required: 101,
                available: 100
            })
        );
    }

    #[test]
    fn test_sequence_rule_accepts_equal_rejects_lower() {
        let mut accounts = table();
        if let Some(a) = accounts.get_mut("alice") {
            a.sequence_number = 3;
        }
        assert!(validate_transfer_order(&order(1, 3), &accounts).is_ok());
        assert!(validate_transfer_order(&order(1, 4), &accounts).is_ok());
        assert_eq!(
            validate_transfer_order(&order(1, 2), &accounts),
            Err(AuthorityError::StaleSequence { got: 2, current: 3 })
        );
    }

    #[test]
    fn test_conflicting_pending_rejected_same_order_allowed() {
        let mut accounts = table();
        let first = order(10, 1);
        if let Some(a) = accounts.get_mut("alice") {
            a.pending_confirmation = Some(SignedTransferOrder::new(first.clone(), "sig"));
        }
        assert!(check_no_conflicting_pending(&first, &accounts).is_ok());
        assert!(matches!(
            check_no_conflicting_pending(&order(10, 1), &accounts),
            Err(AuthorityError::PendingConfirmationExists { .. })
        ));
    }

    #[test]
    fn test_confirmation_must_match_pending() {
        let mut accounts = table();
        let pending = order(10, 1);
        if let Some(a) = accounts.get_mut("alice") {
            a.pending_confirmation = Some(SignedTransferOrder::new(pending.clone(), "sig"));
        }
        let foreign = ConfirmationOrder::new(order(10, 1), vec![]);
        assert!(matches!(
            validate_confirmation_order(&foreign, &accounts),
            Err(AuthorityError::PendingMismatch { .. })
        ));
        let matching = ConfirmationOrder::new(pending, vec![]);
        assert!(validate_confirmation_order(&matching, &accounts).is_ok());
    }

    #[test]
    fn test_confirmation_with_tampered_id_rejected() {
        let mut confirmation = ConfirmationOrder::new(order(10, 1), vec![]);
        confirmation.order_id = uuid::Uuid::new_v4();
        assert!(matches!(
            validate_confirmation_order(&confirmation, &table()),
            Err(AuthorityError::InconsistentConfirmation { .. })
        ));
    }
}
