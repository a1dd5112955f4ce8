//! Authority domain: validation rules and the account ledger.

pub mod ledger;
pub mod validation;

pub use ledger::AuthorityLedger;
pub use validation::{check_no_conflicting_pending, validate_confirmation_order, validate_transfer_order};
