//! # Genesis
//!
//! Opens the configured accounts on the local authority and builds the
//! committee every authority in the file agrees on.

use crate::config::{CommitteeMember, GenesisAccount};
use mp_01_committee::{Committee, CommitteeError};
use mp_02_authority::{AuthorityError, AuthorityNode};
use shared_types::{AuthorityState, TokenRegistry};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Account {account}: unknown token {token}")]
    UnknownToken { account: String, token: String },

    #[error("Account {0} listed twice in genesis")]
    DuplicateAccount(String),

    #[error(transparent)]
    Authority(#[from] AuthorityError),

    #[error(transparent)]
    Committee(#[from] CommitteeError),
}

/// Translate symbol keys (`XTZ`) into the token addresses accounts are keyed by.
pub fn resolve_balances(
    account: &GenesisAccount,
    tokens: &TokenRegistry,
) -> Result<HashMap<String, u64>, GenesisError> {
    let mut resolved = HashMap::new();
    for (key, amount) in &account.balances {
        let token = tokens
            .by_symbol(key)
            .or_else(|| tokens.by_address(key))
            .ok_or_else(|| GenesisError::UnknownToken {
                account: account.address.clone(),
                token: key.clone(),
            })?;
        *resolved.entry(token.address.clone()).or_insert(0) += amount;
    }
    Ok(resolved)
}

/// Open every genesis account on `node`. Returns the number opened.
pub fn fund_accounts(
    node: &AuthorityNode,
    accounts: &[GenesisAccount],
    tokens: &TokenRegistry,
) -> Result<usize, GenesisError> {
    let mut seen = HashSet::new();
    for account in accounts {
        if !seen.insert(account.address.as_str()) {
            return Err(GenesisError::DuplicateAccount(account.address.clone()));
        }
        let balances = resolve_balances(account, tokens)?;
        node.open_account(&account.address, &balances)?;
    }
    info!(authority = node.name(), accounts = accounts.len(), "Genesis accounts funded");
    Ok(accounts.len())
}

/// Committee of `members`, or `None` when the file lists none.
pub fn build_committee(
    members: &[CommitteeMember],
    quorum_threshold: f64,
) -> Result<Option<Arc<Committee>>, GenesisError> {
    if members.is_empty() {
        return Ok(None);
    }
    let names: HashSet<String> = members.iter().map(|m| m.name.clone()).collect();
    let authorities = members
        .iter()
        .map(|m| AuthorityState::new(m.name.clone(), m.address(), names.clone()))
        .collect();
    let committee = Committee::with_threshold(authorities, quorum_threshold)?;
    Ok(Some(Arc::new(committee)))
}
