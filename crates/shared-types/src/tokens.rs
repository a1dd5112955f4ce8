//! # Token Registry
//!
//! The set of tokens an authority tracks for every account. New account rows
//! start with a zero balance for each registered token.

use crate::entities::TokenBalance;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Address used for the chain's native token (XTZ).
pub const NATIVE_TOKEN_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

const DEFAULT_WTZ_ADDRESS: &str = "0x0000000000000000000000000000000000000001";
const DEFAULT_USDT_ADDRESS: &str = "0x0000000000000000000000000000000000000002";
const DEFAULT_USDC_ADDRESS: &str = "0x0000000000000000000000000000000000000003";

/// One supported token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(symbol: impl Into<String>, address: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            address: address.into(),
            decimals,
        }
    }
}

/// Ordered list of supported tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRegistry {
    tokens: Vec<TokenInfo>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::with_addresses(DEFAULT_WTZ_ADDRESS, DEFAULT_USDT_ADDRESS, DEFAULT_USDC_ADDRESS)
    }
}

impl TokenRegistry {
    pub fn new(tokens: Vec<TokenInfo>) -> Self {
        Self { tokens }
    }

    /// XTZ, WTZ, USDT and USDC with the given contract addresses.
    pub fn with_addresses(wtz: &str, usdt: &str, usdc: &str) -> Self {
        Self::new(vec![
            TokenInfo::new("XTZ", NATIVE_TOKEN_ADDRESS, 18),
            TokenInfo::new("WTZ", wtz, 18),
            TokenInfo::new("USDT", usdt, 6),
            TokenInfo::new("USDC", usdc, 6),
        ])
    }

    /// Default table with contract addresses taken from
    /// `MESHPAY_WTZ_ADDRESS`, `MESHPAY_USDT_ADDRESS` and `MESHPAY_USDC_ADDRESS`.
    pub fn from_env() -> Self {
        let wtz = std::env::var("MESHPAY_WTZ_ADDRESS").unwrap_or_else(|_| DEFAULT_WTZ_ADDRESS.into());
        let usdt =
            std::env::var("MESHPAY_USDT_ADDRESS").unwrap_or_else(|_| DEFAULT_USDT_ADDRESS.into());
        let usdc =
            std::env::var("MESHPAY_USDC_ADDRESS").unwrap_or_else(|_| DEFAULT_USDC_ADDRESS.into());
        Self::with_addresses(&wtz, &usdt, &usdc)
    }

    pub fn tokens(&self) -> &[TokenInfo] {
        &self.tokens
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&TokenInfo> {
        self.tokens.iter().find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn by_address(&self, address: &str) -> Option<&TokenInfo> {
        self.tokens.iter().find(|t| t.address == address)
    }

    /// A zero balance row for every registered token, keyed by address.
    pub fn zero_balances(&self) -> HashMap<String, TokenBalance> {
        self.tokens
            .iter()
            .map(|t| {
                (
                    t.address.clone(),
                    TokenBalance::zero(&t.symbol, &t.address, t.decimals),
                )
            })
            .collect()
    }
}
