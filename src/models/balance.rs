use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::token::TokenDescriptor;
use super::Network;

/// What a balance is denominated in: the chain's base currency or a known
/// contract token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Asset {
    Native,
    Token(TokenDescriptor),
}

/// An integer balance in the asset's smallest unit, as returned by the chain.
/// Never persisted without the decimal context carried by its asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBalance {
    pub address_id: Uuid,
    pub address: String,
    pub network: Network,
    pub asset: Asset,
    pub amount: U256,
}

/// A raw balance joined with its scaled amount and fiat valuation, all
/// computed from data fetched in the same refresh cycle.
///
/// `price`/`value` are `None` when the price feed had no quote. An unpriced
/// holding is a data-quality gap, not a zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuedBalance {
    pub address_id: Uuid,
    pub network: Network,
    /// `None` for the native currency.
    pub token_address: Option<String>,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub raw_amount: U256,
    /// Raw amount scaled by the asset's decimals.
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub value: Option<Decimal>,
    pub fetched_at: DateTime<Utc>,
}

/// One address whose fetch failed during a refresh. Surfaced to the caller;
/// the rest of the refresh is unaffected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchFailure {
    pub address_id: Uuid,
    pub address: String,
    pub network: Network,
    pub reason: String,
}

/// Result of one portfolio refresh cycle: everything that succeeded plus
/// everything that did not. An all-failures refresh is still a valid outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshOutcome {
    pub balances: Vec<ValuedBalance>,
    pub failures: Vec<FetchFailure>,
}

impl RefreshOutcome {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}
