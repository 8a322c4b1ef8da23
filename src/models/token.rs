use serde::{Deserialize, Serialize};

/// Decimal precision assumed for a token whose decimals are not in the
/// registry. ERC-20 does not make `decimals()` mandatory, and most tokens use
/// 18, but stablecoins commonly use 6, so a wrong entry here corrupts
/// valuation by powers of ten. Any token added to the registry must carry its
/// verified on-chain value.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Immutable reference data for a known token, keyed by
/// (network, contract_address).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub contract_address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

impl TokenDescriptor {
    pub fn new(
        contract_address: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: u8,
    ) -> Self {
        Self {
            contract_address: contract_address.into(),
            symbol: symbol.into(),
            name: name.into(),
            decimals,
        }
    }
}
