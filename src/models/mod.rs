pub mod alert;
pub mod balance;
pub mod portfolio;
pub mod token;

pub use alert::{AlertEvaluationResult, AlertKind, AlertRule};
pub use balance::{Asset, FetchFailure, RawBalance, RefreshOutcome, ValuedBalance};
pub use portfolio::{AddressRecord, Portfolio};
pub use token::TokenDescriptor;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::EngineError;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// A supported blockchain network. The set is closed: balances, token
/// registries and native-currency metadata are all keyed off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Polygon,
    Bsc,
    Arbitrum,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Ethereum,
        Network::Polygon,
        Network::Bsc,
        Network::Arbitrum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Polygon => "polygon",
            Network::Bsc => "bsc",
            Network::Arbitrum => "arbitrum",
        }
    }

    /// Symbol of the chain's base currency.
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Network::Ethereum => "ETH",
            Network::Polygon => "MATIC",
            Network::Bsc => "BNB",
            Network::Arbitrum => "ETH",
        }
    }

    pub fn native_name(&self) -> &'static str {
        match self {
            Network::Ethereum => "Ethereum",
            Network::Polygon => "Polygon",
            Network::Bsc => "Binance Smart Chain",
            Network::Arbitrum => "Arbitrum",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ethereum" => Ok(Network::Ethereum),
            "polygon" => Ok(Network::Polygon),
            "bsc" => Ok(Network::Bsc),
            "arbitrum" => Ok(Network::Arbitrum),
            other => Err(EngineError::UnknownNetwork(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_round_trip() {
        for net in Network::ALL {
            assert_eq!(Network::from_str(net.as_str()).unwrap(), net);
        }
    }

    #[test]
    fn test_network_case_insensitive() {
        assert_eq!(Network::from_str("Ethereum").unwrap(), Network::Ethereum);
        assert_eq!(Network::from_str("BSC").unwrap(), Network::Bsc);
    }

    #[test]
    fn test_unknown_network_rejected() {
        assert!(Network::from_str("solana").is_err());
    }
}
