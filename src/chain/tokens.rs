use crate::models::{Network, TokenDescriptor};

/// Curated per-network token lists. Static by design: discovery is a
/// data-source concern behind this lookup, not a chain-scanning feature.
/// Decimals are the verified on-chain values; note USDT/USDC are 6 on
/// Ethereum and Polygon but 18 on BSC.
const ETHEREUM_TOKENS: &[(&str, &str, &str, u8)] = &[
    ("0xdAC17F958D2ee523a2206206994597C13D831ec7", "USDT", "Tether USD", 6),
    ("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "USDC", "USD Coin", 6),
    ("0x6B175474E89094C44Da98b954EedeAC495271d0F", "DAI", "Dai Stablecoin", 18),
    ("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", "WETH", "Wrapped Ether", 18),
];

const POLYGON_TOKENS: &[(&str, &str, &str, u8)] = &[
    ("0xc2132D05D31c914a87C6611C10748AEb04B58e8F", "USDT", "Tether USD", 6),
    ("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174", "USDC", "USD Coin", 6),
    ("0x8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063", "DAI", "Dai Stablecoin", 18),
    ("0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270", "WMATIC", "Wrapped MATIC", 18),
];

const BSC_TOKENS: &[(&str, &str, &str, u8)] = &[
    ("0x55d398326f99059fF775485246999027B3197955", "USDT", "Tether USD", 18),
    ("0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d", "USDC", "USD Coin", 18),
    ("0x1AF3F329e8BE154074D8769D1FFa4eE058B1DBc3", "DAI", "Dai Stablecoin", 18),
    ("0x2170Ed0880ac9A755fd29B2688956BD959F933F8", "WETH", "Wrapped Ether", 18),
];

/// Known tokens for a network, or `None` when the network has no token
/// registry (only its native balance can be tracked).
pub fn registry_for(network: Network) -> Option<Vec<TokenDescriptor>> {
    let entries = match network {
        Network::Ethereum => ETHEREUM_TOKENS,
        Network::Polygon => POLYGON_TOKENS,
        Network::Bsc => BSC_TOKENS,
        Network::Arbitrum => return None,
    };

    Some(
        entries
            .iter()
            .map(|&(address, symbol, name, decimals)| {
                TokenDescriptor::new(address, symbol, name, decimals)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stablecoin_decimals_differ_by_network() {
        let eth = registry_for(Network::Ethereum).unwrap();
        let bsc = registry_for(Network::Bsc).unwrap();

        let eth_usdt = eth.iter().find(|t| t.symbol == "USDT").unwrap();
        let bsc_usdt = bsc.iter().find(|t| t.symbol == "USDT").unwrap();

        assert_eq!(eth_usdt.decimals, 6);
        assert_eq!(bsc_usdt.decimals, 18);
    }

    #[test]
    fn test_arbitrum_has_no_token_registry() {
        assert!(registry_for(Network::Arbitrum).is_none());
    }

    #[test]
    fn test_registry_addresses_are_checksummed() {
        for network in [Network::Ethereum, Network::Polygon, Network::Bsc] {
            for token in registry_for(network).unwrap() {
                assert!(
                    crate::chain::address::validate(&token.contract_address).is_ok(),
                    "{} {} fails address validation",
                    network,
                    token.symbol
                );
            }
        }
    }
}
