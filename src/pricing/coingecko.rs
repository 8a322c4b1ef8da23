use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;

use super::{PriceError, PriceOracle};

const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko ids for the symbols the token registry can produce.
fn coin_id(symbol: &str) -> Option<&'static str> {
    match symbol.to_uppercase().as_str() {
        "ETH" => Some("ethereum"),
        "WETH" => Some("weth"),
        "MATIC" => Some("matic-network"),
        "WMATIC" => Some("wmatic"),
        "BNB" => Some("binancecoin"),
        "USDT" => Some("tether"),
        "USDC" => Some("usd-coin"),
        "DAI" => Some("dai"),
        _ => None,
    }
}

/// Live USD price feed backed by the CoinGecko simple-price endpoint.
#[derive(Debug, Clone)]
pub struct CoinGeckoOracle {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoOracle {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: COINGECKO_API_BASE.into(),
            api_key,
        }
    }
}

#[async_trait]
impl PriceOracle for CoinGeckoOracle {
    async fn price_of(&self, symbol: &str) -> Result<Decimal, PriceError> {
        let id = coin_id(symbol).ok_or_else(|| PriceError::Unavailable(symbol.to_string()))?;

        let url = format!("{}/simple/price", self.base_url);
        let mut req = self
            .http
            .get(&url)
            .query(&[("ids", id), ("vs_currencies", "usd")]);
        if let Some(key) = &self.api_key {
            req = req.header("x-cg-demo-api-key", key);
        }

        let quotes: HashMap<String, HashMap<String, Decimal>> =
            req.send().await?.error_for_status()?.json().await?;

        quotes
            .get(id)
            .and_then(|by_currency| by_currency.get("usd"))
            .copied()
            .ok_or_else(|| PriceError::Unavailable(symbol.to_string()))
    }
}
