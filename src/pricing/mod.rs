pub mod coingecko;
pub mod static_table;

pub use coingecko::CoinGeckoOracle;
pub use static_table::StaticPriceOracle;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("price unavailable for {0}")]
    Unavailable(String),

    #[error("price feed request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

/// A current unit price per token symbol, in USD. Pluggable: the engine only
/// sees this trait, so swapping the static bootstrap table for a live feed
/// changes nothing downstream.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn price_of(&self, symbol: &str) -> Result<Decimal, PriceError>;
}
