use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{PriceError, PriceOracle};

/// Fixed price table for bootstrapping and tests. Not a market feed; the
/// values are indicative only.
#[derive(Debug, Clone)]
pub struct StaticPriceOracle {
    prices: HashMap<String, Decimal>,
}

impl Default for StaticPriceOracle {
    fn default() -> Self {
        let mut prices = HashMap::new();
        prices.insert("USDT".into(), Decimal::ONE);
        prices.insert("USDC".into(), Decimal::ONE);
        prices.insert("DAI".into(), Decimal::ONE);
        prices.insert("ETH".into(), Decimal::from(2_000));
        prices.insert("WETH".into(), Decimal::from(2_000));
        prices.insert("MATIC".into(), Decimal::new(80, 2)); // 0.80
        prices.insert("WMATIC".into(), Decimal::new(80, 2));
        prices.insert("BNB".into(), Decimal::from(300));
        Self { prices }
    }
}

impl StaticPriceOracle {
    pub fn empty() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    pub fn with_price(mut self, symbol: impl Into<String>, price: Decimal) -> Self {
        self.prices.insert(symbol.into().to_uppercase(), price);
        self
    }
}

#[async_trait]
impl PriceOracle for StaticPriceOracle {
    async fn price_of(&self, symbol: &str) -> Result<Decimal, PriceError> {
        self.prices
            .get(&symbol.to_uppercase())
            .copied()
            .ok_or_else(|| PriceError::Unavailable(symbol.to_string()))
    }
}
