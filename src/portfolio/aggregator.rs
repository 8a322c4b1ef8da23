use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use metrics::{counter, histogram};
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::chain::BalanceFetcher;
use crate::errors::EngineError;
use crate::models::{
    AddressRecord, Asset, FetchFailure, Network, RefreshOutcome, ValuedBalance,
};
use crate::pricing::PriceOracle;
use crate::valuation;

/// Native balances are wei-denominated on every supported chain.
const NATIVE_DECIMALS: u8 = 18;

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Concurrent in-flight fetches allowed per network, bounded so one
    /// refresh cannot exhaust an RPC provider's rate limit.
    pub max_concurrent_per_network: usize,
    /// Hard deadline for one address's fetch; a stalled provider becomes a
    /// per-address failure instead of a hung refresh.
    pub fetch_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_per_network: 4,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Orchestrates balance fetching and valuation across a portfolio's
/// addresses, producing one [`RefreshOutcome`] per cycle.
pub struct PortfolioAggregator {
    fetcher: Arc<BalanceFetcher>,
    oracle: Arc<dyn PriceOracle>,
    config: AggregatorConfig,
    limits: HashMap<Network, Arc<Semaphore>>,
}

impl PortfolioAggregator {
    pub fn new(
        fetcher: Arc<BalanceFetcher>,
        oracle: Arc<dyn PriceOracle>,
        config: AggregatorConfig,
    ) -> Self {
        let limits = Network::ALL
            .iter()
            .map(|&n| {
                (
                    n,
                    Arc::new(Semaphore::new(config.max_concurrent_per_network)),
                )
            })
            .collect();

        Self {
            fetcher,
            oracle,
            config,
            limits,
        }
    }

    /// Refresh every address in the set. All amounts, prices and values in
    /// the outcome were fetched within this call; nothing is mixed in from
    /// a previous cycle's cache.
    ///
    /// Per-address failures are isolated: the rest of the refresh proceeds
    /// and each failure is reported in the outcome. A refresh where every
    /// address failed is still a valid, empty result.
    pub async fn refresh_balances(&self, addresses: &[AddressRecord]) -> RefreshOutcome {
        let started = std::time::Instant::now();
        let fetched_at = Utc::now();

        let fetches = stream::FuturesUnordered::new();
        for record in addresses {
            fetches.push(self.fetch_one(record, fetched_at));
        }
        let results: Vec<Result<Vec<ValuedBalance>, FetchFailure>> = fetches.collect().await;

        let mut outcome = RefreshOutcome::default();
        for result in results {
            match result {
                Ok(balances) => outcome.balances.extend(balances),
                Err(failure) => {
                    tracing::warn!(
                        address = %failure.address,
                        network = %failure.network,
                        reason = %failure.reason,
                        "Address fetch failed — continuing refresh"
                    );
                    outcome.failures.push(failure);
                }
            }
        }

        // Deterministic order regardless of fetch completion order.
        outcome
            .balances
            .sort_by(|a, b| (a.address_id, &a.token_address).cmp(&(b.address_id, &b.token_address)));

        counter!("balances_refreshed_total").increment(outcome.balances.len() as u64);
        counter!("refresh_failures_total").increment(outcome.failures.len() as u64);
        histogram!("refresh_duration_seconds").record(started.elapsed().as_secs_f64());

        tracing::debug!(
            addresses = addresses.len(),
            balances = outcome.balances.len(),
            failures = outcome.failures.len(),
            "Refresh cycle complete"
        );

        outcome
    }

    /// Fetch and value one address under its network's concurrency cap and
    /// the per-unit timeout.
    async fn fetch_one(
        &self,
        record: &AddressRecord,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<ValuedBalance>, FetchFailure> {
        let limiter = &self.limits[&record.network];
        let _permit = match limiter.acquire().await {
            Ok(p) => p,
            Err(_) => return Err(Self::failure(record, "fetch pool closed")),
        };

        match timeout(self.config.fetch_timeout, self.fetch_address(record, fetched_at)).await {
            Ok(Ok(balances)) => Ok(balances),
            Ok(Err(e)) => Err(Self::failure(record, &e.to_string())),
            Err(_) => Err(Self::failure(record, "fetch timed out")),
        }
    }

    async fn fetch_address(
        &self,
        record: &AddressRecord,
        fetched_at: DateTime<Utc>,
    ) -> Result<Vec<ValuedBalance>, EngineError> {
        let mut balances = Vec::new();

        let native = self
            .fetcher
            .native_balance(&record.address, record.network)
            .await?;
        if !native.is_zero() {
            let valued = self
                .value_balance(record, &Asset::Native, native, fetched_at)
                .await?;
            balances.push(valued);
        }

        match self.fetcher.token_balances(record).await {
            Ok(raws) => {
                for raw in raws {
                    let valued = self
                        .value_balance(record, &raw.asset, raw.amount, fetched_at)
                        .await?;
                    balances.push(valued);
                }
            }
            // Networks without a token registry still report their native
            // balance.
            Err(EngineError::UnsupportedNetwork(_)) => {}
            Err(e) => return Err(e),
        }

        Ok(balances)
    }

    /// Scale and price one raw balance. The (amount, price) pair is resolved
    /// here, atomically within the cycle. A failed price lookup keeps the
    /// balance and leaves it unpriced.
    async fn value_balance(
        &self,
        record: &AddressRecord,
        asset: &Asset,
        raw: alloy::primitives::U256,
        fetched_at: DateTime<Utc>,
    ) -> Result<ValuedBalance, EngineError> {
        let (symbol, name, decimals, token_address) = match asset {
            Asset::Native => (
                record.network.native_symbol().to_string(),
                record.network.native_name().to_string(),
                NATIVE_DECIMALS,
                None,
            ),
            Asset::Token(t) => (
                t.symbol.clone(),
                t.name.clone(),
                t.decimals,
                Some(t.contract_address.clone()),
            ),
        };

        let amount = valuation::scale(raw, decimals)?;

        let price = match self.oracle.price_of(&symbol).await {
            Ok(p) => Some(p),
            Err(e) => {
                counter!("price_lookup_failures_total").increment(1);
                tracing::debug!(
                    symbol = %symbol,
                    error = %e,
                    "Price lookup failed — keeping balance unpriced"
                );
                None
            }
        };

        let value = match price {
            Some(p) => Some(valuation::value(amount, p)?),
            None => None,
        };

        Ok(ValuedBalance {
            address_id: record.id,
            network: record.network,
            token_address,
            symbol,
            name,
            decimals,
            raw_amount: raw,
            amount,
            price,
            value,
            fetched_at,
        })
    }

    fn failure(record: &AddressRecord, reason: &str) -> FetchFailure {
        FetchFailure {
            address_id: record.id,
            address: record.address.clone(),
            network: record.network,
            reason: reason.to_string(),
        }
    }
}
