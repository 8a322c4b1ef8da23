use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::portfolio::PortfolioAggregator;
use crate::store::RecordStore;

/// Periodically refresh every stored portfolio and persist the results.
///
/// Each portfolio's refresh is independent: a failing portfolio (or a
/// partially failing one) never blocks the others. Persisted balances are
/// single-record upserts keyed by (address_id, token_address), so a
/// re-refresh with identical chain state rewrites identical rows.
pub async fn run_balance_refresher(
    store: Arc<dyn RecordStore>,
    aggregator: Arc<PortfolioAggregator>,
    interval_secs: u64,
) {
    tracing::info!(interval_secs, "Balance refresher started");

    loop {
        sleep(Duration::from_secs(interval_secs)).await;

        let portfolios = match store.all_portfolios().await {
            Ok(portfolios) => portfolios,
            Err(e) => {
                tracing::error!(error = %e, "Balance refresher: failed to load portfolios");
                continue;
            }
        };

        for portfolio in &portfolios {
            let addresses = match store.addresses_by_portfolio(portfolio.id).await {
                Ok(addresses) => addresses,
                Err(e) => {
                    tracing::error!(
                        portfolio_id = %portfolio.id,
                        error = %e,
                        "Balance refresher: failed to load addresses"
                    );
                    continue;
                }
            };

            if addresses.is_empty() {
                continue;
            }

            let outcome = aggregator.refresh_balances(&addresses).await;

            for balance in &outcome.balances {
                if let Err(e) = store.upsert_balance(balance).await {
                    tracing::error!(
                        address_id = %balance.address_id,
                        symbol = %balance.symbol,
                        error = %e,
                        "Failed to persist balance"
                    );
                }
            }

            if !outcome.failures.is_empty() {
                tracing::warn!(
                    portfolio_id = %portfolio.id,
                    failures = outcome.failures.len(),
                    "Portfolio refresh completed with partial failures"
                );
            }
        }
    }
}
