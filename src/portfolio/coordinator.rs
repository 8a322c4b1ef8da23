use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::{AddressRecord, RefreshOutcome};

use super::aggregator::PortfolioAggregator;

/// Serializes user-triggered refreshes per portfolio.
///
/// A newer request supersedes the in-flight one: the running task is aborted
/// (its partial results are discarded together, never merged) and the
/// completed outcome replaces the previous snapshot in one write
/// (last-writer-wins at the portfolio level).
#[derive(Default)]
pub struct RefreshCoordinator {
    tasks: Mutex<HashMap<Uuid, JoinHandle<()>>>,
    latest: Arc<RwLock<HashMap<Uuid, RefreshOutcome>>>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a refresh for the portfolio, cancelling any refresh already in
    /// flight for it.
    pub async fn trigger(
        &self,
        portfolio_id: Uuid,
        aggregator: Arc<PortfolioAggregator>,
        addresses: Vec<AddressRecord>,
    ) {
        let mut tasks = self.tasks.lock().await;

        if let Some(previous) = tasks.remove(&portfolio_id) {
            if !previous.is_finished() {
                previous.abort();
                tracing::debug!(%portfolio_id, "Superseded in-flight refresh");
            }
        }

        let latest = Arc::clone(&self.latest);
        let handle = tokio::spawn(async move {
            let outcome = aggregator.refresh_balances(&addresses).await;
            latest.write().await.insert(portfolio_id, outcome);
        });

        tasks.insert(portfolio_id, handle);
    }

    /// The most recently completed outcome for the portfolio, if any refresh
    /// has finished.
    pub async fn latest(&self, portfolio_id: Uuid) -> Option<RefreshOutcome> {
        self.latest.read().await.get(&portfolio_id).cloned()
    }

    /// Wait for the portfolio's current refresh to settle (complete or be
    /// aborted). Primarily for tests and orderly shutdown.
    pub async fn settle(&self, portfolio_id: Uuid) {
        let handle = self.tasks.lock().await.remove(&portfolio_id);
        if let Some(handle) = handle {
            // An aborted task returns a JoinError; both outcomes mean settled.
            let _ = handle.await;
        }
    }
}
