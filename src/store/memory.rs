use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::{AddressRecord, AlertRule, Portfolio, ValuedBalance};

use super::RecordStore;

#[derive(Default)]
struct Inner {
    portfolios: HashMap<Uuid, Portfolio>,
    addresses: HashMap<Uuid, AddressRecord>,
    balances: HashMap<(Uuid, Option<String>), ValuedBalance>,
    alerts: HashMap<Uuid, AlertRule>,
}

/// In-process store. The hermetic backing for tests, and a usable default
/// when running without a database.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn upsert_portfolio(&self, portfolio: &Portfolio) -> Result<(), EngineError> {
        self.inner
            .write()
            .await
            .portfolios
            .insert(portfolio.id, portfolio.clone());
        Ok(())
    }

    async fn portfolio_by_id(&self, id: Uuid) -> Result<Option<Portfolio>, EngineError> {
        Ok(self.inner.read().await.portfolios.get(&id).cloned())
    }

    async fn portfolios_by_owner(&self, owner_id: Uuid) -> Result<Vec<Portfolio>, EngineError> {
        let inner = self.inner.read().await;
        let mut out: Vec<Portfolio> = inner
            .portfolios
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        out.sort_by_key(|p| (p.created_at, p.id));
        Ok(out)
    }

    async fn all_portfolios(&self) -> Result<Vec<Portfolio>, EngineError> {
        let inner = self.inner.read().await;
        let mut out: Vec<Portfolio> = inner.portfolios.values().cloned().collect();
        out.sort_by_key(|p| (p.created_at, p.id));
        Ok(out)
    }

    async fn delete_portfolio(&self, id: Uuid) -> Result<(), EngineError> {
        let mut inner = self.inner.write().await;
        inner.portfolios.remove(&id);

        let address_ids: Vec<Uuid> = inner
            .addresses
            .values()
            .filter(|a| a.portfolio_id == id)
            .map(|a| a.id)
            .collect();
        for address_id in address_ids {
            inner.addresses.remove(&address_id);
            inner.balances.retain(|(owner, _), _| *owner != address_id);
        }
        Ok(())
    }

    async fn upsert_address(&self, record: &AddressRecord) -> Result<(), EngineError> {
        self.inner
            .write()
            .await
            .addresses
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn addresses_by_portfolio(
        &self,
        portfolio_id: Uuid,
    ) -> Result<Vec<AddressRecord>, EngineError> {
        let inner = self.inner.read().await;
        let mut out: Vec<AddressRecord> = inner
            .addresses
            .values()
            .filter(|a| a.portfolio_id == portfolio_id)
            .cloned()
            .collect();
        out.sort_by_key(|a| (a.created_at, a.id));
        Ok(out)
    }

    async fn delete_address(&self, id: Uuid) -> Result<(), EngineError> {
        let mut inner = self.inner.write().await;
        inner.addresses.remove(&id);
        inner.balances.retain(|(owner, _), _| *owner != id);
        Ok(())
    }

    async fn upsert_balance(&self, balance: &ValuedBalance) -> Result<(), EngineError> {
        self.inner.write().await.balances.insert(
            (balance.address_id, balance.token_address.clone()),
            balance.clone(),
        );
        Ok(())
    }

    async fn balances_by_portfolio(
        &self,
        portfolio_id: Uuid,
    ) -> Result<Vec<ValuedBalance>, EngineError> {
        let inner = self.inner.read().await;
        let mut out: Vec<ValuedBalance> = inner
            .balances
            .values()
            .filter(|b| {
                inner
                    .addresses
                    .get(&b.address_id)
                    .is_some_and(|a| a.portfolio_id == portfolio_id)
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            (a.address_id, &a.token_address).cmp(&(b.address_id, &b.token_address))
        });
        Ok(out)
    }

    async fn upsert_alert(&self, rule: &AlertRule) -> Result<(), EngineError> {
        self.inner.write().await.alerts.insert(rule.id, rule.clone());
        Ok(())
    }

    async fn alert_by_id(&self, id: Uuid) -> Result<Option<AlertRule>, EngineError> {
        Ok(self.inner.read().await.alerts.get(&id).cloned())
    }

    async fn alerts_by_owner(&self, owner_id: Uuid) -> Result<Vec<AlertRule>, EngineError> {
        let inner = self.inner.read().await;
        let mut out: Vec<AlertRule> = inner
            .alerts
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| (r.created_at, r.id));
        Ok(out)
    }

    async fn active_alerts(&self) -> Result<Vec<AlertRule>, EngineError> {
        let inner = self.inner.read().await;
        let mut out: Vec<AlertRule> = inner
            .alerts
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect();
        out.sort_by_key(|r| (r.created_at, r.id));
        Ok(out)
    }

    async fn delete_alert(&self, id: Uuid) -> Result<(), EngineError> {
        self.inner.write().await.alerts.remove(&id);
        Ok(())
    }
}
