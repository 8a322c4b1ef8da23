pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::{AddressRecord, AlertRule, Portfolio, ValuedBalance};

/// Durable keyed record store.
///
/// The engine only ever issues single-entity operations: upserts keyed by
/// the entity id (balances by `(address_id, token_address)`), lookups by id
/// or owner, deletes by id. Every write is idempotent; no multi-record
/// transactions are required of an implementation. Deleting a portfolio
/// cascades to its addresses and their balances.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // --- portfolios ---
    async fn upsert_portfolio(&self, portfolio: &Portfolio) -> Result<(), EngineError>;
    async fn portfolio_by_id(&self, id: Uuid) -> Result<Option<Portfolio>, EngineError>;
    async fn portfolios_by_owner(&self, owner_id: Uuid) -> Result<Vec<Portfolio>, EngineError>;
    async fn all_portfolios(&self) -> Result<Vec<Portfolio>, EngineError>;
    async fn delete_portfolio(&self, id: Uuid) -> Result<(), EngineError>;

    // --- addresses ---
    async fn upsert_address(&self, record: &AddressRecord) -> Result<(), EngineError>;
    async fn addresses_by_portfolio(
        &self,
        portfolio_id: Uuid,
    ) -> Result<Vec<AddressRecord>, EngineError>;
    async fn delete_address(&self, id: Uuid) -> Result<(), EngineError>;

    // --- balances ---
    async fn upsert_balance(&self, balance: &ValuedBalance) -> Result<(), EngineError>;
    async fn balances_by_portfolio(
        &self,
        portfolio_id: Uuid,
    ) -> Result<Vec<ValuedBalance>, EngineError>;

    // --- alert rules ---
    async fn upsert_alert(&self, rule: &AlertRule) -> Result<(), EngineError>;
    async fn alert_by_id(&self, id: Uuid) -> Result<Option<AlertRule>, EngineError>;
    async fn alerts_by_owner(&self, owner_id: Uuid) -> Result<Vec<AlertRule>, EngineError>;
    async fn active_alerts(&self) -> Result<Vec<AlertRule>, EngineError>;
    async fn delete_alert(&self, id: Uuid) -> Result<(), EngineError>;
}
