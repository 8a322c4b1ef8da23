use std::str::FromStr;

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::{AddressRecord, AlertKind, AlertRule, Network, Portfolio, ValuedBalance};

use super::RecordStore;

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Postgres-backed record store. Every operation is a single-row statement;
/// upserts are `ON CONFLICT ... DO UPDATE` keyed by the entity id.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Row types isolate the SQL column mapping from the domain models: `network`
// and `kind` travel as TEXT, raw amounts as decimal strings, conditions as
// serialized JSON.

#[derive(FromRow)]
struct AddressRow {
    id: Uuid,
    portfolio_id: Uuid,
    address: String,
    network: String,
    label: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for AddressRecord {
    type Error = EngineError;

    fn try_from(row: AddressRow) -> Result<Self, Self::Error> {
        Ok(AddressRecord {
            id: row.id,
            portfolio_id: row.portfolio_id,
            address: row.address,
            network: Network::from_str(&row.network)?,
            label: row.label,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct BalanceRow {
    address_id: Uuid,
    network: String,
    /// Empty string marks the native currency; NULLs are distinct under
    /// Postgres unique constraints and would defeat the upsert key.
    token_address: String,
    symbol: String,
    name: String,
    decimals: i16,
    raw_amount: String,
    amount: Decimal,
    price: Option<Decimal>,
    value: Option<Decimal>,
    fetched_at: DateTime<Utc>,
}

impl TryFrom<BalanceRow> for ValuedBalance {
    type Error = EngineError;

    fn try_from(row: BalanceRow) -> Result<Self, Self::Error> {
        let raw_amount = U256::from_str(&row.raw_amount)
            .map_err(|_| EngineError::Store(format!("bad raw amount: {}", row.raw_amount)))?;

        Ok(ValuedBalance {
            address_id: row.address_id,
            network: Network::from_str(&row.network)?,
            token_address: (!row.token_address.is_empty()).then_some(row.token_address),
            symbol: row.symbol,
            name: row.name,
            decimals: row.decimals as u8,
            raw_amount,
            amount: row.amount,
            price: row.price,
            value: row.value,
            fetched_at: row.fetched_at,
        })
    }
}

#[derive(FromRow)]
struct AlertRow {
    id: Uuid,
    owner_id: Uuid,
    kind: String,
    name: String,
    conditions: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AlertRow> for AlertRule {
    type Error = EngineError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let conditions = serde_json::from_str(&row.conditions)
            .map_err(|e| EngineError::Store(format!("bad conditions payload: {e}")))?;

        Ok(AlertRule {
            id: row.id,
            owner_id: row.owner_id,
            kind: AlertKind::from_str(&row.kind)?,
            name: row.name,
            conditions,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct PortfolioRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PortfolioRow> for Portfolio {
    fn from(row: PortfolioRow) -> Self {
        Portfolio {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn upsert_portfolio(&self, portfolio: &Portfolio) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO portfolios (id, owner_id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET name = $3, updated_at = $5
            "#,
        )
        .bind(portfolio.id)
        .bind(portfolio.owner_id)
        .bind(&portfolio.name)
        .bind(portfolio.created_at)
        .bind(portfolio.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn portfolio_by_id(&self, id: Uuid) -> Result<Option<Portfolio>, EngineError> {
        let row = sqlx::query_as::<_, PortfolioRow>("SELECT * FROM portfolios WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Portfolio::from))
    }

    async fn portfolios_by_owner(&self, owner_id: Uuid) -> Result<Vec<Portfolio>, EngineError> {
        let rows = sqlx::query_as::<_, PortfolioRow>(
            "SELECT * FROM portfolios WHERE owner_id = $1 ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Portfolio::from).collect())
    }

    async fn all_portfolios(&self) -> Result<Vec<Portfolio>, EngineError> {
        let rows =
            sqlx::query_as::<_, PortfolioRow>("SELECT * FROM portfolios ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Portfolio::from).collect())
    }

    async fn delete_portfolio(&self, id: Uuid) -> Result<(), EngineError> {
        sqlx::query(
            "DELETE FROM balances WHERE address_id IN (SELECT id FROM addresses WHERE portfolio_id = $1)",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        sqlx::query("DELETE FROM addresses WHERE portfolio_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        sqlx::query("DELETE FROM portfolios WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn upsert_address(&self, record: &AddressRecord) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO addresses (id, portfolio_id, address, network, label, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET label = $5, updated_at = $7
            "#,
        )
        .bind(record.id)
        .bind(record.portfolio_id)
        .bind(&record.address)
        .bind(record.network.as_str())
        .bind(&record.label)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn addresses_by_portfolio(
        &self,
        portfolio_id: Uuid,
    ) -> Result<Vec<AddressRecord>, EngineError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            "SELECT * FROM addresses WHERE portfolio_id = $1 ORDER BY created_at",
        )
        .bind(portfolio_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AddressRecord::try_from).collect()
    }

    async fn delete_address(&self, id: Uuid) -> Result<(), EngineError> {
        sqlx::query("DELETE FROM balances WHERE address_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn upsert_balance(&self, balance: &ValuedBalance) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO balances
                (address_id, network, token_address, symbol, name, decimals,
                 raw_amount, amount, price, value, fetched_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (address_id, token_address) DO UPDATE
                SET raw_amount = $7, amount = $8, price = $9, value = $10, fetched_at = $11
            "#,
        )
        .bind(balance.address_id)
        .bind(balance.network.as_str())
        .bind(balance.token_address.as_deref().unwrap_or(""))
        .bind(&balance.symbol)
        .bind(&balance.name)
        .bind(balance.decimals as i16)
        .bind(balance.raw_amount.to_string())
        .bind(balance.amount)
        .bind(balance.price)
        .bind(balance.value)
        .bind(balance.fetched_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn balances_by_portfolio(
        &self,
        portfolio_id: Uuid,
    ) -> Result<Vec<ValuedBalance>, EngineError> {
        let rows = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT * FROM balances
            WHERE address_id IN (SELECT id FROM addresses WHERE portfolio_id = $1)
            ORDER BY address_id, token_address
            "#,
        )
        .bind(portfolio_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ValuedBalance::try_from).collect()
    }

    async fn upsert_alert(&self, rule: &AlertRule) -> Result<(), EngineError> {
        let conditions = serde_json::to_string(&rule.conditions)
            .map_err(|e| EngineError::Store(format!("conditions not serializable: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO alerts (id, owner_id, kind, name, conditions, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
                SET kind = $3, name = $4, conditions = $5, is_active = $6, updated_at = $8
            "#,
        )
        .bind(rule.id)
        .bind(rule.owner_id)
        .bind(rule.kind.as_str())
        .bind(&rule.name)
        .bind(conditions)
        .bind(rule.is_active)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn alert_by_id(&self, id: Uuid) -> Result<Option<AlertRule>, EngineError> {
        let row = sqlx::query_as::<_, AlertRow>("SELECT * FROM alerts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(AlertRule::try_from).transpose()
    }

    async fn alerts_by_owner(&self, owner_id: Uuid) -> Result<Vec<AlertRule>, EngineError> {
        let rows = sqlx::query_as::<_, AlertRow>(
            "SELECT * FROM alerts WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AlertRule::try_from).collect()
    }

    async fn active_alerts(&self) -> Result<Vec<AlertRule>, EngineError> {
        let rows = sqlx::query_as::<_, AlertRow>(
            "SELECT * FROM alerts WHERE is_active = true ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AlertRule::try_from).collect()
    }

    async fn delete_alert(&self, id: Uuid) -> Result<(), EngineError> {
        sqlx::query("DELETE FROM alerts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
