use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::{AlertKind, AlertRule};
use crate::store::RecordStore;

use super::conditions::AlertConditions;

/// Partial update for an alert rule; absent fields keep their current value.
#[derive(Debug, Default, Clone)]
pub struct RuleUpdate {
    pub kind: Option<AlertKind>,
    pub name: Option<String>,
    pub conditions: Option<serde_json::Value>,
}

/// Owner-scoped alert rule management. Conditions are validated against the
/// rule's kind before anything is persisted, so the store never holds a rule
/// the engine cannot evaluate.
pub struct AlertRules {
    store: Arc<dyn RecordStore>,
}

impl AlertRules {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        kind: AlertKind,
        name: impl Into<String>,
        conditions: serde_json::Value,
    ) -> Result<AlertRule, EngineError> {
        AlertConditions::validate(kind, &conditions)?;

        let now = Utc::now();
        let rule = AlertRule {
            id: Uuid::new_v4(),
            owner_id,
            kind,
            name: name.into(),
            conditions,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.store.upsert_alert(&rule).await?;
        tracing::info!(rule_id = %rule.id, kind = %rule.kind, "Alert rule created");

        Ok(rule)
    }

    /// Fetch a rule, enforcing ownership. A rule belonging to someone else is
    /// indistinguishable from a missing one.
    pub async fn get(&self, owner_id: Uuid, rule_id: Uuid) -> Result<AlertRule, EngineError> {
        match self.store.alert_by_id(rule_id).await? {
            Some(rule) if rule.owner_id == owner_id => Ok(rule),
            _ => Err(EngineError::not_found(format!("alert rule {rule_id}"))),
        }
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<AlertRule>, EngineError> {
        self.store.alerts_by_owner(owner_id).await
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        rule_id: Uuid,
        update: RuleUpdate,
    ) -> Result<AlertRule, EngineError> {
        let mut rule = self.get(owner_id, rule_id).await?;

        if let Some(kind) = update.kind {
            rule.kind = kind;
        }
        if let Some(name) = update.name {
            rule.name = name;
        }
        if let Some(conditions) = update.conditions {
            rule.conditions = conditions;
        }

        // Re-validate the (possibly new) kind against the (possibly new)
        // conditions as a combination.
        AlertConditions::validate(rule.kind, &rule.conditions)?;

        rule.updated_at = Utc::now();
        self.store.upsert_alert(&rule).await?;

        Ok(rule)
    }

    pub async fn delete(&self, owner_id: Uuid, rule_id: Uuid) -> Result<(), EngineError> {
        self.get(owner_id, rule_id).await?;
        self.store.delete_alert(rule_id).await?;
        tracing::info!(rule_id = %rule_id, "Alert rule deleted");
        Ok(())
    }

    /// Flip the active flag. Inactive rules are never evaluated.
    pub async fn toggle(&self, owner_id: Uuid, rule_id: Uuid) -> Result<AlertRule, EngineError> {
        let mut rule = self.get(owner_id, rule_id).await?;
        rule.is_active = !rule.is_active;
        rule.updated_at = Utc::now();
        self.store.upsert_alert(&rule).await?;
        Ok(rule)
    }
}
