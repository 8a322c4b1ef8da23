use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::EngineError;

// ---------------------------------------------------------------------------
// AlertKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Price,
    Balance,
    Transaction,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Price => "price",
            AlertKind::Balance => "balance",
            AlertKind::Transaction => "transaction",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(AlertKind::Price),
            "balance" => Ok(AlertKind::Balance),
            "transaction" => Ok(AlertKind::Transaction),
            other => Err(EngineError::validation(format!(
                "invalid alert kind: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// AlertRule
// ---------------------------------------------------------------------------

/// A stored threshold rule. `conditions` is kept as JSON and parsed into the
/// typed union (`alerts::AlertConditions`) on validation and evaluation; the
/// combination is always validated before a rule is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: AlertKind,
    pub name: String,
    pub conditions: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// AlertEvaluationResult
// ---------------------------------------------------------------------------

/// Outcome of evaluating one rule against one snapshot. Ephemeral: exists
/// only to be handed to the notification sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvaluationResult {
    pub rule_id: Uuid,
    pub rule_name: String,
    pub kind: AlertKind,
    pub triggered: bool,
    pub message: Option<String>,
    pub observed: Option<Decimal>,
    pub target: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}
