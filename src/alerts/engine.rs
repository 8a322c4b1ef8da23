use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::{AlertEvaluationResult, AlertRule, Network};
use crate::valuation;

use super::conditions::AlertConditions;

// ---------------------------------------------------------------------------
// DataSnapshot
// ---------------------------------------------------------------------------

/// Observed data for one evaluation cycle. Every rule in the cycle is
/// evaluated against the same snapshot, so two rules watching the same token
/// can never disagree about what the price was.
#[derive(Debug, Clone)]
pub struct DataSnapshot {
    prices: HashMap<String, Decimal>,
    balances: HashMap<(String, Network), Decimal>,
    activity: HashMap<(String, Network), bool>,
    pub taken_at: DateTime<Utc>,
}

impl Default for DataSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSnapshot {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            balances: HashMap::new(),
            activity: HashMap::new(),
            taken_at: Utc::now(),
        }
    }

    pub fn set_price(&mut self, symbol: &str, price: Decimal) {
        self.prices.insert(symbol.to_uppercase(), price);
    }

    pub fn price(&self, symbol: &str) -> Option<Decimal> {
        self.prices.get(&symbol.to_uppercase()).copied()
    }

    pub fn set_balance(&mut self, address: &str, network: Network, amount: Decimal) {
        self.balances
            .insert((address.to_lowercase(), network), amount);
    }

    pub fn balance(&self, address: &str, network: Network) -> Option<Decimal> {
        self.balances
            .get(&(address.to_lowercase(), network))
            .copied()
    }

    pub fn set_activity(&mut self, address: &str, network: Network, seen: bool) {
        self.activity
            .insert((address.to_lowercase(), network), seen);
    }

    pub fn activity(&self, address: &str, network: Network) -> bool {
        self.activity
            .get(&(address.to_lowercase(), network))
            .copied()
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// RenotifyPolicy
// ---------------------------------------------------------------------------

/// What happens when a rule's condition holds across consecutive cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenotifyPolicy {
    /// Notify on every cycle while the condition holds.
    EveryCycle,
    /// Notify only on the false→true edge; holding conditions stay quiet
    /// until they clear and trigger again.
    OnTransition,
}

impl FromStr for RenotifyPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "every_cycle" => Ok(RenotifyPolicy::EveryCycle),
            "on_transition" => Ok(RenotifyPolicy::OnTransition),
            other => Err(EngineError::validation(format!(
                "invalid renotify policy: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// AlertEngine
// ---------------------------------------------------------------------------

/// Evaluates alert rules against data snapshots.
///
/// Evaluation itself is stateless per cycle; the only state the engine keeps
/// is the previous trigger flag per rule, used by
/// [`RenotifyPolicy::OnTransition`]. That state is in-process only; a
/// restart re-arms every rule.
pub struct AlertEngine {
    policy: RenotifyPolicy,
    last_triggered: Mutex<HashMap<Uuid, bool>>,
}

impl AlertEngine {
    pub fn new(policy: RenotifyPolicy) -> Self {
        Self {
            policy,
            last_triggered: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluate one rule against the snapshot.
    ///
    /// `triggered` in the result means "notify this cycle under the
    /// configured policy". An observed value missing from the snapshot is a
    /// data gap and never triggers. Inactive rules are rejected rather than
    /// silently evaluated.
    pub fn evaluate(
        &self,
        rule: &AlertRule,
        snapshot: &DataSnapshot,
    ) -> Result<AlertEvaluationResult, EngineError> {
        if !rule.is_active {
            return Err(EngineError::validation(format!(
                "rule {} is inactive",
                rule.id
            )));
        }

        let conditions = AlertConditions::validate(rule.kind, &rule.conditions)?;

        let (satisfied, message, observed, target) = match &conditions {
            AlertConditions::Price {
                token,
                operator,
                value,
            } => match snapshot.price(token) {
                Some(price) => {
                    let hit = operator.compare(price, *value);
                    let message = hit.then(|| {
                        format!(
                            "{}: {} price {} is {} {}",
                            rule.name,
                            token.to_uppercase(),
                            valuation::display(price),
                            operator,
                            value,
                        )
                    });
                    (hit, message, Some(price), Some(*value))
                }
                None => (false, None, None, Some(*value)),
            },

            AlertConditions::Balance {
                address,
                network,
                operator,
                value,
            } => match snapshot.balance(address, *network) {
                Some(balance) => {
                    let hit = operator.compare(balance, *value);
                    let message = hit.then(|| {
                        format!(
                            "{}: balance of {} on {} is {} ({} {})",
                            rule.name,
                            address,
                            network,
                            valuation::display(balance),
                            operator,
                            value,
                        )
                    });
                    (hit, message, Some(balance), Some(*value))
                }
                None => (false, None, None, Some(*value)),
            },

            AlertConditions::Transaction { address, network } => {
                let seen = snapshot.activity(address, *network);
                let message = seen.then(|| {
                    format!(
                        "{}: new transaction activity for {} on {}",
                        rule.name, address, network,
                    )
                });
                (seen, message, None, None)
            }
        };

        let triggered = self.apply_policy(rule.id, satisfied);

        Ok(AlertEvaluationResult {
            rule_id: rule.id,
            rule_name: rule.name.clone(),
            kind: rule.kind,
            triggered,
            message: if triggered { message } else { None },
            observed,
            target,
            timestamp: snapshot.taken_at,
        })
    }

    fn apply_policy(&self, rule_id: Uuid, satisfied: bool) -> bool {
        match self.policy {
            RenotifyPolicy::EveryCycle => satisfied,
            RenotifyPolicy::OnTransition => {
                let mut last = self
                    .last_triggered
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let previous = last.insert(rule_id, satisfied).unwrap_or(false);
                satisfied && !previous
            }
        }
    }

    /// Forget tracked trigger state for a rule (deleted or toggled off), so
    /// re-activation starts from a clean edge.
    pub fn reset(&self, rule_id: Uuid) {
        self.last_triggered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&rule_id);
    }
}
