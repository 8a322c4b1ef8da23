use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::EngineError;
use crate::models::{AlertKind, Network};

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Eq => "==",
            Operator::Ne => "!=",
        }
    }

    /// Exact decimal comparison, zero tolerance. `==`/`!=` are therefore
    /// precision-sensitive: 1.0 and 1.00 compare equal, but a feed that
    /// quotes 999.999999 will not match a target of 1000.
    pub fn compare(&self, observed: Decimal, target: Decimal) -> bool {
        match self {
            Operator::Gt => observed > target,
            Operator::Lt => observed < target,
            Operator::Gte => observed >= target,
            Operator::Lte => observed <= target,
            Operator::Eq => observed == target,
            Operator::Ne => observed != target,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            ">=" => Ok(Operator::Gte),
            "<=" => Ok(Operator::Lte),
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            other => Err(EngineError::validation(format!(
                "invalid operator: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// AlertConditions
// ---------------------------------------------------------------------------

/// Typed condition payload, one variant per alert kind. Each kind has its own
/// required-field set; rules are stored as JSON and parsed through
/// [`AlertConditions::validate`] both before persisting and at evaluation
/// time, so an invalid combination can never reach the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AlertConditions {
    Price {
        token: String,
        operator: Operator,
        value: Decimal,
    },
    Balance {
        address: String,
        network: Network,
        operator: Operator,
        value: Decimal,
    },
    Transaction {
        address: String,
        network: Network,
    },
}

impl AlertConditions {
    pub fn kind(&self) -> AlertKind {
        match self {
            AlertConditions::Price { .. } => AlertKind::Price,
            AlertConditions::Balance { .. } => AlertKind::Balance,
            AlertConditions::Transaction { .. } => AlertKind::Transaction,
        }
    }

    /// Parse and validate a raw conditions object against the required-field
    /// set of `kind`:
    ///
    /// - `price`: token, operator, value
    /// - `balance`: address, network, operator, value
    /// - `transaction`: address, network
    pub fn validate(kind: AlertKind, conditions: &Value) -> Result<Self, EngineError> {
        let obj = conditions
            .as_object()
            .ok_or_else(|| EngineError::validation("conditions must be an object"))?;

        // An ill-formed operator is reported ahead of any missing-field
        // error, so the caller learns about the bad value first.
        if let Some(raw) = obj.get("operator") {
            let s = raw
                .as_str()
                .ok_or_else(|| EngineError::validation("field operator must be a string"))?;
            Operator::from_str(s)?;
        }

        match kind {
            AlertKind::Price => Ok(AlertConditions::Price {
                token: require_string(obj, "token")?,
                operator: require_operator(obj)?,
                value: require_decimal(obj, "value")?,
            }),
            AlertKind::Balance => Ok(AlertConditions::Balance {
                address: require_string(obj, "address")?,
                network: require_network(obj)?,
                operator: require_operator(obj)?,
                value: require_decimal(obj, "value")?,
            }),
            AlertKind::Transaction => Ok(AlertConditions::Transaction {
                address: require_string(obj, "address")?,
                network: require_network(obj)?,
            }),
        }
    }
}

fn require_field<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Value, EngineError> {
    obj.get(field)
        .ok_or_else(|| EngineError::validation(format!("required field missing: {field}")))
}

fn require_string(obj: &Map<String, Value>, field: &str) -> Result<String, EngineError> {
    require_field(obj, field)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| EngineError::validation(format!("field {field} must be a string")))
}

fn require_operator(obj: &Map<String, Value>) -> Result<Operator, EngineError> {
    let raw = require_field(obj, "operator")?;
    let s = raw
        .as_str()
        .ok_or_else(|| EngineError::validation("field operator must be a string"))?;
    Operator::from_str(s)
}

fn require_network(obj: &Map<String, Value>) -> Result<Network, EngineError> {
    let s = require_string(obj, "network")?;
    Network::from_str(&s)
}

/// Numeric targets are accepted as JSON numbers or numeric strings.
fn require_decimal(obj: &Map<String, Value>, field: &str) -> Result<Decimal, EngineError> {
    let raw = require_field(obj, field)?;
    match raw {
        Value::String(s) => Decimal::from_str(s)
            .map_err(|_| EngineError::validation(format!("field {field} must be numeric"))),
        other => serde_json::from_value::<Decimal>(other.clone())
            .map_err(|_| EngineError::validation(format!("field {field} must be numeric"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_price_conditions() {
        let parsed = AlertConditions::validate(
            AlertKind::Price,
            &json!({"token": "ETH", "operator": ">", "value": 100}),
        )
        .unwrap();

        assert_eq!(
            parsed,
            AlertConditions::Price {
                token: "ETH".into(),
                operator: Operator::Gt,
                value: Decimal::from(100),
            }
        );
    }

    #[test]
    fn test_missing_operator_is_field_error() {
        let err = AlertConditions::validate(
            AlertKind::Price,
            &json!({"token": "ETH", "value": 100}),
        )
        .unwrap_err();

        assert!(err.to_string().contains("required field missing: operator"));
    }

    #[test]
    fn test_unknown_operator_is_operator_error() {
        let err =
            AlertConditions::validate(AlertKind::Balance, &json!({"operator": "~="})).unwrap_err();

        assert!(err.to_string().contains("invalid operator: ~="));
    }

    #[test]
    fn test_balance_requires_address_and_network() {
        let err = AlertConditions::validate(
            AlertKind::Balance,
            &json!({"network": "ethereum", "operator": ">", "value": 1}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("required field missing: address"));

        let err = AlertConditions::validate(
            AlertKind::Balance,
            &json!({"address": "0xabc", "network": "solana", "operator": ">", "value": 1}),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::UnknownNetwork(_)));
    }

    #[test]
    fn test_transaction_needs_no_operator() {
        let parsed = AlertConditions::validate(
            AlertKind::Transaction,
            &json!({"address": "0xabc", "network": "polygon"}),
        )
        .unwrap();
        assert_eq!(parsed.kind(), AlertKind::Transaction);
    }

    #[test]
    fn test_numeric_value_accepted_as_string() {
        let parsed = AlertConditions::validate(
            AlertKind::Price,
            &json!({"token": "ETH", "operator": "<", "value": "1999.50"}),
        )
        .unwrap();

        match parsed {
            AlertConditions::Price { value, .. } => {
                assert_eq!(value, Decimal::new(199_950, 2));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_operator_compare() {
        let thousand = Decimal::from(1_000);
        let five_hundred = Decimal::from(500);

        assert!(Operator::Gt.compare(thousand, five_hundred));
        assert!(!Operator::Lt.compare(thousand, five_hundred));
        assert!(Operator::Ne.compare(thousand, five_hundred));
        assert!(Operator::Eq.compare(thousand, Decimal::new(1_000_0, 1)));
    }
}
