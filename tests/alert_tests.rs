mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use chainfolio::alerts::{AlertConditions, AlertEngine, AlertRules, RenotifyPolicy, RuleUpdate};
use chainfolio::chain::BalanceFetcher;
use chainfolio::errors::EngineError;
use chainfolio::models::{AlertKind, Network};
use chainfolio::pricing::StaticPriceOracle;
use chainfolio::services::alert_checker::build_snapshot;
use chainfolio::store::{MemoryStore, RecordStore};

use common::{registry_with, MockRpc};

const WALLET_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const WALLET_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

fn rules_service() -> (Arc<MemoryStore>, AlertRules) {
    let store = Arc::new(MemoryStore::new());
    let rules = AlertRules::new(store.clone());
    (store, rules)
}

// ---------------------------------------------------------------------------
// Validation (required-field sets per kind)
// ---------------------------------------------------------------------------

#[test]
fn test_validate_price_rule_happy_path() {
    let parsed = AlertConditions::validate(
        AlertKind::Price,
        &json!({"token": "ETH", "operator": ">", "value": 100}),
    );
    assert!(parsed.is_ok());
}

#[test]
fn test_validate_price_rule_missing_operator() {
    let err = AlertConditions::validate(AlertKind::Price, &json!({"token": "ETH", "value": 100}))
        .unwrap_err();
    assert!(err.to_string().contains("required field missing: operator"));
}

#[test]
fn test_validate_balance_rule_bad_operator() {
    let err =
        AlertConditions::validate(AlertKind::Balance, &json!({"operator": "~="})).unwrap_err();
    assert!(err.to_string().contains("invalid operator"));
}

// ---------------------------------------------------------------------------
// Evaluation determinism
// ---------------------------------------------------------------------------

#[test]
fn test_evaluation_is_deterministic_for_a_snapshot() {
    use chainfolio::alerts::DataSnapshot;
    use chainfolio::models::AlertRule;
    use chrono::Utc;

    let engine = AlertEngine::new(RenotifyPolicy::EveryCycle);
    let mut snapshot = DataSnapshot::new();
    snapshot.set_price("ETH", Decimal::from(1_000));

    let rule = |operator: &str| {
        let now = Utc::now();
        AlertRule {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            kind: AlertKind::Price,
            name: "determinism".into(),
            conditions: json!({"token": "ETH", "operator": operator, "value": 500}),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    };

    assert!(engine.evaluate(&rule(">"), &snapshot).unwrap().triggered);
    assert!(!engine.evaluate(&rule("<"), &snapshot).unwrap().triggered);
}

// ---------------------------------------------------------------------------
// Rule CRUD against the store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_validates_before_persisting() {
    let (store, rules) = rules_service();
    let owner = Uuid::new_v4();

    let err = rules
        .create(owner, AlertKind::Price, "broken", json!({"token": "ETH"}))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    assert!(store.alerts_by_owner(owner).await.unwrap().is_empty());

    let rule = rules
        .create(
            owner,
            AlertKind::Price,
            "eth watch",
            json!({"token": "ETH", "operator": ">", "value": 2500}),
        )
        .await
        .unwrap();
    assert!(rule.is_active);
    assert_eq!(store.alerts_by_owner(owner).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_ownership_is_enforced() {
    let (_, rules) = rules_service();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let rule = rules
        .create(
            owner,
            AlertKind::Transaction,
            "watch",
            json!({"address": WALLET_A, "network": "ethereum"}),
        )
        .await
        .unwrap();

    let err = rules.get(stranger, rule.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = rules.delete(stranger, rule.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    assert!(rules.get(owner, rule.id).await.is_ok());
}

#[tokio::test]
async fn test_toggle_removes_rule_from_active_set() {
    let (store, rules) = rules_service();
    let owner = Uuid::new_v4();

    let rule = rules
        .create(
            owner,
            AlertKind::Price,
            "toggle me",
            json!({"token": "ETH", "operator": "<", "value": 1000}),
        )
        .await
        .unwrap();

    assert_eq!(store.active_alerts().await.unwrap().len(), 1);

    let toggled = rules.toggle(owner, rule.id).await.unwrap();
    assert!(!toggled.is_active);
    assert!(store.active_alerts().await.unwrap().is_empty());

    let toggled = rules.toggle(owner, rule.id).await.unwrap();
    assert!(toggled.is_active);
    assert_eq!(store.active_alerts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_revalidates_combination() {
    let (_, rules) = rules_service();
    let owner = Uuid::new_v4();

    let rule = rules
        .create(
            owner,
            AlertKind::Price,
            "eth watch",
            json!({"token": "ETH", "operator": ">", "value": 2500}),
        )
        .await
        .unwrap();

    // Changing the kind without supplying matching conditions must fail.
    let err = rules
        .update(
            owner,
            rule.id,
            RuleUpdate {
                kind: Some(AlertKind::Balance),
                ..RuleUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // Kind + conditions together is fine.
    let updated = rules
        .update(
            owner,
            rule.id,
            RuleUpdate {
                kind: Some(AlertKind::Balance),
                name: Some("low balance".into()),
                conditions: Some(json!({
                    "address": WALLET_A,
                    "network": "ethereum",
                    "operator": "<",
                    "value": 1,
                })),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.kind, AlertKind::Balance);
    assert_eq!(updated.name, "low balance");
}

// ---------------------------------------------------------------------------
// Snapshot building
// ---------------------------------------------------------------------------

fn snapshot_rules(owner: Uuid) -> Vec<chainfolio::models::AlertRule> {
    use chainfolio::models::AlertRule;
    use chrono::Utc;

    let now = Utc::now();
    let rule = |kind: AlertKind, conditions: serde_json::Value| AlertRule {
        id: Uuid::new_v4(),
        owner_id: owner,
        kind,
        name: format!("{kind} rule"),
        conditions,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    vec![
        rule(
            AlertKind::Price,
            json!({"token": "ETH", "operator": ">", "value": 500}),
        ),
        rule(
            AlertKind::Balance,
            json!({"address": WALLET_A, "network": "ethereum", "operator": ">", "value": 1}),
        ),
        rule(
            AlertKind::Transaction,
            json!({"address": WALLET_B, "network": "ethereum"}),
        ),
    ]
}

fn fetcher_with_balances(a_wei: u128, b_wei: u128) -> BalanceFetcher {
    let rpc = Arc::new(
        MockRpc::new()
            .with_native(WALLET_A, a_wei)
            .with_native(WALLET_B, b_wei),
    );
    BalanceFetcher::new(registry_with(vec![(Network::Ethereum, rpc)]))
}

#[tokio::test]
async fn test_snapshot_covers_rule_references() {
    let rules = snapshot_rules(Uuid::new_v4());
    let oracle = StaticPriceOracle::empty().with_price("ETH", Decimal::from(2_000));
    let fetcher = fetcher_with_balances(2_000_000_000_000_000_000, 1_000_000_000_000_000_000);
    let mut baseline = HashMap::new();

    let snapshot = build_snapshot(
        &rules,
        &fetcher,
        &oracle,
        Duration::from_secs(5),
        &mut baseline,
    )
    .await;

    assert_eq!(snapshot.price("ETH"), Some(Decimal::from(2_000)));
    assert_eq!(
        snapshot.balance(WALLET_A, Network::Ethereum),
        Some(Decimal::from(2))
    );
    // First observation only sets the activity baseline.
    assert!(!snapshot.activity(WALLET_B, Network::Ethereum));
}

#[tokio::test]
async fn test_transaction_presence_from_balance_delta() {
    let rules = snapshot_rules(Uuid::new_v4());
    let oracle = StaticPriceOracle::empty().with_price("ETH", Decimal::from(2_000));
    let mut baseline = HashMap::new();

    let first = fetcher_with_balances(2_000_000_000_000_000_000, 1_000_000_000_000_000_000);
    let snapshot = build_snapshot(
        &rules,
        &first,
        &oracle,
        Duration::from_secs(5),
        &mut baseline,
    )
    .await;
    assert!(!snapshot.activity(WALLET_B, Network::Ethereum));

    // Same balance next cycle: still no activity.
    let same = fetcher_with_balances(2_000_000_000_000_000_000, 1_000_000_000_000_000_000);
    let snapshot =
        build_snapshot(&rules, &same, &oracle, Duration::from_secs(5), &mut baseline).await;
    assert!(!snapshot.activity(WALLET_B, Network::Ethereum));

    // Balance moved: a transaction must have happened.
    let moved = fetcher_with_balances(2_000_000_000_000_000_000, 900_000_000_000_000_000);
    let snapshot = build_snapshot(
        &rules,
        &moved,
        &oracle,
        Duration::from_secs(5),
        &mut baseline,
    )
    .await;
    assert!(snapshot.activity(WALLET_B, Network::Ethereum));
}

#[tokio::test]
async fn test_snapshot_price_gap_leaves_rule_untriggered() {
    let rules = snapshot_rules(Uuid::new_v4());
    let oracle = StaticPriceOracle::empty(); // no quotes at all
    let fetcher = fetcher_with_balances(0, 0);
    let mut baseline = HashMap::new();

    let snapshot = build_snapshot(
        &rules,
        &fetcher,
        &oracle,
        Duration::from_secs(5),
        &mut baseline,
    )
    .await;

    let engine = AlertEngine::new(RenotifyPolicy::EveryCycle);
    let result = engine.evaluate(&rules[0], &snapshot).unwrap();
    assert!(!result.triggered);
    assert_eq!(result.observed, None);
}

// ---------------------------------------------------------------------------
// End-to-end: rule stored, snapshot built, evaluation delivered
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_stored_rule_triggers_against_live_snapshot() {
    let (store, rules) = rules_service();
    let owner = Uuid::new_v4();

    rules
        .create(
            owner,
            AlertKind::Balance,
            "whale moved in",
            json!({"address": WALLET_A, "network": "ethereum", "operator": ">=", "value": 5}),
        )
        .await
        .unwrap();

    let active = store.active_alerts().await.unwrap();
    let oracle = StaticPriceOracle::default();
    let fetcher = fetcher_with_balances(6_000_000_000_000_000_000, 0);
    let mut baseline = HashMap::new();

    let snapshot = build_snapshot(
        &active,
        &fetcher,
        &oracle,
        Duration::from_secs(5),
        &mut baseline,
    )
    .await;

    let engine = AlertEngine::new(RenotifyPolicy::EveryCycle);
    let result = engine.evaluate(&active[0], &snapshot).unwrap();

    assert!(result.triggered);
    assert_eq!(result.observed, Some(Decimal::from(6)));
    assert_eq!(result.target, Some(Decimal::from(5)));
    assert!(result.message.unwrap().contains("whale moved in"));
}
