use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use rust_decimal::Decimal;
use tokio::time::{sleep, timeout};

use crate::alerts::{AlertConditions, AlertEngine, DataSnapshot};
use crate::chain::BalanceFetcher;
use crate::models::{AlertRule, Network};
use crate::notify::NotificationSink;
use crate::pricing::PriceOracle;
use crate::store::RecordStore;
use crate::valuation;

/// Native balances are wei-denominated on every supported chain.
const NATIVE_DECIMALS: u8 = 18;

/// Periodically evaluate every active alert rule.
///
/// Each cycle builds one snapshot covering exactly the tokens and addresses
/// the active rules reference, then evaluates every rule against it.
/// Per-rule failures are logged and skipped; snapshot gaps (a dead network,
/// a missing price) leave the affected rules untriggered rather than failing
/// the cycle.
///
/// Transaction presence is detected by comparing each watched address's
/// native balance against the previous cycle's; a delta implies at least
/// one transaction. The first observation of an address only sets the
/// baseline.
pub async fn run_alert_checker(
    store: Arc<dyn RecordStore>,
    fetcher: Arc<BalanceFetcher>,
    oracle: Arc<dyn PriceOracle>,
    engine: Arc<AlertEngine>,
    sink: Arc<dyn NotificationSink>,
    interval_secs: u64,
    fetch_timeout: Duration,
) {
    tracing::info!(interval_secs, "Alert checker started");

    let mut last_native: HashMap<(String, Network), Decimal> = HashMap::new();
    let mut previously_active: HashSet<uuid::Uuid> = HashSet::new();

    loop {
        sleep(Duration::from_secs(interval_secs)).await;

        let rules = match store.active_alerts().await {
            Ok(rules) => rules,
            Err(e) => {
                tracing::error!(error = %e, "Alert checker: failed to load active rules");
                continue;
            }
        };

        gauge!("active_alert_rules").set(rules.len() as f64);

        // Rules that dropped out of the active set (deleted or toggled off)
        // lose their tracked trigger edge, so re-activation starts clean.
        let current: HashSet<uuid::Uuid> = rules.iter().map(|r| r.id).collect();
        for stale in previously_active.difference(&current) {
            engine.reset(*stale);
        }
        previously_active = current;

        if rules.is_empty() {
            continue;
        }

        let snapshot =
            build_snapshot(&rules, &fetcher, &*oracle, fetch_timeout, &mut last_native).await;

        let mut triggered = 0u32;
        for rule in &rules {
            counter!("alerts_evaluated_total").increment(1);

            match engine.evaluate(rule, &snapshot) {
                Ok(result) if result.triggered => {
                    counter!("alerts_triggered_total").increment(1);
                    triggered += 1;
                    sink.deliver(&result).await;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        rule_id = %rule.id,
                        error = %e,
                        "Alert evaluation failed — skipping rule"
                    );
                }
            }
        }

        if triggered > 0 {
            tracing::info!(
                triggered,
                rules = rules.len(),
                "Alert cycle complete: {} rule(s) triggered",
                triggered
            );
        }
    }
}

/// Gather the observed data the rule set needs, one fetch per distinct
/// token/address. Every fetch carries its own timeout so one stalled
/// provider costs a snapshot gap, not the cycle.
pub async fn build_snapshot(
    rules: &[AlertRule],
    fetcher: &BalanceFetcher,
    oracle: &dyn PriceOracle,
    fetch_timeout: Duration,
    last_native: &mut HashMap<(String, Network), Decimal>,
) -> DataSnapshot {
    let mut tokens: HashSet<String> = HashSet::new();
    let mut watched: HashSet<(String, Network)> = HashSet::new();
    let mut tx_watched: HashSet<(String, Network)> = HashSet::new();

    for rule in rules {
        let conditions = match AlertConditions::validate(rule.kind, &rule.conditions) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(rule_id = %rule.id, error = %e, "Stored rule failed validation");
                continue;
            }
        };

        match conditions {
            AlertConditions::Price { token, .. } => {
                tokens.insert(token.to_uppercase());
            }
            AlertConditions::Balance {
                address, network, ..
            } => {
                watched.insert((address, network));
            }
            AlertConditions::Transaction { address, network } => {
                watched.insert((address.clone(), network));
                tx_watched.insert((address, network));
            }
        }
    }

    let mut snapshot = DataSnapshot::new();

    for token in tokens {
        match timeout(fetch_timeout, oracle.price_of(&token)).await {
            Ok(Ok(price)) => snapshot.set_price(&token, price),
            Ok(Err(e)) => {
                counter!("price_lookup_failures_total").increment(1);
                tracing::debug!(token = %token, error = %e, "Snapshot price lookup failed");
            }
            Err(_) => {
                counter!("price_lookup_failures_total").increment(1);
                tracing::debug!(token = %token, "Snapshot price lookup timed out");
            }
        }
    }

    for (address, network) in watched {
        let raw = match timeout(fetch_timeout, fetcher.native_balance(&address, network)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::debug!(address = %address, network = %network, error = %e, "Snapshot balance fetch failed");
                continue;
            }
            Err(_) => {
                tracing::debug!(address = %address, network = %network, "Snapshot balance fetch timed out");
                continue;
            }
        };

        let amount = match valuation::scale(raw, NATIVE_DECIMALS) {
            Ok(amount) => amount,
            Err(e) => {
                tracing::warn!(address = %address, network = %network, error = %e, "Balance not representable");
                continue;
            }
        };

        snapshot.set_balance(&address, network, amount);

        if tx_watched.contains(&(address.clone(), network)) {
            let key = (address.to_lowercase(), network);
            let changed = match last_native.get(&key) {
                Some(previous) => *previous != amount,
                None => false,
            };
            last_native.insert(key, amount);
            snapshot.set_activity(&address, network, changed);
        }
    }

    snapshot
}
