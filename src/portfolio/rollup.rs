use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::ValuedBalance;
use crate::valuation;

/// How many assets the summary ranks.
pub const TOP_ASSETS: usize = 5;

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopAsset {
    pub symbol: String,
    pub name: String,
    pub network: String,
    pub amount: Decimal,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_value: Decimal,
    pub asset_count: usize,
    /// Assets that actually carry a valuation; unpriced holdings are counted
    /// in `asset_count` but not here.
    pub priced_asset_count: usize,
    pub network_count: usize,
    pub top_assets: Vec<TopAsset>,
}

/// Roll a balance set up into totals. Unpriced balances contribute zero to
/// the total but still count as held assets.
pub fn summarize(balances: &[ValuedBalance]) -> PortfolioSummary {
    let total_value: Decimal = balances.iter().filter_map(|b| b.value).sum();
    let priced_asset_count = balances.iter().filter(|b| b.value.is_some()).count();
    let networks: HashSet<_> = balances.iter().map(|b| b.network).collect();

    let mut ranked: Vec<&ValuedBalance> = balances.iter().collect();
    // Highest value first; ties broken by symbol so the ranking is stable
    // across refreshes.
    ranked.sort_by(|a, b| {
        let va = a.value.unwrap_or(Decimal::ZERO);
        let vb = b.value.unwrap_or(Decimal::ZERO);
        vb.cmp(&va).then_with(|| a.symbol.cmp(&b.symbol))
    });

    let top_assets = ranked
        .into_iter()
        .take(TOP_ASSETS)
        .map(|b| TopAsset {
            symbol: b.symbol.clone(),
            name: b.name.clone(),
            network: b.network.to_string(),
            amount: b.amount,
            value: valuation::display(b.value.unwrap_or(Decimal::ZERO)),
        })
        .collect();

    PortfolioSummary {
        total_value: valuation::display(total_value),
        asset_count: balances.len(),
        priced_asset_count,
        network_count: networks.len(),
        top_assets,
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub value: Decimal,
    /// Share of total portfolio value, 0–100. Exactly zero when the total
    /// is zero, never a division fault.
    pub percentage: Decimal,
    pub asset_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioAllocation {
    pub by_network: BTreeMap<String, AllocationSlice>,
    pub by_asset: BTreeMap<String, AllocationSlice>,
}

/// Group balances by network and by symbol, with each group's share of the
/// total. Unpriced balances are grouped with zero value.
pub fn allocate(balances: &[ValuedBalance]) -> PortfolioAllocation {
    let total: Decimal = balances.iter().filter_map(|b| b.value).sum();

    let mut by_network: BTreeMap<String, AllocationSlice> = BTreeMap::new();
    let mut by_asset: BTreeMap<String, AllocationSlice> = BTreeMap::new();

    for balance in balances {
        let value = balance.value.unwrap_or(Decimal::ZERO);

        let net = by_network.entry(balance.network.to_string()).or_default();
        net.value += value;
        net.asset_count += 1;

        let asset = by_asset.entry(balance.symbol.clone()).or_default();
        asset.value += value;
        asset.asset_count += 1;
    }

    for slice in by_network.values_mut().chain(by_asset.values_mut()) {
        slice.percentage = if total.is_zero() {
            Decimal::ZERO
        } else {
            slice.value / total * Decimal::ONE_HUNDRED
        };
    }

    PortfolioAllocation {
        by_network,
        by_asset,
    }
}

// ---------------------------------------------------------------------------
// Performance / history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Decimal,
    pub change: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPerformance {
    pub period: String,
    pub total_return: Decimal,
    pub best_day: Decimal,
    pub worst_day: Decimal,
    pub data: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioHistory {
    pub period: String,
    pub data: Vec<SeriesPoint>,
}

fn period_days(period: &str) -> i64 {
    match period {
        "7d" => 7,
        "90d" => 90,
        _ => 30,
    }
}

fn flat_series(balances: &[ValuedBalance], days: i64) -> Vec<SeriesPoint> {
    let current = summarize(balances).total_value;
    let today = Utc::now().date_naive();

    (0..days)
        .rev()
        .map(|offset| SeriesPoint {
            date: today - Duration::days(offset),
            value: current,
            change: Decimal::ZERO,
        })
        .collect()
}

/// Performance read model. Placeholder: without stored balance snapshots the
/// series is flat at the current total. TODO: derive from persisted refresh
/// history once the refresher has been retaining it.
pub fn performance(balances: &[ValuedBalance], period: &str) -> PortfolioPerformance {
    PortfolioPerformance {
        period: period.to_string(),
        total_return: Decimal::ZERO,
        best_day: Decimal::ZERO,
        worst_day: Decimal::ZERO,
        data: flat_series(balances, period_days(period)),
    }
}

/// History read model. Same placeholder series as [`performance`].
pub fn history(balances: &[ValuedBalance], period: &str) -> PortfolioHistory {
    PortfolioHistory {
        period: period.to_string(),
        data: flat_series(balances, period_days(period)),
    }
}
