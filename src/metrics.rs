use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener and register all
/// application metrics.
pub fn init_metrics(listen: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(listen)
        .install()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("balances_refreshed_total").absolute(0);
    counter!("refresh_failures_total").absolute(0);
    counter!("price_lookup_failures_total").absolute(0);
    counter!("alerts_evaluated_total").absolute(0);
    counter!("alerts_triggered_total").absolute(0);

    // Pre-register gauges at zero.
    gauge!("connected_networks").set(0.0);
    gauge!("active_alert_rules").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("refresh_duration_seconds").record(0.0);

    Ok(())
}
