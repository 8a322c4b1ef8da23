use std::sync::Arc;
use std::time::Duration;

use metrics::gauge;

use chainfolio::alerts::AlertEngine;
use chainfolio::chain::{BalanceFetcher, NetworkRegistry};
use chainfolio::config::{AppConfig, PriceFeed};
use chainfolio::notify::{LogSink, NotificationSink, TelegramNotifier};
use chainfolio::portfolio::{AggregatorConfig, PortfolioAggregator};
use chainfolio::pricing::{CoinGeckoOracle, PriceOracle, StaticPriceOracle};
use chainfolio::services::alert_checker::run_alert_checker;
use chainfolio::services::balance_refresher::run_balance_refresher;
use chainfolio::store::{pg, PgStore, RecordStore};
use chainfolio::metrics as app_metrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;

    app_metrics::init_metrics(config.metrics_addr)?;
    tracing::info!(addr = %config.metrics_addr, "Metrics exporter listening");

    tracing::info!("Connecting to database...");
    let pool = pg::init_pool(&config.database_url).await?;
    let store: Arc<dyn RecordStore> = Arc::new(PgStore::new(pool));
    tracing::info!("Database connected");

    // --- Network registry: partial availability is fine ---
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .build()?;

    let registry = Arc::new(
        NetworkRegistry::connect(
            &config.rpc_urls,
            http.clone(),
            Duration::from_secs(config.liveness_ttl_secs),
        )
        .await,
    );
    gauge!("connected_networks").set(registry.networks().len() as f64);

    if registry.networks().is_empty() {
        tracing::warn!("No RPC endpoints connected — refreshes will report failures only");
    }

    let fetcher = Arc::new(BalanceFetcher::new(Arc::clone(&registry)));

    // --- Price oracle ---
    let oracle: Arc<dyn PriceOracle> = match config.price_feed {
        PriceFeed::CoinGecko => {
            tracing::info!("Using CoinGecko price feed");
            Arc::new(CoinGeckoOracle::new(
                http.clone(),
                config.coingecko_api_key.clone(),
            ))
        }
        PriceFeed::Static => {
            tracing::warn!("Using static price table — prices are indicative only");
            Arc::new(StaticPriceOracle::default())
        }
    };

    // --- Aggregation service ---
    let aggregator = Arc::new(PortfolioAggregator::new(
        Arc::clone(&fetcher),
        Arc::clone(&oracle),
        AggregatorConfig {
            max_concurrent_per_network: config.max_concurrent_fetches,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        },
    ));

    {
        let store = Arc::clone(&store);
        let aggregator = Arc::clone(&aggregator);
        let interval = config.refresh_interval_secs;
        tokio::spawn(async move {
            run_balance_refresher(store, aggregator, interval).await;
        });
    }

    // --- Alert service ---
    let sink: Arc<dyn NotificationSink> = if config.has_telegram() {
        tracing::info!("Alert notifications via Telegram");
        Arc::new(TelegramNotifier::new(
            http.clone(),
            config.telegram_bot_token.clone().unwrap_or_default(),
            config.telegram_chat_id.clone().unwrap_or_default(),
        ))
    } else {
        tracing::info!("Alert notifications via log only");
        Arc::new(LogSink)
    };

    let engine = Arc::new(AlertEngine::new(config.renotify_policy));

    {
        let store = Arc::clone(&store);
        let fetcher = Arc::clone(&fetcher);
        let oracle = Arc::clone(&oracle);
        let interval = config.alert_interval_secs;
        let fetch_timeout = Duration::from_secs(config.fetch_timeout_secs);
        tokio::spawn(async move {
            run_alert_checker(store, fetcher, oracle, engine, sink, interval, fetch_timeout)
                .await;
        });
    }

    tracing::info!("chainfolio running — ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
