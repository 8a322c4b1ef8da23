use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::alerts::RenotifyPolicy;
use crate::models::Network;

const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:9090";

/// Which price feed backs the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFeed {
    /// Fixed bootstrap table; indicative prices only.
    Static,
    CoinGecko,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub metrics_addr: SocketAddr,

    /// RPC endpoint per network. A network without an endpoint is simply not
    /// served; partial configuration is normal.
    pub rpc_urls: HashMap<Network, String>,

    // Refresh / evaluation cadence
    pub refresh_interval_secs: u64,
    pub alert_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_concurrent_fetches: usize,
    pub liveness_ttl_secs: u64,

    // Pricing
    pub price_feed: PriceFeed,
    pub coingecko_api_key: Option<String>,

    // Alerting
    pub renotify_policy: RenotifyPolicy,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut rpc_urls = HashMap::new();
        for network in Network::ALL {
            let var = format!("{}_RPC_URL", network.as_str().to_uppercase());
            if let Ok(url) = env::var(&var) {
                if !url.is_empty() {
                    rpc_urls.insert(network, url);
                }
            }
        }

        let price_feed = match env::var("PRICE_FEED").as_deref() {
            Ok("coingecko") => PriceFeed::CoinGecko,
            _ => PriceFeed::Static,
        };

        let renotify_policy = env::var("ALERT_RENOTIFY_POLICY")
            .ok()
            .and_then(|s| RenotifyPolicy::from_str(&s).ok())
            .unwrap_or(RenotifyPolicy::EveryCycle);

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            metrics_addr: env::var("METRICS_ADDR")
                .unwrap_or_else(|_| DEFAULT_METRICS_ADDR.into())
                .parse()?,

            rpc_urls,

            refresh_interval_secs: env::var("REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".into())
                .parse()
                .unwrap_or(300),
            alert_interval_secs: env::var("ALERT_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .unwrap_or(60),
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            max_concurrent_fetches: env::var("MAX_CONCURRENT_FETCHES")
                .unwrap_or_else(|_| "4".into())
                .parse()
                .unwrap_or(4),
            liveness_ttl_secs: env::var("LIVENESS_TTL_SECS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .unwrap_or(5),

            price_feed,
            coingecko_api_key: env::var("COINGECKO_API_KEY").ok(),

            renotify_policy,
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").ok(),
        })
    }

    /// Returns true if both Telegram credentials are configured.
    pub fn has_telegram(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}
