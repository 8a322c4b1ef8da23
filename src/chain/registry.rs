use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::U256;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::errors::EngineError;
use crate::models::Network;

use super::rpc::{ChainRpc, JsonRpcClient};

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// One connection handle per configured network, built once at startup and
/// shared read-only via `Arc`. Constructed explicitly and passed to whatever
/// needs it; there is no process-wide client map.
pub struct NetworkRegistry {
    handles: HashMap<Network, Arc<dyn ChainRpc>>,
    liveness_ttl: Duration,
    probe_timeout: Duration,
    probes: Mutex<HashMap<Network, (Instant, bool)>>,
}

impl NetworkRegistry {
    /// Dial every configured endpoint and probe it once. A failed connection
    /// is logged and the network omitted from the live set; partial network
    /// availability is a normal operating mode, never a startup failure.
    pub async fn connect(
        endpoints: &HashMap<Network, String>,
        http: reqwest::Client,
        liveness_ttl: Duration,
    ) -> Self {
        let mut handles: HashMap<Network, Arc<dyn ChainRpc>> = HashMap::new();

        for (&network, url) in endpoints {
            let client = JsonRpcClient::new(http.clone(), url.clone());
            match timeout(DEFAULT_PROBE_TIMEOUT, client.current_block_height()).await {
                Ok(Ok(height)) => {
                    tracing::info!(%network, height, "RPC endpoint connected");
                    handles.insert(network, Arc::new(client));
                }
                Ok(Err(e)) => {
                    tracing::warn!(%network, error = %e, "RPC endpoint unreachable — network excluded");
                }
                Err(_) => {
                    tracing::warn!(%network, "RPC endpoint probe timed out — network excluded");
                }
            }
        }

        tracing::info!(connected = handles.len(), "Network registry initialized");

        Self {
            handles,
            liveness_ttl,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            probes: Mutex::new(HashMap::new()),
        }
    }

    /// Build a registry from pre-constructed handles. Used by tests to plug
    /// in mock providers.
    pub fn with_handles(
        handles: HashMap<Network, Arc<dyn ChainRpc>>,
        liveness_ttl: Duration,
    ) -> Self {
        Self {
            handles,
            liveness_ttl,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            probes: Mutex::new(HashMap::new()),
        }
    }

    /// Networks with a connected handle.
    pub fn networks(&self) -> Vec<Network> {
        let mut nets: Vec<Network> = self.handles.keys().copied().collect();
        nets.sort_by_key(|n| n.as_str());
        nets
    }

    pub fn handle(&self, network: Network) -> Result<Arc<dyn ChainRpc>, EngineError> {
        self.handles
            .get(&network)
            .cloned()
            .ok_or_else(|| EngineError::UnknownNetwork(network.to_string()))
    }

    /// Probe the network with a block-height fetch. The result is cached no
    /// longer than `liveness_ttl`; a stale entry is always re-probed.
    pub async fn is_live(&self, network: Network) -> bool {
        let handle = match self.handles.get(&network) {
            Some(h) => h.clone(),
            None => return false,
        };

        {
            let probes = self.probes.lock().await;
            if let Some((at, live)) = probes.get(&network) {
                if at.elapsed() < self.liveness_ttl {
                    return *live;
                }
            }
        }

        let live = matches!(
            timeout(self.probe_timeout, handle.current_block_height()).await,
            Ok(Ok(_))
        );

        self.probes
            .lock()
            .await
            .insert(network, (Instant::now(), live));

        live
    }

    /// Current liveness of every connected network.
    pub async fn status(&self) -> HashMap<Network, bool> {
        let mut out = HashMap::new();
        for network in self.handles.keys().copied() {
            let live = self.is_live(network).await;
            out.insert(network, live);
        }
        out
    }

    /// Current suggested gas price for a network, in wei.
    pub async fn gas_price(&self, network: Network) -> Result<U256, EngineError> {
        let handle = self.handle(network)?;
        handle
            .suggested_gas_price()
            .await
            .map_err(|e| e.into_engine(network))
    }
}
