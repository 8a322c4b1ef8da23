use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use uuid::Uuid;

use chainfolio::chain::{BalanceFetcher, ChainRpc, NetworkRegistry, RpcClientError};
use chainfolio::models::{AddressRecord, Network};
use chainfolio::portfolio::{AggregatorConfig, PortfolioAggregator};
use chainfolio::pricing::PriceOracle;

/// USDT on Ethereum — present in the static token registry with 6 decimals.
#[allow(dead_code)]
pub const USDT_ETHEREUM: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";

/// Programmable in-memory chain provider.
#[derive(Default)]
pub struct MockRpc {
    native: HashMap<Address, U256>,
    tokens: HashMap<(Address, Address), U256>,
    failing: HashSet<Address>,
    delay: Option<Duration>,
    calls: AtomicU64,
}

#[allow(dead_code)]
impl MockRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native(mut self, owner: &str, raw: u128) -> Self {
        self.native.insert(addr(owner), U256::from(raw));
        self
    }

    pub fn with_token(mut self, contract: &str, owner: &str, raw: u128) -> Self {
        self.tokens
            .insert((addr(contract), addr(owner)), U256::from(raw));
        self
    }

    /// Every call touching `owner` fails with a simulated provider error.
    pub fn failing_for(mut self, owner: &str) -> Self {
        self.failing.insert(addr(owner));
        self
    }

    /// Delay every RPC response; used to exercise per-unit timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of RPC calls served so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn serve(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn provider_error() -> RpcClientError {
        RpcClientError::Rpc {
            code: -32000,
            message: "simulated provider error".into(),
        }
    }
}

#[async_trait]
impl ChainRpc for MockRpc {
    async fn current_block_height(&self) -> Result<u64, RpcClientError> {
        self.serve().await;
        Ok(12_345_678)
    }

    async fn native_balance(&self, address: Address) -> Result<U256, RpcClientError> {
        self.serve().await;
        if self.failing.contains(&address) {
            return Err(Self::provider_error());
        }
        Ok(self.native.get(&address).copied().unwrap_or(U256::ZERO))
    }

    async fn call_read_only(
        &self,
        contract: Address,
        data: Bytes,
    ) -> Result<Bytes, RpcClientError> {
        self.serve().await;

        // balanceOf calldata: 4-byte selector + 32-byte padded owner
        let owner = Address::from_slice(&data[16..36]);
        if self.failing.contains(&owner) {
            return Err(Self::provider_error());
        }

        let amount = self
            .tokens
            .get(&(contract, owner))
            .copied()
            .unwrap_or(U256::ZERO);
        let word: [u8; 32] = amount.to_be_bytes();
        Ok(Bytes::from(word.to_vec()))
    }

    async fn suggested_gas_price(&self) -> Result<U256, RpcClientError> {
        self.serve().await;
        Ok(U256::from(30_000_000_000u64))
    }
}

pub fn addr(s: &str) -> Address {
    Address::from_str(s).expect("test address must parse")
}

/// Registry over mock handles; no probing, no network.
#[allow(dead_code)]
pub fn registry_with(handles: Vec<(Network, Arc<dyn ChainRpc>)>) -> Arc<NetworkRegistry> {
    Arc::new(NetworkRegistry::with_handles(
        handles.into_iter().collect(),
        Duration::from_secs(5),
    ))
}

#[allow(dead_code)]
pub fn record(address: &str, network: Network) -> AddressRecord {
    AddressRecord::new(Uuid::new_v4(), address, network, None)
}

#[allow(dead_code)]
pub fn aggregator_for(
    network: Network,
    rpc: Arc<dyn ChainRpc>,
    oracle: Arc<dyn PriceOracle>,
) -> PortfolioAggregator {
    let registry = registry_with(vec![(network, rpc)]);
    let fetcher = Arc::new(BalanceFetcher::new(registry));
    PortfolioAggregator::new(fetcher, oracle, AggregatorConfig::default())
}
