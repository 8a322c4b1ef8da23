use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::errors::EngineError;
use crate::models::Network;

#[derive(Debug, Error)]
pub enum RpcClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl RpcClientError {
    /// Classify into the engine taxonomy: a transport failure means the
    /// network is unreachable; everything else is an RPC-level failure on a
    /// reachable endpoint.
    pub fn into_engine(self, network: Network) -> EngineError {
        match self {
            RpcClientError::Http(e) => EngineError::NetworkUnavailable {
                network,
                reason: e.to_string(),
            },
            other => EngineError::Rpc {
                network,
                reason: other.to_string(),
            },
        }
    }
}

/// The four read-only operations the engine needs from a chain endpoint.
/// Any client implementing these is acceptable; tests use a programmable
/// mock, production uses [`JsonRpcClient`].
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn current_block_height(&self) -> Result<u64, RpcClientError>;

    async fn native_balance(&self, address: Address) -> Result<U256, RpcClientError>;

    async fn call_read_only(
        &self,
        contract: Address,
        data: Bytes,
    ) -> Result<Bytes, RpcClientError>;

    async fn suggested_gas_price(&self) -> Result<U256, RpcClientError>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Plain Ethereum JSON-RPC client over HTTP.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    http: Client,
    endpoint: String,
}

impl JsonRpcClient {
    pub fn new(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcClientError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let resp: RpcResponse = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = resp.error {
            return Err(RpcClientError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        resp.result
            .ok_or_else(|| RpcClientError::Unexpected(format!("{method}: missing result")))
    }

    fn quantity(value: &Value) -> Result<U256, RpcClientError> {
        let s = value
            .as_str()
            .ok_or_else(|| RpcClientError::Unexpected(format!("expected hex quantity, got {value}")))?;
        let digits = s.strip_prefix("0x").unwrap_or(s);
        U256::from_str_radix(digits, 16)
            .map_err(|_| RpcClientError::Unexpected(format!("bad hex quantity: {s}")))
    }
}

#[async_trait]
impl ChainRpc for JsonRpcClient {
    async fn current_block_height(&self) -> Result<u64, RpcClientError> {
        let result = self.request("eth_blockNumber", json!([])).await?;
        let height = Self::quantity(&result)?;
        u64::try_from(height)
            .map_err(|_| RpcClientError::Unexpected(format!("block height out of range: {height}")))
    }

    async fn native_balance(&self, address: Address) -> Result<U256, RpcClientError> {
        let result = self
            .request("eth_getBalance", json!([address, "latest"]))
            .await?;
        Self::quantity(&result)
    }

    async fn call_read_only(
        &self,
        contract: Address,
        data: Bytes,
    ) -> Result<Bytes, RpcClientError> {
        let result = self
            .request(
                "eth_call",
                json!([{ "to": contract, "data": data }, "latest"]),
            )
            .await?;
        let s = result
            .as_str()
            .ok_or_else(|| RpcClientError::Unexpected(format!("eth_call returned {result}")))?;
        Bytes::from_str(s).map_err(|_| RpcClientError::Unexpected(format!("bad call data: {s}")))
    }

    async fn suggested_gas_price(&self) -> Result<U256, RpcClientError> {
        let result = self.request("eth_gasPrice", json!([])).await?;
        Self::quantity(&result)
    }
}
