use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};

use crate::errors::EngineError;
use crate::models::{AddressRecord, Asset, Network, RawBalance};

use super::registry::NetworkRegistry;
use super::{address, tokens};

/// `balanceOf(address)`, the standard ERC-20 balance query selector.
const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// ABI-encode a `balanceOf(owner)` call: selector + owner left-padded to a
/// 32-byte word.
pub fn encode_balance_of(owner: Address) -> Bytes {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&BALANCE_OF_SELECTOR);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(owner.as_slice());
    Bytes::from(data)
}

/// Decode a returned word as a big-endian unsigned integer. An empty return
/// (some proxies respond with no data for unknown accounts) decodes to zero;
/// only the first word of a longer return is read.
pub fn decode_uint_word(data: &[u8]) -> U256 {
    if data.is_empty() {
        return U256::ZERO;
    }
    let word = if data.len() > 32 { &data[..32] } else { data };
    U256::from_be_slice(word)
}

/// Fetches native and known-token balances for addresses via the registry's
/// RPC handles.
pub struct BalanceFetcher {
    registry: Arc<NetworkRegistry>,
}

impl BalanceFetcher {
    pub fn new(registry: Arc<NetworkRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<NetworkRegistry> {
        &self.registry
    }

    /// Native-currency balance in wei. Address validation happens before any
    /// network call; malformed input never reaches RPC.
    pub async fn native_balance(
        &self,
        address: &str,
        network: Network,
    ) -> Result<U256, EngineError> {
        let owner = address::validate(address)?;
        let rpc = self.registry.handle(network)?;

        rpc.native_balance(owner)
            .await
            .map_err(|e| e.into_engine(network))
    }

    /// Balances for every token in the network's static registry, one
    /// read-only contract call per token. A failed call or an exact-zero
    /// result means "not held" and is skipped, not escalated.
    pub async fn token_balances(
        &self,
        record: &AddressRecord,
    ) -> Result<Vec<RawBalance>, EngineError> {
        let owner = address::validate(&record.address)?;
        let registry_tokens = tokens::registry_for(record.network)
            .ok_or(EngineError::UnsupportedNetwork(record.network))?;
        let rpc = self.registry.handle(record.network)?;

        let call = encode_balance_of(owner);
        let mut held = Vec::new();

        for token in registry_tokens {
            let contract = match Address::from_str(&token.contract_address) {
                Ok(c) => c,
                Err(_) => continue,
            };

            let amount = match rpc.call_read_only(contract, call.clone()).await {
                Ok(ret) => decode_uint_word(&ret),
                Err(e) => {
                    tracing::debug!(
                        address = %record.address,
                        network = %record.network,
                        token = %token.symbol,
                        error = %e,
                        "Token balance call failed — skipping token"
                    );
                    continue;
                }
            };

            if amount.is_zero() {
                continue;
            }

            held.push(RawBalance {
                address_id: record.id,
                address: record.address.clone(),
                network: record.network,
                asset: Asset::Token(token),
                amount,
            });
        }

        Ok(held)
    }
}
