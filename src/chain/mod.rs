pub mod address;
pub mod fetcher;
pub mod registry;
pub mod rpc;
pub mod tokens;

pub use fetcher::BalanceFetcher;
pub use registry::NetworkRegistry;
pub use rpc::{ChainRpc, JsonRpcClient, RpcClientError};
