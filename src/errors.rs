use crate::models::Network;

/// Engine-level error taxonomy.
///
/// Per-unit failures (one address, one token call, one rule) are caught at the
/// unit boundary and folded into partial results; only whole-operation
/// failures (unknown entity, ownership mismatch, malformed input) reach the
/// caller as one of these.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("network {network} unavailable: {reason}")]
    NetworkUnavailable { network: Network, reason: String },

    #[error("RPC call failed on {network}: {reason}")]
    Rpc { network: Network, reason: String },

    #[error("network {0} not supported for token balances")]
    UnsupportedNetwork(Network),

    #[error("price unavailable for {0}")]
    PriceUnavailable(String),

    #[error("raw amount {0} exceeds decimal precision")]
    ValueOverflow(String),

    #[error("store error: {0}")]
    Store(String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        EngineError::NotFound(msg.into())
    }
}

impl From<crate::pricing::PriceError> for EngineError {
    fn from(e: crate::pricing::PriceError) -> Self {
        match e {
            crate::pricing::PriceError::Unavailable(symbol) => EngineError::PriceUnavailable(symbol),
            crate::pricing::PriceError::Upstream(err) => {
                EngineError::PriceUnavailable(err.to_string())
            }
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => EngineError::NotFound("record not found".into()),
            other => EngineError::Store(other.to_string()),
        }
    }
}
