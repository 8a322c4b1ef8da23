use std::str::FromStr;

use alloy::primitives::Address;

use crate::errors::EngineError;

/// Validate an EVM address before it goes anywhere near an RPC call.
///
/// Accepts `0x` + 40 hex chars. Mixed-case input must match its EIP-55
/// checksum; single-case input carries no checksum and is accepted as-is.
pub fn validate(input: &str) -> Result<Address, EngineError> {
    let hex = input
        .strip_prefix("0x")
        .ok_or_else(|| EngineError::InvalidAddress(format!("{input}: missing 0x prefix")))?;

    if hex.len() != 40 {
        return Err(EngineError::InvalidAddress(format!(
            "{input}: expected 40 hex characters, got {}",
            hex.len()
        )));
    }

    let addr = Address::from_str(input)
        .map_err(|_| EngineError::InvalidAddress(format!("{input}: not valid hex")))?;

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && addr.to_checksum(None) != input {
        return Err(EngineError::InvalidAddress(format!(
            "{input}: EIP-55 checksum mismatch"
        )));
    }

    Ok(addr)
}
