//! Decimal scaling and fiat valuation.
//!
//! Every money-bearing quantity (amount, price, value) is a `rust_decimal`
//! `Decimal`; binary floating point never touches this path. Scaling is done
//! by placing a decimal point in the raw amount's base-10 digit string, so
//! the result is exact or the operation fails; there is no silent rounding.

use alloy::primitives::U256;
use rust_decimal::Decimal;

use crate::errors::EngineError;

/// Fractional digits used when rendering a value for display. Applied at
/// presentation time only; intermediate values keep full precision.
pub const DISPLAY_DECIMALS: u32 = 8;

/// Scale a raw integer amount by the asset's decimals: `raw / 10^decimals`.
///
/// Raw amounts whose digit count exceeds `Decimal`'s 28-digit mantissa
/// cannot be represented exactly and fail with `ValueOverflow`.
pub fn scale(raw: U256, decimals: u8) -> Result<Decimal, EngineError> {
    let digits = raw.to_string();
    let d = decimals as usize;

    let literal = if d == 0 {
        digits.clone()
    } else if digits.len() > d {
        let (int_part, frac_part) = digits.split_at(digits.len() - d);
        format!("{int_part}.{frac_part}")
    } else {
        format!("0.{}{}", "0".repeat(d - digits.len()), digits)
    };

    Decimal::from_str_exact(&literal).map_err(|_| EngineError::ValueOverflow(digits))
}

/// Fiat value of a scaled amount at a unit price.
pub fn value(amount: Decimal, unit_price: Decimal) -> Result<Decimal, EngineError> {
    amount
        .checked_mul(unit_price)
        .ok_or_else(|| EngineError::ValueOverflow(format!("{amount} * {unit_price}")))
}

/// Round for display. Never used for stored or intermediate values.
pub fn display(d: Decimal) -> Decimal {
    d.round_dp(DISPLAY_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn pow10(exp: u8) -> Decimal {
        Decimal::from_str(&format!("1{}", "0".repeat(exp as usize))).unwrap()
    }

    #[test]
    fn test_scale_is_exact() {
        // scale(raw, d) * 10^d must reproduce raw exactly
        let cases: [(u64, u8); 5] = [
            (1, 18),
            (1_500_000, 6),
            (987_654_321, 0),
            (42, 1),
            (1_000_000_000_000_000_000, 18),
        ];

        for (raw, decimals) in cases {
            let scaled = scale(U256::from(raw), decimals).unwrap();
            assert_eq!(
                scaled * pow10(decimals),
                Decimal::from(raw),
                "scale({raw}, {decimals}) lost precision"
            );
        }
    }

    #[test]
    fn test_scale_million_micro_units() {
        // 1,500,000 raw units at 6 decimals is 1.5
        let scaled = scale(U256::from(1_500_000u64), 6).unwrap();
        assert_eq!(scaled, Decimal::new(15, 1));
    }

    #[test]
    fn test_scale_smallest_unit() {
        let scaled = scale(U256::from(1u64), 18).unwrap();
        assert_eq!(scaled, Decimal::from_str("0.000000000000000001").unwrap());
    }

    #[test]
    fn test_scale_zero() {
        assert_eq!(scale(U256::ZERO, 18).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_scale_overflow_is_an_error() {
        let err = scale(U256::MAX, 18).unwrap_err();
        assert!(matches!(err, EngineError::ValueOverflow(_)));
    }

    #[test]
    fn test_value_simple_multiply() {
        // 1.5 tokens at 2.00 each
        let v = value(Decimal::new(15, 1), Decimal::new(200, 2)).unwrap();
        assert_eq!(v, Decimal::new(300, 2));
    }

    #[test]
    fn test_display_rounds_to_eight_places() {
        let d = Decimal::from_str("1.0000000049").unwrap();
        assert_eq!(display(d), Decimal::from_str("1.00000000").unwrap());
        assert_eq!(display(d).scale(), DISPLAY_DECIMALS);
    }
}
