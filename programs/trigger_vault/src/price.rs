//! Price normalization and trigger evaluation.
//!
//! Feeds deliver prices as a `(mantissa, exponent)` pair with arbitrary
//! decimal scale (exponent -9 means the mantissa is already canonical).
//! Everything stored in the registry is at the canonical 1e9 fixed-point
//! scale, so execution compares like against like.

use anchor_lang::prelude::*;

use crate::errors::VaultError;
use crate::state::TriggerDirection;

/// Canonical fixed-point scale: stored integer = real price * 1e9.
pub const PRICE_SCALE: u64 = 1_000_000_000;

/// Exponent of the canonical scale.
pub const PRICE_SCALE_EXPONENT: i32 = -9;

/// Bound on the feed exponent so 10^shift stays well inside u128.
const MAX_EXPONENT_ABS: i32 = 18;

/// Convert a raw feed price to the canonical 1e9 scale.
///
/// Sources finer than 1e9 are floor-divided down. Truncation is deliberate:
/// the normalized price never over-reports, so a RisesTo order only fires
/// once the true price has reached its threshold, and a FallsTo order can
/// fire at most one least-significant unit before the exact price would —
/// the protective direction for the order owner in both cases.
pub fn normalize_price(mantissa: u64, exponent: i32) -> Result<u64> {
    if !(-MAX_EXPONENT_ABS..=MAX_EXPONENT_ABS).contains(&exponent) {
        return err!(VaultError::PriceOverflow);
    }

    let shift = exponent - PRICE_SCALE_EXPONENT;
    let normalized = if shift >= 0 {
        (mantissa as u128)
            .checked_mul(10u128.pow(shift as u32))
            .ok_or(VaultError::PriceOverflow)?
    } else {
        (mantissa as u128) / 10u128.pow((-shift) as u32)
    };

    if normalized > u64::MAX as u128 {
        return err!(VaultError::PriceOverflow);
    }
    Ok(normalized as u64)
}

/// Inclusive threshold comparison: a price exactly on the threshold
/// triggers in both directions.
pub fn should_trigger(direction: TriggerDirection, trigger_price: u64, price: u64) -> bool {
    match direction {
        TriggerDirection::FallsTo => price <= trigger_price,
        TriggerDirection::RisesTo => price >= trigger_price,
    }
}

/// Indicative settlement value of a disbursement: amount * price / 1e9.
/// Recorded on the execution receipt; never consulted by the program again.
pub fn settlement_value_estimate(amount: u64, price: u64) -> Result<u64> {
    let value = (amount as u128) * (price as u128) / (PRICE_SCALE as u128);
    if value > u64::MAX as u128 {
        return err!(VaultError::MathOverflow);
    }
    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_exponent_round_trips() {
        assert_eq!(normalize_price(2_500_000_000, -9).unwrap(), 2_500_000_000);
        assert_eq!(normalize_price(1, -9).unwrap(), 1);
        assert_eq!(normalize_price(u64::MAX, -9).unwrap(), u64::MAX);
    }

    #[test]
    fn test_coarser_sources_multiply_up() {
        // 2.5 at two decimals -> 2.5e9
        assert_eq!(normalize_price(250, -2).unwrap(), 2_500_000_000);
        // whole units
        assert_eq!(normalize_price(3, 0).unwrap(), 3_000_000_000);
        // six decimals (USDC-style)
        assert_eq!(normalize_price(2_500_000, -6).unwrap(), 2_500_000_000);
    }

    #[test]
    fn test_finer_sources_floor_divide() {
        // 2.500000000999 at twelve decimals truncates to 2.500000000
        assert_eq!(
            normalize_price(2_500_000_000_999, -12).unwrap(),
            2_500_000_000
        );
        assert_eq!(normalize_price(999, -12).unwrap(), 0);
    }

    #[test]
    fn test_truncation_can_fire_falls_to_one_unit_early() {
        // True price 2.500000000999 sits just above the threshold, but the
        // normalized price lands exactly on it. The floor fires the
        // stop-loss one least-significant unit early, never late.
        let threshold = 2_500_000_000;
        let normalized = normalize_price(2_500_000_000_999, -12).unwrap();
        assert!(should_trigger(TriggerDirection::FallsTo, threshold, normalized));
    }

    #[test]
    fn test_truncation_never_fires_rises_to_early() {
        // The floored price only reaches a RisesTo threshold if the true
        // price did; a fractional shortfall below it never triggers.
        let threshold = 2_500_000_001;
        let normalized = normalize_price(2_500_000_000_999, -12).unwrap();
        assert!(!should_trigger(TriggerDirection::RisesTo, threshold, normalized));
    }

    #[test]
    fn test_normalize_monotonic_in_mantissa() {
        for expo in [-12, -9, -6, 0] {
            let lo = normalize_price(1_000, expo).unwrap();
            let mid = normalize_price(1_001, expo).unwrap();
            let hi = normalize_price(2_000, expo).unwrap();
            assert!(lo <= mid && mid <= hi);
        }
    }

    #[test]
    fn test_exponent_bound_rejected() {
        assert!(normalize_price(1, 19).is_err());
        assert!(normalize_price(1, -19).is_err());
        assert!(normalize_price(1, i32::MIN).is_err());
        assert!(normalize_price(1, i32::MAX).is_err());
    }

    #[test]
    fn test_overflow_rejected() {
        assert!(normalize_price(u64::MAX, 0).is_err());
        assert!(normalize_price(u64::MAX / 10 + 1, -8).is_err());
        // Large mantissas survive in u128 as long as the result fits u64.
        assert_eq!(
            normalize_price(u64::MAX / 10, -10).unwrap(),
            u64::MAX / 100
        );
    }

    #[test]
    fn test_falls_to_boundary() {
        let threshold = 2_500_000_000;
        assert!(should_trigger(TriggerDirection::FallsTo, threshold, threshold - 1));
        assert!(should_trigger(TriggerDirection::FallsTo, threshold, threshold));
        assert!(!should_trigger(TriggerDirection::FallsTo, threshold, threshold + 1));
    }

    #[test]
    fn test_rises_to_boundary() {
        let threshold = 2_500_000_000;
        assert!(!should_trigger(TriggerDirection::RisesTo, threshold, threshold - 1));
        assert!(should_trigger(TriggerDirection::RisesTo, threshold, threshold));
        assert!(should_trigger(TriggerDirection::RisesTo, threshold, threshold + 1));
    }

    #[test]
    fn test_stop_loss_trigger() {
        // 1 unit locked with a 2.5 stop: fires at 2.4, holds at 2.6.
        let threshold = 2_500_000_000;
        assert!(should_trigger(TriggerDirection::FallsTo, threshold, 2_400_000_000));
        assert!(!should_trigger(TriggerDirection::FallsTo, threshold, 2_600_000_000));
    }

    #[test]
    fn test_settlement_value_estimate() {
        // 1 unit at price 2.4 -> 2.4 quote units
        assert_eq!(
            settlement_value_estimate(1_000_000_000, 2_400_000_000).unwrap(),
            2_400_000_000
        );
        assert_eq!(settlement_value_estimate(0, 2_400_000_000).unwrap(), 0);
        assert_eq!(settlement_value_estimate(500, 2_000_000_000).unwrap(), 1_000);
        assert!(settlement_value_estimate(u64::MAX, u64::MAX).is_err());
    }
}
