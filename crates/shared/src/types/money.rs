//! Money arithmetic helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount in the system is a `rust_decimal::Decimal`; these helpers fix
//! the rounding policy and the "ratio over zero is zero" rule in one place.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places stored for monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Rounds an amount to cents using banker's rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Divides `numerator` by `denominator`, resolving a zero denominator to zero.
#[must_use]
pub fn safe_ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Expresses `part` as a percentage of `whole`, rounded to two places.
///
/// Returns zero when `whole` is zero.
#[must_use]
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    round_money(safe_ratio(part, whole) * Decimal::ONE_HUNDRED)
}

/// Returns true if two amounts differ by strictly less than `tolerance`.
#[must_use]
pub fn within_tolerance(left: Decimal, right: Decimal, tolerance: Decimal) -> bool {
    (left - right).abs() < tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(10.125), dec!(10.12))]
    #[case(dec!(10.135), dec!(10.14))]
    #[case(dec!(-2.005), dec!(-2.00))]
    #[case(dec!(360), dec!(360))]
    fn test_round_money_uses_bankers_rounding(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_money(input), expected);
    }

    #[test]
    fn test_safe_ratio_zero_denominator() {
        assert_eq!(safe_ratio(dec!(100), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_ratio(dec!(50), dec!(200)), dec!(0.25));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec!(1), dec!(3)), dec!(33.33));
        assert_eq!(percent_of(dec!(5), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_within_tolerance_is_strict() {
        assert!(within_tolerance(dec!(100.00), dec!(100.009), dec!(0.01)));
        assert!(!within_tolerance(dec!(100.00), dec!(100.01), dec!(0.01)));
    }
}
