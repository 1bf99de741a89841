//! Book depreciation schedules.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tally_shared::types::round_money;

use super::types::{DepreciationMethod, FixedAsset};

const MONTHS_PER_YEAR: u32 = 12;

/// Whole calendar months from purchase to `as_of`, clamped to `[0, life × 12]`.
#[must_use]
pub fn months_elapsed(purchase_date: NaiveDate, as_of: NaiveDate, useful_life_years: u32) -> u32 {
    let months = i64::from(as_of.year() - purchase_date.year()) * 12 + i64::from(as_of.month())
        - i64::from(purchase_date.month());
    let cap = useful_life_years.saturating_mul(MONTHS_PER_YEAR);
    u32::try_from(months.max(0)).map_or(cap, |months| months.min(cap))
}

/// Straight-line accumulated depreciation.
///
/// `(cost - salvage) × months / (life × 12)`, never above `cost - salvage`.
#[must_use]
pub fn straight_line(cost: Decimal, salvage: Decimal, life_years: u32, months: u32) -> Decimal {
    let basis = (cost - salvage).max(Decimal::ZERO);
    if life_years == 0 {
        return Decimal::ZERO;
    }
    let total_months = Decimal::from(life_years) * Decimal::from(MONTHS_PER_YEAR);
    let accumulated = basis * Decimal::from(months) / total_months;
    round_money(accumulated.min(basis))
}

/// Double-declining-balance accumulated depreciation.
///
/// Each full year charges `book × 2/life`; the last year of the life charges
/// whatever is left above salvage. No charge ever takes book value below
/// salvage. A trailing partial year adds `(months mod 12)/12` of the charge
/// the next year would take.
#[must_use]
pub fn declining_balance(cost: Decimal, salvage: Decimal, life_years: u32, months: u32) -> Decimal {
    let basis = (cost - salvage).max(Decimal::ZERO);
    if life_years == 0 || basis.is_zero() {
        return Decimal::ZERO;
    }

    let rate = Decimal::TWO / Decimal::from(life_years);
    let charge_for = |year: u32, book: Decimal| -> Decimal {
        let headroom = book - salvage;
        if headroom <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let charge = if year + 1 == life_years {
            headroom
        } else {
            book * rate
        };
        charge.min(headroom)
    };

    let full_years = months / MONTHS_PER_YEAR;
    let partial_months = months % MONTHS_PER_YEAR;

    let mut book = cost;
    let mut accumulated = Decimal::ZERO;
    for year in 0..full_years.min(life_years) {
        let charge = charge_for(year, book);
        accumulated += charge;
        book -= charge;
    }

    if partial_months > 0 && full_years < life_years {
        let fraction = Decimal::from(partial_months) / Decimal::from(MONTHS_PER_YEAR);
        accumulated += charge_for(full_years, book) * fraction;
    }

    round_money(accumulated.min(basis))
}

/// Scheduled accumulated book depreciation of `asset` through `as_of`.
///
/// Zero for non-depreciable assets and for dates before acquisition.
#[must_use]
pub fn scheduled_accumulated(asset: &FixedAsset, as_of: NaiveDate) -> Decimal {
    if !asset.depreciable {
        return Decimal::ZERO;
    }
    let months = months_elapsed(asset.purchase_date, as_of, asset.useful_life_years);
    match asset.method {
        DepreciationMethod::DecliningBalance => declining_balance(
            asset.purchase_cost,
            asset.salvage_value,
            asset.useful_life_years,
            months,
        ),
        DepreciationMethod::StraightLine | DepreciationMethod::UnitsOfProduction => straight_line(
            asset.purchase_cost,
            asset.salvage_value,
            asset.useful_life_years,
            months,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2024, 1, 15), date(2024, 1, 31), 5, 0)]
    #[case(date(2024, 1, 15), date(2025, 1, 1), 5, 12)]
    #[case(date(2024, 11, 1), date(2025, 2, 1), 5, 3)]
    #[case(date(2024, 6, 1), date(2023, 6, 1), 5, 0)]
    #[case(date(2020, 1, 1), date(2030, 1, 1), 3, 36)]
    fn test_months_elapsed(
        #[case] purchase: NaiveDate,
        #[case] as_of: NaiveDate,
        #[case] life: u32,
        #[case] expected: u32,
    ) {
        assert_eq!(months_elapsed(purchase, as_of, life), expected);
    }

    #[test]
    fn test_straight_line_worked_example() {
        assert_eq!(straight_line(dec!(1200), dec!(120), 3, 12), dec!(360.00));
        assert_eq!(straight_line(dec!(1200), dec!(120), 3, 36), dec!(1080));
    }

    #[test]
    fn test_straight_line_rounds_to_cents() {
        // 1000 / 36 months × 1 = 27.777...
        assert_eq!(straight_line(dec!(1000), dec!(0), 3, 1), dec!(27.78));
    }

    #[rstest]
    #[case(0, dec!(0))]
    #[case(12, dec!(4000))]
    #[case(18, dec!(5200))]
    #[case(24, dec!(6400))]
    #[case(36, dec!(7840))]
    #[case(48, dec!(8704))]
    #[case(60, dec!(9000))]
    fn test_declining_balance(#[case] months: u32, #[case] expected: Decimal) {
        // cost 10000, salvage 1000, 5 years: rate 40%
        // y1 4000 (book 6000), y2 2400 (3600), y3 1440 (2160), y4 864 (1296), y5 296
        assert_eq!(declining_balance(dec!(10000), dec!(1000), 5, months), expected);
    }

    #[test]
    fn test_declining_balance_never_passes_salvage() {
        // rate 100% with a two-year life would wipe the book in year one
        assert_eq!(declining_balance(dec!(1000), dec!(300), 2, 12), dec!(700));
        assert_eq!(declining_balance(dec!(1000), dec!(300), 2, 24), dec!(700));
    }

    #[test]
    fn test_zero_life_is_zero() {
        assert_eq!(straight_line(dec!(1000), dec!(0), 0, 12), Decimal::ZERO);
        assert_eq!(declining_balance(dec!(1000), dec!(0), 0, 12), Decimal::ZERO);
    }
}
