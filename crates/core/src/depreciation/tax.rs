//! Tax depreciation: MACRS tables, straight-line and declining-balance
//! recovery, property tax, and status reporting.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tally_shared::types::{percent_of, round_money};

use super::types::{
    AssetTaxInfo, FixedAsset, NewAssetTaxInfo, PropertyClass, TaxDepreciationMethod,
    TaxScheduleRow,
};

/// MACRS half-year convention rates in percent, by recovery year.
const MACRS_3: &[(i64, u32)] = &[(3333, 2), (4445, 2), (1481, 2), (741, 2)];
const MACRS_5: &[(i64, u32)] = &[(20, 0), (32, 0), (1920, 2), (1152, 2), (1152, 2), (576, 2)];
const MACRS_7: &[(i64, u32)] = &[
    (1429, 2),
    (2449, 2),
    (1749, 2),
    (1249, 2),
    (893, 2),
    (892, 2),
    (893, 2),
    (446, 2),
];
const MACRS_10: &[(i64, u32)] = &[
    (10, 0),
    (18, 0),
    (1440, 2),
    (1152, 2),
    (922, 2),
    (737, 2),
    (655, 2),
    (655, 2),
    (656, 2),
    (655, 2),
    (328, 2),
];
const MACRS_15: &[(i64, u32)] = &[
    (5, 0),
    (95, 1),
    (855, 2),
    (770, 2),
    (693, 2),
    (623, 2),
    (590, 2),
    (590, 2),
    (591, 2),
    (590, 2),
    (591, 2),
    (590, 2),
    (591, 2),
    (590, 2),
    (591, 2),
    (295, 2),
];
const MACRS_20: &[(i64, u32)] = &[
    (3750, 3),
    (7219, 3),
    (6677, 3),
    (6177, 3),
    (5713, 3),
    (5285, 3),
    (4888, 3),
    (4522, 3),
    (4462, 3),
    (4461, 3),
    (4462, 3),
    (4461, 3),
    (4462, 3),
    (4461, 3),
    (4462, 3),
    (4461, 3),
    (4462, 3),
    (4461, 3),
    (4462, 3),
    (4461, 3),
    (2231, 3),
];

/// MACRS rates (as fractions) for a property class.
///
/// Real property classes have no table; they recover straight line.
#[must_use]
pub fn macrs_rates(class: PropertyClass) -> Option<Vec<Decimal>> {
    let table = match class {
        PropertyClass::Class3 => MACRS_3,
        PropertyClass::Class5 => MACRS_5,
        PropertyClass::Class7 => MACRS_7,
        PropertyClass::Class10 => MACRS_10,
        PropertyClass::Class15 => MACRS_15,
        PropertyClass::Class20 => MACRS_20,
        PropertyClass::Class27_5 | PropertyClass::Class39 | PropertyClass::NonDepreciable => {
            return None;
        }
    };
    Some(
        table
            .iter()
            .map(|&(num, scale)| Decimal::new(num, scale) / Decimal::ONE_HUNDRED)
            .collect(),
    )
}

/// Builds tax info from input, clamping Section 179 to the basis and bonus
/// depreciation to what Section 179 leaves.
#[must_use]
pub fn build_tax_info(input: NewAssetTaxInfo) -> AssetTaxInfo {
    let basis = input.tax_basis.max(Decimal::ZERO);
    let section_179 = input.section_179_deduction.clamp(Decimal::ZERO, basis);
    let bonus = input
        .bonus_depreciation
        .clamp(Decimal::ZERO, basis - section_179);

    let mut info = AssetTaxInfo {
        method: input.method,
        property_class: input.property_class,
        tax_useful_life_years: input.tax_useful_life_years.filter(|years| *years > 0),
        tax_basis: basis,
        section_179_deduction: section_179,
        bonus_depreciation: bonus,
        tax_accumulated_depreciation: Decimal::ZERO,
        tax_book_value: Decimal::ZERO,
        assessed_value: input.assessed_value,
        property_tax_rate: input.property_tax_rate,
        jurisdiction: input.jurisdiction,
    };
    info.refresh_tax_book_value();
    info
}

/// Annual rates for the asset's tax method; they sum to one.
fn annual_rates(info: &AssetTaxInfo) -> Vec<Decimal> {
    let Some(class_period) = info.property_class.recovery_period() else {
        return Vec::new();
    };

    if info.method == TaxDepreciationMethod::Macrs {
        if let Some(rates) = macrs_rates(info.property_class) {
            return rates;
        }
        return straight_line_rates(class_period);
    }

    let life = info
        .tax_useful_life_years
        .map_or(class_period, Decimal::from);
    match info.method {
        TaxDepreciationMethod::DecliningBalance => declining_rates(life),
        TaxDepreciationMethod::StraightLine | TaxDepreciationMethod::Macrs => {
            straight_line_rates(life)
        }
    }
}

/// `1/life` per year; the last year takes the remainder, so a fractional
/// life ends with a partial year.
fn straight_line_rates(life: Decimal) -> Vec<Decimal> {
    let annual = Decimal::ONE / life;
    let years = life.ceil();
    let mut rates = Vec::new();
    let mut remaining = Decimal::ONE;
    let mut year = Decimal::ONE;
    while year < years {
        rates.push(annual);
        remaining -= annual;
        year += Decimal::ONE;
    }
    rates.push(remaining);
    rates
}

/// Double-declining rates on the remaining fraction; the last year takes the rest.
fn declining_rates(life: Decimal) -> Vec<Decimal> {
    let years = life.ceil();
    let rate = Decimal::TWO / life;
    let mut rates = Vec::new();
    let mut remaining = Decimal::ONE;
    let mut year = Decimal::ONE;
    while year < years {
        let charge = (remaining * rate).min(remaining);
        rates.push(charge);
        remaining -= charge;
        year += Decimal::ONE;
    }
    rates.push(remaining);
    rates
}

/// Tax schedule rows for years up to and including `as_of`'s year.
///
/// Each charge is rounded to cents; the final recovery year takes whatever
/// remains so the schedule sums exactly to the recoverable basis.
#[must_use]
pub fn tax_schedule(asset: &FixedAsset, info: &AssetTaxInfo, as_of: NaiveDate) -> Vec<TaxScheduleRow> {
    if !asset.depreciable {
        return Vec::new();
    }
    let basis = info.recoverable_basis();
    if basis <= Decimal::ZERO {
        return Vec::new();
    }

    let rates = annual_rates(info);
    let last = rates.len().saturating_sub(1);
    let first_year = asset.purchase_date.year();

    let mut rows = Vec::new();
    let mut accumulated = Decimal::ZERO;
    for (offset, rate) in rates.into_iter().enumerate() {
        let Some(year) = i32::try_from(offset).ok().map(|offset| first_year + offset) else {
            break;
        };
        if year > as_of.year() {
            break;
        }
        let charge = if offset == last {
            basis - accumulated
        } else {
            round_money(basis * rate).min(basis - accumulated)
        };
        accumulated += charge;
        rows.push(TaxScheduleRow {
            year,
            rate,
            annual_depreciation: charge,
            accumulated_depreciation: accumulated,
        });
    }
    rows
}

/// Scheduled tax depreciation through `as_of`'s year.
#[must_use]
pub fn scheduled_tax_accumulated(asset: &FixedAsset, info: &AssetTaxInfo, as_of: NaiveDate) -> Decimal {
    tax_schedule(asset, info, as_of)
        .last()
        .map_or(Decimal::ZERO, |row| row.accumulated_depreciation)
}

/// Annual property tax: assessed value × rate, zero when either is missing.
#[must_use]
pub fn property_tax(info: &AssetTaxInfo) -> Decimal {
    match (info.assessed_value, info.property_tax_rate) {
        (Some(value), Some(rate)) => round_money(value * rate),
        _ => Decimal::ZERO,
    }
}

/// One-line tax status for display.
#[must_use]
pub fn tax_status(asset: &FixedAsset, info: &AssetTaxInfo) -> String {
    if !asset.depreciable {
        return "Not depreciated for tax purposes".to_string();
    }
    let basis = info.recoverable_basis();
    if basis <= Decimal::ZERO {
        return "Fully depreciated for tax purposes".to_string();
    }
    let percent = percent_of(info.tax_accumulated_depreciation, basis);
    if percent >= Decimal::ONE_HUNDRED {
        "Fully depreciated for tax purposes".to_string()
    } else {
        format!("{:.1}% depreciated for tax purposes", percent.round_dp(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use tally_shared::types::{AccountId, FixedAssetId, TenantId};

    use crate::depreciation::types::DepreciationMethod;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn asset(purchase: NaiveDate) -> FixedAsset {
        FixedAsset {
            id: FixedAssetId::new(),
            tenant_id: TenantId::new(),
            asset_code: "FA-1".to_string(),
            name: "Laptop".to_string(),
            account_id: AccountId::new(),
            purchase_date: purchase,
            purchase_cost: dec!(10000),
            salvage_value: Decimal::ZERO,
            useful_life_years: 5,
            method: DepreciationMethod::StraightLine,
            depreciable: true,
            accumulated_depreciation: Decimal::ZERO,
            book_value: dec!(10000),
            last_depreciation_date: None,
            disposal_date: None,
            disposal_value: None,
            expense_account_id: None,
            accumulated_account_id: None,
            tax_info: None,
        }
    }

    fn info(class: PropertyClass, basis: Decimal) -> AssetTaxInfo {
        build_tax_info(NewAssetTaxInfo {
            method: TaxDepreciationMethod::Macrs,
            property_class: class,
            tax_useful_life_years: None,
            tax_basis: basis,
            section_179_deduction: Decimal::ZERO,
            bonus_depreciation: Decimal::ZERO,
            assessed_value: None,
            property_tax_rate: None,
            jurisdiction: None,
        })
    }

    #[rstest]
    #[case(PropertyClass::Class3, 4)]
    #[case(PropertyClass::Class5, 6)]
    #[case(PropertyClass::Class7, 8)]
    #[case(PropertyClass::Class10, 11)]
    #[case(PropertyClass::Class15, 16)]
    #[case(PropertyClass::Class20, 21)]
    fn test_macrs_tables_sum_to_one(#[case] class: PropertyClass, #[case] years: usize) {
        let rates = macrs_rates(class).unwrap();
        assert_eq!(rates.len(), years);
        assert_eq!(rates.iter().copied().sum::<Decimal>(), Decimal::ONE);
    }

    #[test]
    fn test_macrs_five_year_schedule() {
        let asset = asset(date(2022, 3, 1));
        let info = info(PropertyClass::Class5, dec!(10000));

        let rows = tax_schedule(&asset, &info, date(2023, 12, 31));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].annual_depreciation, dec!(2000));
        assert_eq!(rows[1].annual_depreciation, dec!(3200));
        assert_eq!(rows[1].accumulated_depreciation, dec!(5200));

        let full = tax_schedule(&asset, &info, date(2040, 1, 1));
        assert_eq!(full.len(), 6);
        assert_eq!(full.last().unwrap().accumulated_depreciation, dec!(10000));
    }

    #[test]
    fn test_real_property_is_straight_line() {
        let asset = asset(date(2020, 1, 1));
        let info = info(PropertyClass::Class27_5, dec!(275000));
        let rows = tax_schedule(&asset, &info, date(2060, 1, 1));
        assert_eq!(rows.len(), 28);
        assert_eq!(rows[0].annual_depreciation, dec!(10000));
        assert_eq!(rows[27].annual_depreciation, dec!(5000));
    }

    #[test]
    fn test_non_depreciable_class() {
        let asset = asset(date(2020, 1, 1));
        let info = info(PropertyClass::NonDepreciable, dec!(50000));
        assert!(tax_schedule(&asset, &info, date(2030, 1, 1)).is_empty());
    }

    #[test]
    fn test_deductions_are_clamped() {
        let info = build_tax_info(NewAssetTaxInfo {
            method: TaxDepreciationMethod::Macrs,
            property_class: PropertyClass::Class7,
            tax_useful_life_years: None,
            tax_basis: dec!(1000),
            section_179_deduction: dec!(800),
            bonus_depreciation: dec!(500),
            assessed_value: None,
            property_tax_rate: None,
            jurisdiction: None,
        });
        assert_eq!(info.section_179_deduction, dec!(800));
        assert_eq!(info.bonus_depreciation, dec!(200));
        assert_eq!(info.recoverable_basis(), Decimal::ZERO);
        assert_eq!(
            tax_status(&asset(date(2024, 1, 1)), &info),
            "Fully depreciated for tax purposes"
        );
    }

    #[test]
    fn test_straight_line_tax_method_uses_tax_life() {
        let asset = asset(date(2024, 1, 1));
        let mut info = info(PropertyClass::Class7, dec!(4000));
        info.method = TaxDepreciationMethod::StraightLine;
        info.tax_useful_life_years = Some(4);
        let rows = tax_schedule(&asset, &info, date(2030, 1, 1));
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.annual_depreciation == dec!(1000)));
    }

    #[test]
    fn test_declining_tax_method_recovers_full_basis() {
        let asset = asset(date(2024, 1, 1));
        let mut info = info(PropertyClass::Class5, dec!(10000));
        info.method = TaxDepreciationMethod::DecliningBalance;
        let rows = tax_schedule(&asset, &info, date(2035, 1, 1));
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].annual_depreciation, dec!(4000));
        assert_eq!(rows.last().unwrap().accumulated_depreciation, dec!(10000));
    }

    #[test]
    fn test_property_tax() {
        let mut info = info(PropertyClass::Class39, dec!(100000));
        assert_eq!(property_tax(&info), Decimal::ZERO);
        info.assessed_value = Some(dec!(80000));
        info.property_tax_rate = Some(dec!(0.0125));
        assert_eq!(property_tax(&info), dec!(1000.00));
    }

    #[test]
    fn test_tax_status_strings() {
        let mut land = asset(date(2024, 1, 1));
        land.depreciable = false;
        let mut info = info(PropertyClass::Class5, dec!(10000));
        assert_eq!(tax_status(&land, &info), "Not depreciated for tax purposes");

        let equipment = asset(date(2024, 1, 1));
        info.tax_accumulated_depreciation = dec!(5200);
        assert_eq!(tax_status(&equipment, &info), "52.0% depreciated for tax purposes");

        info.tax_accumulated_depreciation = dec!(10000);
        assert_eq!(tax_status(&equipment, &info), "Fully depreciated for tax purposes");
    }
}
