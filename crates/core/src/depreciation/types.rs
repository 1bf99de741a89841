//! Fixed asset and tax data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, FixedAssetId, JournalEntryId, TenantId};

/// Book depreciation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepreciationMethod {
    /// Equal monthly charges over the useful life.
    StraightLine,
    /// Double-declining balance.
    DecliningBalance,
    /// Accepted for compatibility; computed as straight line.
    UnitsOfProduction,
}

/// Lifecycle of an asset, derived from its stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetState {
    /// Acquired, nothing depreciated yet.
    Acquired,
    /// Depreciation in progress.
    Depreciating,
    /// Accumulated depreciation has reached cost minus salvage.
    FullyDepreciated,
    /// Disposed; values are frozen.
    Disposed,
}

/// A fixed asset on the register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedAsset {
    /// Asset ID.
    pub id: FixedAssetId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Unique asset code.
    pub asset_code: String,
    /// Display name.
    pub name: String,
    /// Balance-sheet asset account.
    pub account_id: AccountId,
    /// Acquisition date.
    pub purchase_date: NaiveDate,
    /// Original cost.
    pub purchase_cost: Decimal,
    /// Estimated value at the end of its life.
    pub salvage_value: Decimal,
    /// Useful life in years.
    pub useful_life_years: u32,
    /// Book method.
    pub method: DepreciationMethod,
    /// False for assets that never depreciate, such as land.
    pub depreciable: bool,
    /// Depreciation charged so far.
    pub accumulated_depreciation: Decimal,
    /// `purchase_cost - accumulated_depreciation`.
    pub book_value: Decimal,
    /// Latest date depreciation was run through.
    pub last_depreciation_date: Option<NaiveDate>,
    /// Disposal date, once disposed.
    pub disposal_date: Option<NaiveDate>,
    /// Proceeds received on disposal.
    pub disposal_value: Option<Decimal>,
    /// Expense account debited by depreciation runs.
    pub expense_account_id: Option<AccountId>,
    /// Contra-asset account credited by depreciation runs.
    pub accumulated_account_id: Option<AccountId>,
    /// Tax basis tracking, if attached.
    pub tax_info: Option<AssetTaxInfo>,
}

impl FixedAsset {
    /// `cost - salvage`, never negative.
    #[must_use]
    pub fn depreciable_basis(&self) -> Decimal {
        (self.purchase_cost - self.salvage_value).max(Decimal::ZERO)
    }

    /// Returns true once a disposal has been recorded.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposal_date.is_some()
    }

    /// Both accounts needed to post a depreciation entry, if configured.
    #[must_use]
    pub fn posting_accounts(&self) -> Option<(AccountId, AccountId)> {
        self.expense_account_id.zip(self.accumulated_account_id)
    }

    /// Recomputes `book_value` from cost and accumulated depreciation.
    pub fn refresh_book_value(&mut self) {
        self.book_value = self.purchase_cost - self.accumulated_depreciation;
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AssetState {
        if self.is_disposed() {
            AssetState::Disposed
        } else if !self.depreciable {
            AssetState::Acquired
        } else if self.accumulated_depreciation >= self.depreciable_basis() {
            AssetState::FullyDepreciated
        } else if self.accumulated_depreciation.is_zero() {
            AssetState::Acquired
        } else {
            AssetState::Depreciating
        }
    }
}

/// Input for registering an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFixedAsset {
    /// Unique asset code.
    pub asset_code: String,
    /// Display name.
    pub name: String,
    /// Balance-sheet asset account.
    pub account_id: AccountId,
    /// Acquisition date.
    pub purchase_date: NaiveDate,
    /// Original cost.
    pub purchase_cost: Decimal,
    /// Salvage value.
    #[serde(default)]
    pub salvage_value: Decimal,
    /// Useful life in years.
    pub useful_life_years: u32,
    /// Book method.
    #[serde(default = "default_method")]
    pub method: DepreciationMethod,
    /// False for land and other non-depreciable assets.
    #[serde(default = "default_depreciable")]
    pub depreciable: bool,
    /// Depreciation already charged before the asset entered the register.
    #[serde(default)]
    pub opening_accumulated_depreciation: Decimal,
    /// Expense account for depreciation entries.
    #[serde(default)]
    pub expense_account_id: Option<AccountId>,
    /// Accumulated depreciation account for depreciation entries.
    #[serde(default)]
    pub accumulated_account_id: Option<AccountId>,
}

fn default_method() -> DepreciationMethod {
    DepreciationMethod::StraightLine
}

fn default_depreciable() -> bool {
    true
}

/// Tax depreciation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxDepreciationMethod {
    /// Half-year convention tables by property class.
    Macrs,
    /// Equal annual charges.
    StraightLine,
    /// Double-declining balance by year.
    DecliningBalance,
}

/// Recovery-period bucket for tax depreciation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyClass {
    /// 3-year property.
    #[serde(rename = "CLASS_3")]
    Class3,
    /// 5-year property.
    #[serde(rename = "CLASS_5")]
    Class5,
    /// 7-year property.
    #[serde(rename = "CLASS_7")]
    Class7,
    /// 10-year property.
    #[serde(rename = "CLASS_10")]
    Class10,
    /// 15-year property.
    #[serde(rename = "CLASS_15")]
    Class15,
    /// 20-year property.
    #[serde(rename = "CLASS_20")]
    Class20,
    /// 27.5-year residential rental property.
    #[serde(rename = "CLASS_27_5")]
    Class27_5,
    /// 39-year nonresidential real property.
    #[serde(rename = "CLASS_39")]
    Class39,
    /// Never depreciated (land).
    #[serde(rename = "NON_DEPRECIABLE")]
    NonDepreciable,
}

impl PropertyClass {
    /// Recovery period in years; `None` for non-depreciable property.
    #[must_use]
    pub fn recovery_period(self) -> Option<Decimal> {
        let years = match self {
            Self::Class3 => Decimal::from(3),
            Self::Class5 => Decimal::from(5),
            Self::Class7 => Decimal::from(7),
            Self::Class10 => Decimal::from(10),
            Self::Class15 => Decimal::from(15),
            Self::Class20 => Decimal::from(20),
            Self::Class27_5 => Decimal::new(275, 1),
            Self::Class39 => Decimal::from(39),
            Self::NonDepreciable => return None,
        };
        Some(years)
    }
}

/// Tax basis tracking attached to one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTaxInfo {
    /// Tax method.
    pub method: TaxDepreciationMethod,
    /// Property class.
    pub property_class: PropertyClass,
    /// Tax life overriding the class period for non-MACRS methods.
    pub tax_useful_life_years: Option<u32>,
    /// Basis for tax depreciation.
    pub tax_basis: Decimal,
    /// Section 179 expensing, never above the basis.
    pub section_179_deduction: Decimal,
    /// Bonus depreciation, never above what Section 179 leaves.
    pub bonus_depreciation: Decimal,
    /// Scheduled tax depreciation taken so far.
    pub tax_accumulated_depreciation: Decimal,
    /// `tax_basis - section_179 - bonus - tax_accumulated_depreciation`.
    pub tax_book_value: Decimal,
    /// Assessed value for property tax.
    pub assessed_value: Option<Decimal>,
    /// Property tax rate as a fraction (0.0125 for 1.25%).
    pub property_tax_rate: Option<Decimal>,
    /// Property tax jurisdiction.
    pub jurisdiction: Option<String>,
}

impl AssetTaxInfo {
    /// Basis left for the recovery schedule after immediate expensing.
    #[must_use]
    pub fn recoverable_basis(&self) -> Decimal {
        self.tax_basis - self.section_179_deduction - self.bonus_depreciation
    }

    /// Recomputes `tax_book_value`.
    pub fn refresh_tax_book_value(&mut self) {
        self.tax_book_value = self.recoverable_basis() - self.tax_accumulated_depreciation;
    }
}

/// Input for attaching tax information to an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssetTaxInfo {
    /// Tax method.
    #[serde(default = "default_tax_method")]
    pub method: TaxDepreciationMethod,
    /// Property class.
    #[serde(default = "default_property_class")]
    pub property_class: PropertyClass,
    /// Optional tax life.
    #[serde(default)]
    pub tax_useful_life_years: Option<u32>,
    /// Tax basis.
    pub tax_basis: Decimal,
    /// Requested Section 179 deduction.
    #[serde(default)]
    pub section_179_deduction: Decimal,
    /// Requested bonus depreciation.
    #[serde(default)]
    pub bonus_depreciation: Decimal,
    /// Assessed value.
    #[serde(default)]
    pub assessed_value: Option<Decimal>,
    /// Property tax rate.
    #[serde(default)]
    pub property_tax_rate: Option<Decimal>,
    /// Jurisdiction.
    #[serde(default)]
    pub jurisdiction: Option<String>,
}

fn default_tax_method() -> TaxDepreciationMethod {
    TaxDepreciationMethod::Macrs
}

fn default_property_class() -> PropertyClass {
    PropertyClass::Class5
}

/// One year of a tax depreciation schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxScheduleRow {
    /// Tax year.
    pub year: i32,
    /// Rate applied to the recoverable basis.
    pub rate: Decimal,
    /// Charge for the year.
    pub annual_depreciation: Decimal,
    /// Running total including this year.
    pub accumulated_depreciation: Decimal,
}

/// Tax position of one asset as of a date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetTaxSummary {
    /// Asset ID.
    pub asset_id: FixedAssetId,
    /// Asset code.
    pub asset_code: String,
    /// Property class.
    pub property_class: PropertyClass,
    /// Tax method.
    pub method: TaxDepreciationMethod,
    /// Tax basis.
    pub tax_basis: Decimal,
    /// Section 179 deduction.
    pub section_179_deduction: Decimal,
    /// Bonus depreciation.
    pub bonus_depreciation: Decimal,
    /// Schedule rows through the as-of year.
    pub schedule: Vec<TaxScheduleRow>,
    /// Scheduled depreciation through the as-of year.
    pub tax_accumulated_depreciation: Decimal,
    /// Remaining tax book value.
    pub tax_book_value: Decimal,
    /// Annual property tax.
    pub property_tax: Decimal,
    /// Human-readable status line.
    pub status: String,
}

/// Non-fatal condition raised by a depreciation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepreciationWarning {
    /// Stored accumulated depreciation was above cost minus salvage and was clamped.
    ExceedsBasis {
        /// Value found on the asset.
        requested: Decimal,
        /// Value kept.
        capped: Decimal,
    },
}

/// Outcome of depreciating one asset through a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationRun {
    /// Asset ID.
    pub asset_id: FixedAssetId,
    /// Run date.
    pub as_of: NaiveDate,
    /// Accumulated depreciation before the run.
    pub previous_accumulated: Decimal,
    /// Accumulated depreciation after the run.
    pub accumulated_depreciation: Decimal,
    /// Book value after the run.
    pub book_value: Decimal,
    /// Newly recognised depreciation, never negative.
    pub delta: Decimal,
    /// State after the run.
    pub state: AssetState,
    /// Journal entry carrying the delta, when one was posted.
    pub journal_entry_id: Option<JournalEntryId>,
    /// Clamping warnings.
    pub warnings: Vec<DepreciationWarning>,
}
