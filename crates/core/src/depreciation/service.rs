//! Depreciation engine: registration, runs, disposal, and tax summaries.

use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{FixedAssetId, TenantId};
use tracing::{debug, info, warn};

use super::book;
use super::error::DepreciationError;
use super::tax;
use super::types::{
    AssetState, AssetTaxSummary, DepreciationRun, DepreciationWarning, FixedAsset,
    NewAssetTaxInfo, NewFixedAsset,
};

fn non_negative(field: &'static str, value: Decimal) -> Result<(), DepreciationError> {
    if value < Decimal::ZERO {
        return Err(DepreciationError::NegativeAmount { field, value });
    }
    Ok(())
}

/// Stateless depreciation calculations.
///
/// Every method takes an asset and returns an updated copy; storing the
/// result (and posting any journal entry) is the caller's job.
pub struct DepreciationEngine;

impl DepreciationEngine {
    /// Validates input and builds a new asset record.
    ///
    /// Opening accumulated depreciation above `cost - salvage` is clamped.
    ///
    /// # Errors
    ///
    /// `NegativeAmount`, `SalvageExceedsCost`, or `InvalidUsefulLife`.
    pub fn register(tenant_id: TenantId, input: NewFixedAsset) -> Result<FixedAsset, DepreciationError> {
        non_negative("purchase_cost", input.purchase_cost)?;
        non_negative("salvage_value", input.salvage_value)?;
        non_negative(
            "opening_accumulated_depreciation",
            input.opening_accumulated_depreciation,
        )?;
        if input.salvage_value > input.purchase_cost {
            return Err(DepreciationError::SalvageExceedsCost {
                cost: input.purchase_cost,
                salvage: input.salvage_value,
            });
        }
        if input.depreciable && input.useful_life_years == 0 {
            return Err(DepreciationError::InvalidUsefulLife);
        }

        let mut asset = FixedAsset {
            id: FixedAssetId::new(),
            tenant_id,
            asset_code: input.asset_code,
            name: input.name,
            account_id: input.account_id,
            purchase_date: input.purchase_date,
            purchase_cost: input.purchase_cost,
            salvage_value: input.salvage_value,
            useful_life_years: input.useful_life_years,
            method: input.method,
            depreciable: input.depreciable,
            accumulated_depreciation: input.opening_accumulated_depreciation,
            book_value: Decimal::ZERO,
            last_depreciation_date: None,
            disposal_date: None,
            disposal_value: None,
            expense_account_id: input.expense_account_id,
            accumulated_account_id: input.accumulated_account_id,
            tax_info: None,
        };

        if let Some(warning) = Self::clamp_to_basis(&mut asset) {
            warn!(asset_code = %asset.asset_code, ?warning, "opening depreciation clamped");
        }
        asset.refresh_book_value();
        Ok(asset)
    }

    /// Scheduled accumulated depreciation through `as_of`, ignoring what is stored.
    #[must_use]
    pub fn calculate_schedule(asset: &FixedAsset, as_of: NaiveDate) -> Decimal {
        book::scheduled_accumulated(asset, as_of)
    }

    fn clamp_to_basis(asset: &mut FixedAsset) -> Option<DepreciationWarning> {
        let basis = asset.depreciable_basis();
        if asset.accumulated_depreciation <= basis {
            return None;
        }
        let warning = DepreciationWarning::ExceedsBasis {
            requested: asset.accumulated_depreciation,
            capped: basis,
        };
        asset.accumulated_depreciation = basis;
        Some(warning)
    }

    /// Brings an asset's accumulated depreciation up to its schedule at `as_of`.
    ///
    /// Never lowers a stored value, so a run dated in the past or a repeated
    /// run recognises nothing new. Disposed assets are returned unchanged.
    /// Tax accumulated depreciation is advanced the same way.
    #[must_use]
    pub fn run(asset: &FixedAsset, as_of: NaiveDate) -> (FixedAsset, DepreciationRun) {
        let mut updated = asset.clone();
        let previous = asset.accumulated_depreciation;

        if asset.is_disposed() {
            debug!(asset_id = %asset.id, "asset disposed, depreciation skipped");
            let run = DepreciationRun {
                asset_id: asset.id,
                as_of,
                previous_accumulated: previous,
                accumulated_depreciation: previous,
                book_value: asset.book_value,
                delta: Decimal::ZERO,
                state: AssetState::Disposed,
                journal_entry_id: None,
                warnings: Vec::new(),
            };
            return (updated, run);
        }

        let mut warnings = Vec::new();
        if let Some(warning) = Self::clamp_to_basis(&mut updated) {
            warn!(asset_id = %asset.id, ?warning, "accumulated depreciation exceeds basis, clamped");
            warnings.push(warning);
        }
        let stored = updated.accumulated_depreciation;

        let scheduled = book::scheduled_accumulated(asset, as_of);
        let accumulated = stored.max(scheduled);
        let delta = accumulated - stored;

        updated.accumulated_depreciation = accumulated;
        updated.refresh_book_value();
        if delta > Decimal::ZERO {
            updated.last_depreciation_date = updated
                .last_depreciation_date
                .max(Some(as_of));
        }

        if let Some(tax_info) = updated.tax_info.as_mut() {
            let scheduled_tax = tax::scheduled_tax_accumulated(asset, tax_info, as_of);
            tax_info.tax_accumulated_depreciation =
                tax_info.tax_accumulated_depreciation.max(scheduled_tax);
            tax_info.refresh_tax_book_value();
        }

        if delta > Decimal::ZERO {
            info!(
                asset_id = %asset.id,
                %as_of,
                %delta,
                accumulated = %accumulated,
                "depreciation recognised"
            );
        }

        let run = DepreciationRun {
            asset_id: asset.id,
            as_of,
            previous_accumulated: previous,
            accumulated_depreciation: accumulated,
            book_value: updated.book_value,
            delta,
            state: updated.state(),
            journal_entry_id: None,
            warnings,
        };
        (updated, run)
    }

    /// Runs every active asset through `as_of` in parallel.
    ///
    /// Disposed assets are skipped. Output order follows input order.
    #[must_use]
    pub fn run_batch(assets: &[FixedAsset], as_of: NaiveDate) -> Vec<(FixedAsset, DepreciationRun)> {
        assets
            .par_iter()
            .filter(|asset| !asset.is_disposed())
            .map(|asset| Self::run(asset, as_of))
            .collect()
    }

    /// Attaches (or replaces) tax information.
    #[must_use]
    pub fn attach_tax_info(asset: &FixedAsset, input: NewAssetTaxInfo) -> FixedAsset {
        let mut updated = asset.clone();
        updated.tax_info = Some(tax::build_tax_info(input));
        updated
    }

    /// Records a disposal; depreciation values are frozen from here on.
    ///
    /// # Errors
    ///
    /// `AlreadyDisposed`, `DisposalBeforePurchase`, or `NegativeAmount`.
    pub fn dispose(
        asset: &FixedAsset,
        disposal_date: NaiveDate,
        proceeds: Decimal,
    ) -> Result<FixedAsset, DepreciationError> {
        if asset.is_disposed() {
            return Err(DepreciationError::AlreadyDisposed(asset.id));
        }
        if disposal_date < asset.purchase_date {
            return Err(DepreciationError::DisposalBeforePurchase {
                purchase_date: asset.purchase_date,
                disposal_date,
            });
        }
        non_negative("disposal_value", proceeds)?;

        let mut updated = asset.clone();
        updated.disposal_date = Some(disposal_date);
        updated.disposal_value = Some(proceeds);
        info!(asset_id = %asset.id, %disposal_date, %proceeds, "asset disposed");
        Ok(updated)
    }

    /// Tax schedule, property tax, and status of an asset as of a date.
    ///
    /// # Errors
    ///
    /// `NoTaxInfo` if no tax information is attached.
    pub fn tax_summary(asset: &FixedAsset, as_of: NaiveDate) -> Result<AssetTaxSummary, DepreciationError> {
        let stored = asset
            .tax_info
            .as_ref()
            .ok_or(DepreciationError::NoTaxInfo(asset.id))?;

        let schedule = tax::tax_schedule(asset, stored, as_of);
        let scheduled = schedule
            .last()
            .map_or(Decimal::ZERO, |row| row.accumulated_depreciation);

        let mut current = stored.clone();
        current.tax_accumulated_depreciation = current.tax_accumulated_depreciation.max(scheduled);
        current.refresh_tax_book_value();

        Ok(AssetTaxSummary {
            asset_id: asset.id,
            asset_code: asset.asset_code.clone(),
            property_class: current.property_class,
            method: current.method,
            tax_basis: current.tax_basis,
            section_179_deduction: current.section_179_deduction,
            bonus_depreciation: current.bonus_depreciation,
            schedule,
            tax_accumulated_depreciation: current.tax_accumulated_depreciation,
            tax_book_value: current.tax_book_value,
            property_tax: tax::property_tax(&current),
            status: tax::tax_status(asset, &current),
        })
    }
}
