//! Depreciation error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::FixedAssetId;
use thiserror::Error;

/// Errors raised by the depreciation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DepreciationError {
    /// Asset not found.
    #[error("Fixed asset not found: {0}")]
    AssetNotFound(FixedAssetId),

    /// Asset code already registered.
    #[error("Asset code already exists: {0}")]
    DuplicateAssetCode(String),

    /// A monetary field was negative.
    #[error("{field} cannot be negative, got {value}")]
    NegativeAmount {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: Decimal,
    },

    /// Salvage value above purchase cost.
    #[error("Salvage value {salvage} exceeds purchase cost {cost}")]
    SalvageExceedsCost {
        /// Purchase cost.
        cost: Decimal,
        /// Salvage value.
        salvage: Decimal,
    },

    /// Depreciable asset with a zero useful life.
    #[error("Useful life must be at least one year")]
    InvalidUsefulLife,

    /// Asset already disposed.
    #[error("Fixed asset already disposed: {0}")]
    AlreadyDisposed(FixedAssetId),

    /// Disposal dated before acquisition.
    #[error("Disposal date {disposal_date} is before purchase date {purchase_date}")]
    DisposalBeforePurchase {
        /// Purchase date.
        purchase_date: NaiveDate,
        /// Requested disposal date.
        disposal_date: NaiveDate,
    },

    /// Tax summary requested for an asset without tax information.
    #[error("Fixed asset has no tax information: {0}")]
    NoTaxInfo(FixedAssetId),
}

impl DepreciationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AssetNotFound(_) => "ASSET_NOT_FOUND",
            Self::DuplicateAssetCode(_) => "DUPLICATE_ASSET_CODE",
            Self::NegativeAmount { .. } => "INVALID_AMOUNT",
            Self::SalvageExceedsCost { .. } => "SALVAGE_EXCEEDS_COST",
            Self::InvalidUsefulLife => "INVALID_USEFUL_LIFE",
            Self::AlreadyDisposed(_) => "ASSET_DISPOSED",
            Self::DisposalBeforePurchase { .. } => "DISPOSAL_BEFORE_PURCHASE",
            Self::NoTaxInfo(_) => "NO_TAX_INFO",
        }
    }

    /// Returns true if the error refers to a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AssetNotFound(_) | Self::NoTaxInfo(_))
    }
}
