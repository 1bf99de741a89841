//! Fixed asset depreciation.
//!
//! Book depreciation (straight line, double-declining balance) and tax
//! depreciation (Section 179, bonus, MACRS and straight-line recovery).
//! Runs are idempotent: accumulated depreciation only ever moves forward.

pub mod book;
pub mod error;
pub mod service;
pub mod tax;
pub mod types;


pub use error::DepreciationError;
pub use service::DepreciationEngine;
pub use types::{
    AssetState, AssetTaxInfo, AssetTaxSummary, DepreciationMethod, DepreciationRun,
    DepreciationWarning, FixedAsset, NewAssetTaxInfo, NewFixedAsset, PropertyClass,
    TaxDepreciationMethod, TaxScheduleRow,
};
