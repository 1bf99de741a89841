//! Financial report generation.
//!
//! This module turns ledger snapshots into reports:
//! - Profit & Loss
//! - Balance Sheet
//! - Cash Flow Statement
//! - Receivables Aging
//! - Cash Flow Forecast
//! - Trial Balance and headline ratios

pub mod cache;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use cache::ReportCache;
pub use error::ReportError;
pub use service::{MAX_FORECAST_HORIZON_DAYS, ReportSettings, StatementEngine};
pub use types::*;
