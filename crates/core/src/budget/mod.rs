//! Budget reconciliation and variance analysis.
//!
//! A line's actual amount is always re-derived from posted entries in the
//! budget range; it is never authoritative on its own.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::BudgetError;
pub use service::BudgetReconciler;
pub use types::{
    Budget, BudgetLine, BudgetLineWithActual, BudgetPeriod, BudgetVsActualReport,
    BudgetVsActualSummary, NewBudget, NewBudgetLine, VarianceResult, VarianceStatus,
};
