//! Bank statement reconciliation.
//!
//! The book balance of a reconciliation is always the posted ledger balance
//! of the bank account as of the statement date; adjustments explain the
//! difference to the statement.

pub mod error;
pub mod service;
pub mod types;


pub use error::ReconciliationError;
pub use service::BankReconciler;
pub use types::{
    AdjustmentType, BankReconciliation, BankStatementLine, NewAdjustment, NewReconciliation,
    NewStatementLine, ReconciliationAdjustment, ReconciliationStatus, ReconciliationWorksheet,
    StatementLineType,
};
