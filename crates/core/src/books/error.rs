//! Facade error type.

use tally_shared::AppError;
use thiserror::Error;

use crate::budget::BudgetError;
use crate::depreciation::DepreciationError;
use crate::ledger::LedgerError;
use crate::reconciliation::ReconciliationError;
use crate::reports::ReportError;
use crate::subledger::SubledgerError;

/// Any error a bookkeeping operation can return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BooksError {
    /// Ledger store error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Invoice, payment, bill, or expense error.
    #[error(transparent)]
    Subledger(#[from] SubledgerError),

    /// Report parameter error.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Fixed asset error.
    #[error(transparent)]
    Depreciation(#[from] DepreciationError),

    /// Budget error.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Bank reconciliation error.
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),
}

impl BooksError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(err) => err.error_code(),
            Self::Subledger(err) => err.error_code(),
            Self::Report(err) => err.error_code(),
            Self::Depreciation(err) => err.error_code(),
            Self::Budget(err) => err.error_code(),
            Self::Reconciliation(err) => err.error_code(),
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Ledger(err) if err.is_retryable())
    }

    /// Returns true if the error refers to something missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Ledger(err) => err.is_not_found(),
            Self::Subledger(err) => err.is_not_found(),
            Self::Report(_) => false,
            Self::Depreciation(err) => err.is_not_found(),
            Self::Budget(err) => err.is_not_found(),
            Self::Reconciliation(err) => err.is_not_found(),
        }
    }
}

impl From<BooksError> for AppError {
    fn from(err: BooksError) -> Self {
        let message = err.to_string();
        if err.is_not_found() {
            return Self::NotFound(message);
        }
        match err {
            BooksError::Ledger(LedgerError::Persistence(_)) => Self::Persistence(message),
            BooksError::Ledger(LedgerError::DuplicateAccountCode(_))
            | BooksError::Subledger(SubledgerError::DuplicateNumber(_))
            | BooksError::Depreciation(DepreciationError::DuplicateAssetCode(_))
            | BooksError::Budget(BudgetError::DuplicateBudgetLine(_))
            | BooksError::Reconciliation(
                ReconciliationError::DuplicateTransaction(_)
                | ReconciliationError::DuplicateReconciliation { .. },
            ) => Self::Conflict(message),
            BooksError::Ledger(
                LedgerError::InvalidAmount
                | LedgerError::TwoSidedLine
                | LedgerError::ZeroLine
                | LedgerError::DuplicateLineNumber(_),
            )
            | BooksError::Subledger(
                SubledgerError::NonPositiveAmount(_)
                | SubledgerError::NegativeAmount(_)
                | SubledgerError::DueBeforeIssue,
            )
            | BooksError::Report(_)
            | BooksError::Depreciation(
                DepreciationError::NegativeAmount { .. }
                | DepreciationError::SalvageExceedsCost { .. }
                | DepreciationError::InvalidUsefulLife
                | DepreciationError::DisposalBeforePurchase { .. },
            )
            | BooksError::Budget(BudgetError::NegativeAmount(_) | BudgetError::InvalidPeriod { .. })
            | BooksError::Reconciliation(
                ReconciliationError::ZeroAmount
                | ReconciliationError::NonPositiveAmount(_)
                | ReconciliationError::StatementAfterReconciliation { .. },
            ) => {
                Self::Validation(message)
            }
            _ => Self::BusinessRule(message),
        }
    }
}
