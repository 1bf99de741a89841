//! Budget error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, BudgetId};
use thiserror::Error;

/// Budget-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    /// Budget not found.
    #[error("Budget not found: {0}")]
    NotFound(BudgetId),

    /// Budget is locked and cannot be modified.
    #[error("Budget {0} is locked and cannot be modified")]
    BudgetLocked(BudgetId),

    /// Budget line already exists for this account.
    #[error("Budget line already exists for account {0}")]
    DuplicateBudgetLine(AccountId),

    /// Amount cannot be negative.
    #[error("Amount cannot be negative, got {0}")]
    NegativeAmount(Decimal),

    /// Start date after end date.
    #[error("Invalid budget period: start {start} is after end {end}")]
    InvalidPeriod {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Account not found.
    #[error("Account not found: {0}")]
    UnknownAccount(AccountId),
}

impl BudgetError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "BUDGET_NOT_FOUND",
            Self::BudgetLocked(_) => "BUDGET_LOCKED",
            Self::DuplicateBudgetLine(_) => "DUPLICATE_BUDGET_LINE",
            Self::NegativeAmount(_) => "INVALID_AMOUNT",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
        }
    }

    /// Returns true if the error refers to something missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::UnknownAccount(_))
    }
}
