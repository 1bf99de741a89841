//! Bank reconciliation error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, JournalEntryId, ReconciliationId, StatementLineId};
use thiserror::Error;

use super::types::ReconciliationStatus;

/// Bank reconciliation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconciliationError {
    /// Reconciliation not found.
    #[error("Reconciliation not found: {0}")]
    NotFound(ReconciliationId),

    /// Statement line not found.
    #[error("Statement line not found: {0}")]
    StatementLineNotFound(StatementLineId),

    /// Account not found.
    #[error("Account not found: {0}")]
    UnknownAccount(AccountId),

    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    UnknownEntry(JournalEntryId),

    /// Only posted entries can back a statement line.
    #[error("Journal entry {0} is not posted")]
    EntryNotPosted(JournalEntryId),

    /// Bank transaction imported twice.
    #[error("Bank transaction already imported: {0}")]
    DuplicateTransaction(String),

    /// Account already reconciled on that day.
    #[error("Account {account_id} already has a reconciliation on {date}")]
    DuplicateReconciliation {
        /// Bank account.
        account_id: AccountId,
        /// Reconciliation date.
        date: NaiveDate,
    },

    /// Statement lines cannot be zero.
    #[error("Statement line amount cannot be zero")]
    ZeroAmount,

    /// Adjustment amounts must be positive.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Statement closes after the reconciliation date.
    #[error("Statement date {statement} is after reconciliation date {reconciliation}")]
    StatementAfterReconciliation {
        /// Statement closing date.
        statement: NaiveDate,
        /// Reconciliation date.
        reconciliation: NaiveDate,
    },

    /// Line already matched.
    #[error("Statement line {0} is already reconciled")]
    AlreadyReconciled(StatementLineId),

    /// Reconciliation no longer in progress.
    #[error("Reconciliation {id} is {status:?}")]
    Closed {
        /// Reconciliation.
        id: ReconciliationId,
        /// Current status.
        status: ReconciliationStatus,
    },

    /// Adjusted book balance differs from the statement.
    #[error("Adjusted book balance {adjusted} does not match statement balance {statement}")]
    Unbalanced {
        /// Adjusted book balance.
        adjusted: Decimal,
        /// Statement balance.
        statement: Decimal,
    },
}

impl ReconciliationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "RECONCILIATION_NOT_FOUND",
            Self::StatementLineNotFound(_) => "STATEMENT_LINE_NOT_FOUND",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::UnknownEntry(_) => "ENTRY_NOT_FOUND",
            Self::EntryNotPosted(_) => "ENTRY_NOT_POSTED",
            Self::DuplicateTransaction(_) => "DUPLICATE_TRANSACTION",
            Self::DuplicateReconciliation { .. } => "DUPLICATE_RECONCILIATION",
            Self::ZeroAmount | Self::NonPositiveAmount(_) => "INVALID_AMOUNT",
            Self::StatementAfterReconciliation { .. } => "INVALID_DATES",
            Self::AlreadyReconciled(_) => "ALREADY_RECONCILED",
            Self::Closed { .. } => "RECONCILIATION_CLOSED",
            Self::Unbalanced { .. } => "RECONCILIATION_UNBALANCED",
        }
    }

    /// Returns true if the error refers to something missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::StatementLineNotFound(_)
                | Self::UnknownAccount(_)
                | Self::UnknownEntry(_)
        )
    }
}
