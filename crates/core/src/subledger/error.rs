//! Subledger error types.

use rust_decimal::Decimal;
use tally_shared::types::{AccountId, BillId, ExpenseId, InvoiceId};
use thiserror::Error;

use super::types::{BillStatus, ExpenseStatus, InvoiceStatus};

/// Errors raised by receivable and payable documents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubledgerError {
    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Bill not found.
    #[error("Bill not found: {0}")]
    BillNotFound(BillId),

    /// Expense not found.
    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    /// Expense account is not in the chart.
    #[error("Unknown account: {0}")]
    UnknownAccount(AccountId),

    /// Expense account is deactivated.
    #[error("Account is inactive: {0}")]
    InactiveAccount(AccountId),

    /// Document totals and payments must be positive.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Expense amounts cannot be negative.
    #[error("Amount cannot be negative, got {0}")]
    NegativeAmount(Decimal),

    /// Due date precedes the document date.
    #[error("Due date cannot be before the document date")]
    DueBeforeIssue,

    /// Document number already used.
    #[error("Document number already exists: {0}")]
    DuplicateNumber(String),

    /// Payment larger than the open balance.
    #[error("Payment of {amount} exceeds balance due of {balance_due}")]
    Overpayment {
        /// Open balance.
        balance_due: Decimal,
        /// Attempted payment.
        amount: Decimal,
    },

    /// Invoice cannot take this action in its current status.
    #[error("Invoice cannot move from {from:?} to {to:?}")]
    InvoiceTransition {
        /// Current status.
        from: InvoiceStatus,
        /// Requested status.
        to: InvoiceStatus,
    },

    /// Bill cannot take this action in its current status.
    #[error("Bill cannot move from {from:?} to {to:?}")]
    BillTransition {
        /// Current status.
        from: BillStatus,
        /// Requested status.
        to: BillStatus,
    },

    /// Expense cannot take this action in its current status.
    #[error("Expense cannot move from {from:?} to {to:?}")]
    ExpenseTransition {
        /// Current status.
        from: ExpenseStatus,
        /// Requested status.
        to: ExpenseStatus,
    },
}

impl SubledgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::BillNotFound(_) => "BILL_NOT_FOUND",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::InactiveAccount(_) => "INACTIVE_ACCOUNT",
            Self::NonPositiveAmount(_) | Self::NegativeAmount(_) => "INVALID_AMOUNT",
            Self::DueBeforeIssue => "DUE_BEFORE_ISSUE",
            Self::DuplicateNumber(_) => "DUPLICATE_NUMBER",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::InvoiceTransition { .. }
            | Self::BillTransition { .. }
            | Self::ExpenseTransition { .. } => "INVALID_TRANSITION",
        }
    }

    /// Returns true if the error refers to a missing document.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InvoiceNotFound(_)
                | Self::BillNotFound(_)
                | Self::ExpenseNotFound(_)
                | Self::UnknownAccount(_)
        )
    }
}
