//! Ledger error types for validation and state errors.
//!
//! Every variant except `Persistence` is a local, recoverable condition:
//! the store state is unchanged when one is returned.

use rust_decimal::Decimal;
use tally_shared::types::{AccountId, JournalEntryId};
use thiserror::Error;

use super::types::EntryStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Debits and credits differ at posting time.
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// A debit or credit amount is negative.
    #[error("Line amounts cannot be negative")]
    InvalidAmount,

    /// A line carries both a debit and a credit.
    #[error("Line must specify either debit or credit, not both")]
    TwoSidedLine,

    /// A line carries neither a debit nor a credit.
    #[error("Line amount cannot be zero")]
    ZeroLine,

    /// An entry without lines cannot be posted.
    #[error("Entry {0} has no lines")]
    EmptyEntry(JournalEntryId),

    /// Line number already used within the entry.
    #[error("Line {0} already exists on this entry")]
    DuplicateLineNumber(u32),

    /// Line number not present on the entry.
    #[error("Line {0} not found on this entry")]
    LineNotFound(u32),

    // ========== Account Errors ==========
    /// Account does not exist in this tenant.
    #[error("Account not found: {0}")]
    UnknownAccount(AccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    InactiveAccount(AccountId),

    /// Account is referenced and cannot be deleted.
    #[error("Account {0} is referenced by journal lines and cannot be deleted")]
    AccountInUse(AccountId),

    /// Account code already used in this tenant.
    #[error("Account code already exists: {0}")]
    DuplicateAccountCode(String),

    // ========== Entry State Errors ==========
    /// Entry does not exist in this tenant.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Content mutation attempted on a POSTED or VOID entry.
    #[error("Cannot modify {status} entry {entry_id}")]
    ImmutableEntry {
        /// The entry.
        entry_id: JournalEntryId,
        /// Its current status.
        status: EntryStatus,
    },

    /// Only POSTED entries can be reversed.
    #[error("Journal entry {0} is not posted")]
    NotPosted(JournalEntryId),

    /// Status change not allowed from the current status.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: EntryStatus,
        /// Requested status.
        to: EntryStatus,
    },

    // ========== Persistence Errors ==========
    /// The persistence hook failed; the operation was rolled back.
    #[error("Persistence failed: {0}")]
    Persistence(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::TwoSidedLine => "TWO_SIDED_LINE",
            Self::ZeroLine => "ZERO_LINE",
            Self::EmptyEntry(_) => "EMPTY_ENTRY",
            Self::DuplicateLineNumber(_) => "DUPLICATE_LINE_NUMBER",
            Self::LineNotFound(_) => "LINE_NOT_FOUND",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::InactiveAccount(_) => "INACTIVE_ACCOUNT",
            Self::AccountInUse(_) => "ACCOUNT_IN_USE",
            Self::DuplicateAccountCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::ImmutableEntry { .. } => "IMMUTABLE_ENTRY",
            Self::NotPosted(_) => "NOT_POSTED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Persistence(_) => "PERSISTENCE_FAILED",
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Returns true if the error refers to something missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownAccount(_) | Self::EntryNotFound(_) | Self::LineNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::Unbalanced {
                debit: dec!(500),
                credit: dec!(400)
            }
            .error_code(),
            "UNBALANCED"
        );
        assert_eq!(LedgerError::InvalidAmount.error_code(), "INVALID_AMOUNT");
        assert_eq!(
            LedgerError::AccountInUse(AccountId::new()).error_code(),
            "ACCOUNT_IN_USE"
        );
        assert_eq!(
            LedgerError::Persistence("io".into()).error_code(),
            "PERSISTENCE_FAILED"
        );
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Unbalanced {
            debit: dec!(500),
            credit: dec!(400),
        };
        assert_eq!(err.to_string(), "Entry is not balanced. Debit: 500, Credit: 400");

        let err = LedgerError::InvalidTransition {
            from: EntryStatus::Draft,
            to: EntryStatus::Void,
        };
        assert_eq!(err.to_string(), "Invalid status transition from DRAFT to VOID");
    }

    #[test]
    fn test_only_persistence_is_retryable() {
        assert!(LedgerError::Persistence("timeout".into()).is_retryable());
        assert!(!LedgerError::InvalidAmount.is_retryable());
        assert!(LedgerError::EntryNotFound(JournalEntryId::new()).is_not_found());
    }
}
