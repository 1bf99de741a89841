//! Bank reconciler: statement import, matching, and balancing.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{
    AdjustmentId, JournalEntryId, ReconciliationId, StatementLineId, TenantId,
};
use tracing::debug;

use super::error::ReconciliationError;
use super::types::{
    BankReconciliation, BankStatementLine, NewAdjustment, NewReconciliation, NewStatementLine,
    ReconciliationAdjustment, ReconciliationStatus, ReconciliationWorksheet,
};
use crate::balance::{BalanceAggregator, BalanceQuery};
use crate::ledger::state::LedgerSnapshot;
use crate::ledger::types::EntryStatus;

/// Bank reconciliation logic.
///
/// Works on copies like the budget reconciler: every method returns the
/// updated record and storing it is the caller's job.
pub struct BankReconciler;

impl BankReconciler {
    /// Validates and builds an unmatched statement line.
    ///
    /// # Errors
    ///
    /// `ZeroAmount`, `UnknownAccount`, or `DuplicateTransaction` if any of
    /// `existing` carries the same bank transaction ID.
    pub fn import_line<'a>(
        tenant_id: TenantId,
        snapshot: &LedgerSnapshot,
        existing: impl IntoIterator<Item = &'a BankStatementLine>,
        input: NewStatementLine,
    ) -> Result<BankStatementLine, ReconciliationError> {
        if input.amount.is_zero() {
            return Err(ReconciliationError::ZeroAmount);
        }
        if snapshot.account(input.account_id).is_none() {
            return Err(ReconciliationError::UnknownAccount(input.account_id));
        }
        if existing
            .into_iter()
            .any(|line| line.transaction_id == input.transaction_id)
        {
            return Err(ReconciliationError::DuplicateTransaction(input.transaction_id));
        }

        Ok(BankStatementLine {
            id: StatementLineId::new(),
            tenant_id,
            account_id: input.account_id,
            statement_date: input.statement_date,
            description: input.description,
            amount: input.amount,
            line_type: input.line_type,
            reference_number: input.reference_number,
            check_number: input.check_number,
            transaction_id: input.transaction_id,
            is_reconciled: false,
            reconciled_date: None,
            journal_entry_id: None,
        })
    }

    /// Marks a line as matched on `on`, optionally against a posted entry.
    ///
    /// # Errors
    ///
    /// `AlreadyReconciled`, `UnknownEntry`, or `EntryNotPosted`.
    pub fn match_line(
        line: &BankStatementLine,
        snapshot: &LedgerSnapshot,
        entry_id: Option<JournalEntryId>,
        on: NaiveDate,
    ) -> Result<BankStatementLine, ReconciliationError> {
        if line.is_reconciled {
            return Err(ReconciliationError::AlreadyReconciled(line.id));
        }
        if let Some(entry_id) = entry_id {
            Self::require_posted(snapshot, entry_id)?;
        }

        Ok(BankStatementLine {
            is_reconciled: true,
            reconciled_date: Some(on),
            journal_entry_id: entry_id,
            ..line.clone()
        })
    }

    /// Opens a reconciliation with the book balance as of the statement date.
    ///
    /// # Errors
    ///
    /// - `StatementAfterReconciliation` if the statement closes later than
    ///   the reconciliation date
    /// - `UnknownAccount` if the account is not in the ledger
    /// - `DuplicateReconciliation` if `existing` already reconciles the
    ///   account on that day
    pub fn start<'a>(
        tenant_id: TenantId,
        snapshot: &LedgerSnapshot,
        existing: impl IntoIterator<Item = &'a BankReconciliation>,
        input: NewReconciliation,
    ) -> Result<BankReconciliation, ReconciliationError> {
        if input.statement_date > input.reconciliation_date {
            return Err(ReconciliationError::StatementAfterReconciliation {
                statement: input.statement_date,
                reconciliation: input.reconciliation_date,
            });
        }
        let book_balance = BalanceAggregator::balance(
            snapshot,
            input.account_id,
            &BalanceQuery::as_of(input.statement_date),
        )
        .map_err(|_| ReconciliationError::UnknownAccount(input.account_id))?;
        if existing.into_iter().any(|other| {
            other.account_id == input.account_id
                && other.reconciliation_date == input.reconciliation_date
        }) {
            return Err(ReconciliationError::DuplicateReconciliation {
                account_id: input.account_id,
                date: input.reconciliation_date,
            });
        }

        Ok(BankReconciliation {
            id: ReconciliationId::new(),
            tenant_id,
            account_id: input.account_id,
            reconciliation_date: input.reconciliation_date,
            statement_date: input.statement_date,
            book_balance,
            statement_balance: input.statement_balance,
            adjusted_book_balance: book_balance,
            status: ReconciliationStatus::InProgress,
            notes: input.notes,
            adjustments: Vec::new(),
            book_version: snapshot.version(),
            completed_at: None,
        })
    }

    /// Adds an adjustment and recomputes the adjusted book balance.
    ///
    /// # Errors
    ///
    /// `Closed`, `NonPositiveAmount`, `UnknownEntry`, or `EntryNotPosted`.
    pub fn add_adjustment(
        reconciliation: &BankReconciliation,
        snapshot: &LedgerSnapshot,
        input: NewAdjustment,
    ) -> Result<BankReconciliation, ReconciliationError> {
        Self::require_open(reconciliation)?;
        if input.amount <= Decimal::ZERO {
            return Err(ReconciliationError::NonPositiveAmount(input.amount));
        }
        if let Some(entry_id) = input.journal_entry_id {
            Self::require_posted(snapshot, entry_id)?;
        }

        let mut updated = reconciliation.clone();
        updated.adjustments.push(ReconciliationAdjustment {
            id: AdjustmentId::new(),
            adjustment_type: input.adjustment_type,
            description: input.description,
            amount: input.amount,
            is_addition: input.is_addition,
            journal_entry_id: input.journal_entry_id,
        });
        updated.refresh_adjusted();
        Ok(updated)
    }

    /// Re-derives the book balance of an open reconciliation from `snapshot`.
    ///
    /// Entries backdated on or before the statement date change it.
    /// Completed and cancelled reconciliations are returned unchanged.
    #[must_use]
    pub fn refresh(reconciliation: &BankReconciliation, snapshot: &LedgerSnapshot) -> BankReconciliation {
        if reconciliation.status != ReconciliationStatus::InProgress
            || reconciliation.book_version == snapshot.version()
        {
            return reconciliation.clone();
        }

        let mut updated = reconciliation.clone();
        if let Ok(balance) = BalanceAggregator::balance(
            snapshot,
            reconciliation.account_id,
            &BalanceQuery::as_of(reconciliation.statement_date),
        ) {
            updated.book_balance = balance;
        }
        updated.book_version = snapshot.version();
        updated.refresh_adjusted();

        debug!(
            tenant_id = %reconciliation.tenant_id,
            reconciliation_id = %reconciliation.id,
            version = snapshot.version(),
            book_balance = %updated.book_balance,
            "reconciliation refreshed"
        );
        updated
    }

    /// Refreshes, then closes a balanced reconciliation.
    ///
    /// # Errors
    ///
    /// `Closed`, or `Unbalanced` if the adjusted book balance still differs
    /// from the statement balance.
    pub fn complete(
        reconciliation: &BankReconciliation,
        snapshot: &LedgerSnapshot,
        now: DateTime<Utc>,
    ) -> Result<BankReconciliation, ReconciliationError> {
        Self::require_open(reconciliation)?;
        let refreshed = Self::refresh(reconciliation, snapshot);
        if !refreshed.is_balanced() {
            return Err(ReconciliationError::Unbalanced {
                adjusted: refreshed.adjusted_book_balance,
                statement: refreshed.statement_balance,
            });
        }

        Ok(BankReconciliation {
            status: ReconciliationStatus::Completed,
            completed_at: Some(now),
            ..refreshed
        })
    }

    /// Abandons an open reconciliation.
    ///
    /// # Errors
    ///
    /// `Closed` unless the reconciliation is in progress.
    pub fn cancel(reconciliation: &BankReconciliation) -> Result<BankReconciliation, ReconciliationError> {
        Self::require_open(reconciliation)?;
        Ok(BankReconciliation {
            status: ReconciliationStatus::Cancelled,
            ..reconciliation.clone()
        })
    }

    /// Splits the account's statement lines into unreconciled and
    /// reconciled as of the reconciliation.
    ///
    /// Only lines dated on or before the statement date are listed. A line
    /// counts as reconciled when it was matched on or before the
    /// reconciliation date; one matched later was still open then. Each
    /// list is ordered by statement date.
    #[must_use]
    pub fn worksheet<'a>(
        reconciliation: &BankReconciliation,
        lines: impl IntoIterator<Item = &'a BankStatementLine>,
    ) -> ReconciliationWorksheet {
        let (mut reconciled, mut unreconciled): (Vec<_>, Vec<_>) = lines
            .into_iter()
            .filter(|line| {
                line.account_id == reconciliation.account_id
                    && line.statement_date <= reconciliation.statement_date
            })
            .cloned()
            .partition(|line| {
                line.is_reconciled
                    && line
                        .reconciled_date
                        .is_some_and(|on| on <= reconciliation.reconciliation_date)
            });
        reconciled.sort_by_key(|line| line.statement_date);
        unreconciled.sort_by_key(|line| line.statement_date);

        ReconciliationWorksheet {
            unreconciled_total: unreconciled.iter().map(|line| line.amount).sum(),
            is_balanced: reconciliation.is_balanced(),
            reconciliation: reconciliation.clone(),
            unreconciled,
            reconciled,
        }
    }

    fn require_open(reconciliation: &BankReconciliation) -> Result<(), ReconciliationError> {
        if reconciliation.status != ReconciliationStatus::InProgress {
            return Err(ReconciliationError::Closed {
                id: reconciliation.id,
                status: reconciliation.status,
            });
        }
        Ok(())
    }

    fn require_posted(snapshot: &LedgerSnapshot, entry_id: JournalEntryId) -> Result<(), ReconciliationError> {
        let entry = snapshot
            .entry(entry_id)
            .ok_or(ReconciliationError::UnknownEntry(entry_id))?;
        if entry.status != EntryStatus::Posted {
            return Err(ReconciliationError::EntryNotPosted(entry_id));
        }
        Ok(())
    }
}
