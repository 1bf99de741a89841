//! Bank reconciliation data types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{
    AccountId, AdjustmentId, JournalEntryId, ReconciliationId, StatementLineId, TenantId,
};

/// Kind of bank statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementLineType {
    /// Money paid in.
    Deposit,
    /// Money taken out.
    Withdrawal,
    /// Cleared check.
    Check,
    /// Transfer between accounts.
    Transfer,
    /// Bank fee.
    Fee,
    /// Interest credited.
    Interest,
    /// Correction made by the bank.
    Adjustment,
}

/// One line of a bank statement.
///
/// `amount` is signed from the bank's side: deposits positive, withdrawals negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankStatementLine {
    /// Statement line ID.
    pub id: StatementLineId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Bank account in the chart.
    pub account_id: AccountId,
    /// Date the bank booked the line.
    pub statement_date: NaiveDate,
    /// Bank description.
    pub description: String,
    /// Signed amount.
    pub amount: Decimal,
    /// Line kind.
    pub line_type: StatementLineType,
    /// Bank reference.
    pub reference_number: Option<String>,
    /// Check number for cleared checks.
    pub check_number: Option<String>,
    /// Bank transaction ID, unique per tenant.
    pub transaction_id: String,
    /// Whether the line has been matched against the books.
    pub is_reconciled: bool,
    /// Date the line was matched.
    pub reconciled_date: Option<NaiveDate>,
    /// Journal entry the line was matched to.
    pub journal_entry_id: Option<JournalEntryId>,
}

/// Input for importing a bank statement line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStatementLine {
    /// Bank account in the chart.
    pub account_id: AccountId,
    /// Date the bank booked the line.
    pub statement_date: NaiveDate,
    /// Bank description.
    pub description: String,
    /// Signed amount.
    pub amount: Decimal,
    /// Line kind.
    pub line_type: StatementLineType,
    /// Bank reference.
    #[serde(default)]
    pub reference_number: Option<String>,
    /// Check number.
    #[serde(default)]
    pub check_number: Option<String>,
    /// Bank transaction ID.
    pub transaction_id: String,
}

/// Reconciliation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationStatus {
    /// Adjustments may still be added.
    InProgress,
    /// Balanced and closed.
    Completed,
    /// Abandoned.
    Cancelled,
}

/// Reason for a reconciliation adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    /// Deposit booked but not yet on the statement.
    DepositInTransit,
    /// Check issued but not yet cleared.
    OutstandingCheck,
    /// Error on the bank's side.
    BankError,
    /// Error in the books.
    BookError,
    /// Interest the books have not recorded.
    InterestEarned,
    /// Fee the books have not recorded.
    BankFee,
    /// Anything else.
    Other,
}

/// An amount added to or subtracted from the book balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationAdjustment {
    /// Adjustment ID.
    pub id: AdjustmentId,
    /// Reason.
    pub adjustment_type: AdjustmentType,
    /// Free text.
    pub description: String,
    /// Unsigned amount.
    pub amount: Decimal,
    /// True to add to the book balance, false to subtract.
    pub is_addition: bool,
    /// Entry that records the adjustment in the books, if posted.
    pub journal_entry_id: Option<JournalEntryId>,
}

impl ReconciliationAdjustment {
    /// `amount` with the sign it applies to the book balance.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        if self.is_addition {
            self.amount
        } else {
            -self.amount
        }
    }
}

/// Input for an adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdjustment {
    /// Reason.
    pub adjustment_type: AdjustmentType,
    /// Free text.
    pub description: String,
    /// Unsigned amount, must be positive.
    pub amount: Decimal,
    /// True to add to the book balance.
    pub is_addition: bool,
    /// Entry that records the adjustment, if any.
    #[serde(default)]
    pub journal_entry_id: Option<JournalEntryId>,
}

/// A bank reconciliation for one account and statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankReconciliation {
    /// Reconciliation ID.
    pub id: ReconciliationId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Bank account in the chart.
    pub account_id: AccountId,
    /// Day the reconciliation is performed; unique per account.
    pub reconciliation_date: NaiveDate,
    /// Closing date of the bank statement.
    pub statement_date: NaiveDate,
    /// Posted ledger balance of the account as of `statement_date`.
    pub book_balance: Decimal,
    /// Closing balance printed on the statement.
    pub statement_balance: Decimal,
    /// `book_balance` plus the signed adjustments.
    pub adjusted_book_balance: Decimal,
    /// Status.
    pub status: ReconciliationStatus,
    /// Notes.
    pub notes: Option<String>,
    /// Adjustments in the order they were added.
    pub adjustments: Vec<ReconciliationAdjustment>,
    /// Ledger version `book_balance` was computed from.
    pub book_version: u64,
    /// When the reconciliation was completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl BankReconciliation {
    /// `adjusted_book_balance - book_balance`.
    #[must_use]
    pub fn adjustments_total(&self) -> Decimal {
        self.adjusted_book_balance - self.book_balance
    }

    /// Returns true if the adjusted book balance equals the statement balance.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.adjusted_book_balance == self.statement_balance
    }

    /// Statement balance minus adjusted book balance.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.statement_balance - self.adjusted_book_balance
    }

    pub(crate) fn refresh_adjusted(&mut self) {
        self.adjusted_book_balance = self.book_balance
            + self
                .adjustments
                .iter()
                .map(ReconciliationAdjustment::signed_amount)
                .sum::<Decimal>();
    }
}

/// Input for starting a reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReconciliation {
    /// Bank account in the chart.
    pub account_id: AccountId,
    /// Day the reconciliation is performed.
    pub reconciliation_date: NaiveDate,
    /// Closing date of the bank statement.
    pub statement_date: NaiveDate,
    /// Closing balance printed on the statement.
    pub statement_balance: Decimal,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A reconciliation with the statement lines it covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationWorksheet {
    /// The reconciliation, with its book balance current.
    pub reconciliation: BankReconciliation,
    /// Lines dated on or before the statement date not yet matched.
    pub unreconciled: Vec<BankStatementLine>,
    /// Lines dated on or before the statement date matched on or before
    /// the reconciliation date.
    pub reconciled: Vec<BankStatementLine>,
    /// Σ amount of the unreconciled lines.
    pub unreconciled_total: Decimal,
    /// `adjusted_book_balance == statement_balance`.
    pub is_balanced: bool,
}
