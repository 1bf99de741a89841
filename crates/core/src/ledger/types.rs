//! Ledger domain types: accounts, journal entries, and their lines.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, JournalEntryId, TenantId, UserId};

use crate::balance::NormalBalance;

/// Account classification in the chart of accounts.
///
/// The class decides the sign convention used for balances:
/// - Asset/Expense: balance = debit - credit
/// - Liability/Equity/Revenue: balance = credit - debit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountClass {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

impl AccountClass {
    /// All classes in chart-of-accounts order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Returns the side on which this class normally carries its balance.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Returns true for classes reported on the balance sheet.
    #[must_use]
    pub const fn is_balance_sheet(self) -> bool {
        matches!(self, Self::Asset | Self::Liability | Self::Equity)
    }

    /// Returns true for classes reported on the profit and loss statement.
    #[must_use]
    pub const fn is_income_statement(self) -> bool {
        matches!(self, Self::Revenue | Self::Expense)
    }
}

impl std::fmt::Display for AccountClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Revenue => "REVENUE",
            Self::Expense => "EXPENSE",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for AccountClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ASSET" => Ok(Self::Asset),
            "LIABILITY" => Ok(Self::Liability),
            "EQUITY" => Ok(Self::Equity),
            "REVENUE" => Ok(Self::Revenue),
            "EXPENSE" => Ok(Self::Expense),
            _ => Err(format!("Unknown account class: {s}")),
        }
    }
}

/// A chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Unique, sortable code (e.g. "1000").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account class.
    pub class: AccountClass,
    /// Informational parent; never used in balance math.
    pub parent_id: Option<AccountId>,
    /// Inactive accounts accept no new lines.
    pub is_active: bool,
    /// Marks cash and bank accounts for cash reports.
    pub cash_equivalent: bool,
    /// Display hint only. Refreshed explicitly, never read as truth.
    pub cached_balance: Decimal,
    /// Ledger version the cached balance was computed at.
    pub cached_at_version: Option<u64>,
}

impl Account {
    /// Returns true if the cached balance was computed at `version`.
    #[must_use]
    pub fn cache_is_current(&self, version: u64) -> bool {
        self.cached_at_version == Some(version)
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account class.
    pub class: AccountClass,
    /// Optional parent account.
    #[serde(default)]
    pub parent_id: Option<AccountId>,
    /// Cash or bank account.
    #[serde(default)]
    pub cash_equivalent: bool,
}

impl NewAccount {
    /// Creates input for a top-level, non-cash account.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, class: AccountClass) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            class,
            parent_id: None,
            cash_equivalent: false,
        }
    }

    /// Sets the parent account.
    #[must_use]
    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Marks the account as cash or bank.
    #[must_use]
    pub fn cash(mut self) -> Self {
        self.cash_equivalent = true;
        self
    }
}

/// Journal entry status.
///
/// DRAFT -> POSTED -> VOID. Only drafts can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// Being prepared; lines can change.
    Draft,
    /// Part of the ledger (immutable).
    Posted,
    /// Reversed by flag; kept but excluded from balances.
    Void,
}

impl EntryStatus {
    /// Returns true if lines can still be modified.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the entry content is frozen.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted | Self::Void)
    }

    /// Returns true if the status may move to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Draft, Self::Posted) | (Self::Posted, Self::Void))
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => f.write_str("DRAFT"),
            Self::Posted => f.write_str("POSTED"),
            Self::Void => f.write_str("VOID"),
        }
    }
}

/// One debit or credit line of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Display and tie-break order within the entry.
    pub line_number: u32,
    /// Referenced account.
    pub account_id: AccountId,
    /// Debit amount, never negative.
    pub debit: Decimal,
    /// Credit amount, never negative.
    pub credit: Decimal,
}

/// A journal entry and the lines it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Unique human-readable number.
    pub entry_number: String,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Description.
    pub description: String,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// Lines ordered by `line_number`.
    pub lines: Vec<JournalLine>,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// When the entry was posted.
    pub posted_at: Option<DateTime<Utc>>,
    /// Who posted the entry.
    pub posted_by: Option<UserId>,
    /// When the entry was voided.
    pub voided_at: Option<DateTime<Utc>>,
    /// Entry this one reverses, if any.
    pub reversal_of: Option<JournalEntryId>,
}

impl JournalEntry {
    /// Recomputes `total_debit`/`total_credit` from the lines.
    ///
    /// Called by the store after every line mutation.
    pub fn recompute_totals(&mut self) {
        self.lines.sort_by_key(|line| line.line_number);
        self.total_debit = self.lines.iter().map(|line| line.debit).sum();
        self.total_credit = self.lines.iter().map(|line| line.credit).sum();
    }

    /// Returns true if debits equal credits exactly.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }

    /// Returns true if any line references `account_id`.
    #[must_use]
    pub fn references(&self, account_id: AccountId) -> bool {
        self.lines.iter().any(|line| line.account_id == account_id)
    }

    /// Returns the distinct accounts touched by this entry.
    #[must_use]
    pub fn account_ids(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self.lines.iter().map(|line| line.account_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Returns the line with `line_number`, if present.
    #[must_use]
    pub fn line(&self, line_number: u32) -> Option<&JournalLine> {
        self.lines.iter().find(|line| line.line_number == line_number)
    }
}

/// Handle to a DRAFT entry returned by `create_entry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftHandle {
    /// The draft entry.
    pub entry_id: JournalEntryId,
    /// Its generated entry number.
    pub entry_number: String,
}
