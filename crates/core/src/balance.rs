//! Account balance calculations.
//!
//! Balances are always derived by scanning journal lines in a
//! [`LedgerSnapshot`]; nothing here reads or writes `cached_balance`.
//!
//! Sign convention by account class:
//! - Asset/Expense: balance = Σdebit - Σcredit (debit-normal)
//! - Liability/Equity/Revenue: balance = Σcredit - Σdebit (credit-normal)

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

use crate::ledger::error::LedgerError;
use crate::ledger::state::LedgerSnapshot;
use crate::ledger::types::{Account, EntryStatus, JournalEntry};

/// Side on which an account class normally carries its balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Debit-normal accounts (Asset, Expense).
    Debit,
    /// Credit-normal accounts (Liability, Equity, Revenue).
    Credit,
}

impl NormalBalance {
    /// Applies the sign convention to debit and credit totals.
    #[must_use]
    pub fn signed(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Which lines count toward a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceQuery {
    /// Earliest entry date included, if bounded.
    pub from: Option<NaiveDate>,
    /// Latest entry date included, if bounded.
    pub as_of: Option<NaiveDate>,
    /// Count only POSTED entries; otherwise DRAFT entries count too.
    pub posted_only: bool,
}

impl Default for BalanceQuery {
    fn default() -> Self {
        Self::posted()
    }
}

impl BalanceQuery {
    /// All posted entries, no date bounds.
    #[must_use]
    pub const fn posted() -> Self {
        Self {
            from: None,
            as_of: None,
            posted_only: true,
        }
    }

    /// Posted entries dated on or before `as_of`.
    #[must_use]
    pub const fn as_of(as_of: NaiveDate) -> Self {
        Self {
            from: None,
            as_of: Some(as_of),
            posted_only: true,
        }
    }

    /// Posted entries dated within `[from, to]`.
    #[must_use]
    pub const fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            as_of: Some(to),
            posted_only: true,
        }
    }

    /// Same bounds, DRAFT entries included.
    #[must_use]
    pub const fn including_drafts(self) -> Self {
        Self {
            posted_only: false,
            ..self
        }
    }

    /// Returns true if `entry` contributes to balances under this query.
    ///
    /// VOID entries never contribute.
    #[must_use]
    pub fn admits(&self, entry: &JournalEntry) -> bool {
        let status_ok = match entry.status {
            EntryStatus::Posted => true,
            EntryStatus::Draft => !self.posted_only,
            EntryStatus::Void => false,
        };
        status_ok
            && self.from.is_none_or(|from| entry.entry_date >= from)
            && self.as_of.is_none_or(|as_of| entry.entry_date <= as_of)
    }
}

/// Debit and credit totals of one account plus its signed balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Net balance after the sign convention.
    pub balance: Decimal,
}

impl AccountBalance {
    /// Creates a zero balance.
    #[must_use]
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    fn add(&mut self, debit: Decimal, credit: Decimal) {
        self.debit_total += debit;
        self.credit_total += credit;
    }

    fn finish(mut self, account: &Account) -> Self {
        self.balance = account
            .class
            .normal_balance()
            .signed(self.debit_total, self.credit_total);
        self
    }
}

/// Pure, read-only balance computations over a snapshot.
pub struct BalanceAggregator;

impl BalanceAggregator {
    /// Signed balance of one account.
    ///
    /// # Errors
    ///
    /// `UnknownAccount` if the account is not in the snapshot.
    pub fn balance(
        snapshot: &LedgerSnapshot,
        account_id: AccountId,
        query: &BalanceQuery,
    ) -> Result<Decimal, LedgerError> {
        Self::account_balance(snapshot, account_id, query).map(|b| b.balance)
    }

    /// Debit/credit totals and signed balance of one account.
    ///
    /// # Errors
    ///
    /// `UnknownAccount` if the account is not in the snapshot.
    pub fn account_balance(
        snapshot: &LedgerSnapshot,
        account_id: AccountId,
        query: &BalanceQuery,
    ) -> Result<AccountBalance, LedgerError> {
        let account = snapshot
            .account(account_id)
            .ok_or(LedgerError::UnknownAccount(account_id))?;

        let mut totals = AccountBalance::new(account_id);
        for entry in snapshot.entries().filter(|entry| query.admits(entry)) {
            for line in entry.lines.iter().filter(|line| line.account_id == account_id) {
                totals.add(line.debit, line.credit);
            }
        }
        Ok(totals.finish(account))
    }

    /// Balances of every account in the snapshot, computed in one pass.
    ///
    /// Accounts without qualifying lines are present with zero totals.
    #[must_use]
    pub fn all_balances(
        snapshot: &LedgerSnapshot,
        query: &BalanceQuery,
    ) -> BTreeMap<AccountId, AccountBalance> {
        let mut totals: BTreeMap<AccountId, AccountBalance> = snapshot
            .accounts()
            .map(|account| (account.id, AccountBalance::new(account.id)))
            .collect();

        for entry in snapshot.entries().filter(|entry| query.admits(entry)) {
            for line in &entry.lines {
                if let Some(total) = totals.get_mut(&line.account_id) {
                    total.add(line.debit, line.credit);
                }
            }
        }

        totals
            .into_iter()
            .filter_map(|(id, total)| snapshot.account(id).map(|account| (id, total.finish(account))))
            .collect()
    }
}
