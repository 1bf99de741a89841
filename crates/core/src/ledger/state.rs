//! Versioned ledger state and the read-only snapshots handed to readers.

use std::collections::BTreeMap;
use std::sync::Arc;

use tally_shared::types::{
    AccountId, BillId, ExpenseId, InvoiceId, JournalEntryId, PaymentId, TenantId,
};

use super::types::{Account, EntryStatus, JournalEntry};
use crate::subledger::types::{Bill, Expense, Invoice, Payment};

/// Everything one tenant's ledger holds.
///
/// Mutated only through `LedgerStore`, which bumps `version` on every
/// content change.
#[derive(Debug, Clone)]
pub struct LedgerState {
    pub(crate) tenant_id: TenantId,
    pub(crate) version: u64,
    pub(crate) next_entry_seq: u64,
    pub(crate) accounts: BTreeMap<AccountId, Account>,
    pub(crate) entries: BTreeMap<JournalEntryId, JournalEntry>,
    pub(crate) invoices: BTreeMap<InvoiceId, Invoice>,
    pub(crate) payments: BTreeMap<PaymentId, Payment>,
    pub(crate) bills: BTreeMap<BillId, Bill>,
    pub(crate) expenses: BTreeMap<ExpenseId, Expense>,
}

impl LedgerState {
    /// Creates an empty ledger for `tenant_id`.
    #[must_use]
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            version: 0,
            next_entry_seq: 1,
            accounts: BTreeMap::new(),
            entries: BTreeMap::new(),
            invoices: BTreeMap::new(),
            payments: BTreeMap::new(),
            bills: BTreeMap::new(),
            expenses: BTreeMap::new(),
        }
    }

    pub(crate) fn account_code_taken(&self, code: &str) -> bool {
        self.accounts.values().any(|account| account.code == code)
    }

    pub(crate) fn is_account_referenced(&self, account_id: AccountId) -> bool {
        self.entries.values().any(|entry| entry.references(account_id))
            || self
                .expenses
                .values()
                .any(|expense| expense.account_id == Some(account_id))
    }
}

/// An immutable view of the ledger at one version.
///
/// Cheap to clone; later writes never change what a snapshot sees.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    state: Arc<LedgerState>,
}

impl LedgerSnapshot {
    pub(crate) fn new(state: Arc<LedgerState>) -> Self {
        Self { state }
    }

    /// Tenant the snapshot belongs to.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.state.tenant_id
    }

    /// Ledger version this snapshot was taken at.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.version
    }

    /// Looks up an account.
    #[must_use]
    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.state.accounts.get(&id)
    }

    /// Looks up an account by its code.
    #[must_use]
    pub fn account_by_code(&self, code: &str) -> Option<&Account> {
        self.state.accounts.values().find(|account| account.code == code)
    }

    /// All accounts in ID order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.state.accounts.values()
    }

    /// All accounts ordered by code.
    #[must_use]
    pub fn accounts_by_code(&self) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self.state.accounts.values().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        accounts
    }

    /// Looks up a journal entry.
    #[must_use]
    pub fn entry(&self, id: JournalEntryId) -> Option<&JournalEntry> {
        self.state.entries.get(&id)
    }

    /// All journal entries, any status.
    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.state.entries.values()
    }

    /// POSTED journal entries only.
    pub fn posted_entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries()
            .filter(|entry| entry.status == EntryStatus::Posted)
    }

    /// Returns true if any journal line or expense references the account.
    #[must_use]
    pub fn is_account_referenced(&self, account_id: AccountId) -> bool {
        self.state.is_account_referenced(account_id)
    }

    /// Looks up an invoice.
    #[must_use]
    pub fn invoice(&self, id: InvoiceId) -> Option<&Invoice> {
        self.state.invoices.get(&id)
    }

    /// All invoices.
    pub fn invoices(&self) -> impl Iterator<Item = &Invoice> {
        self.state.invoices.values()
    }

    /// All customer payments.
    pub fn payments(&self) -> impl Iterator<Item = &Payment> {
        self.state.payments.values()
    }

    /// Looks up a bill.
    #[must_use]
    pub fn bill(&self, id: BillId) -> Option<&Bill> {
        self.state.bills.get(&id)
    }

    /// All vendor bills.
    pub fn bills(&self) -> impl Iterator<Item = &Bill> {
        self.state.bills.values()
    }

    /// Looks up an expense.
    #[must_use]
    pub fn expense(&self, id: ExpenseId) -> Option<&Expense> {
        self.state.expenses.get(&id)
    }

    /// All expenses.
    pub fn expenses(&self) -> impl Iterator<Item = &Expense> {
        self.state.expenses.values()
    }
}
