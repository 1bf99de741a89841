//! The ledger store: system of record for accounts and journal entries.
//!
//! Writers serialize on a `parking_lot::RwLock` and copy-on-write the shared
//! state, so readers holding a [`LedgerSnapshot`] are never blocked and never
//! observe a half-applied change. Each write is validated against the current
//! state, handed to the [`LedgerSink`], and only then published.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::{RwLock, RwLockWriteGuard};
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, JournalEntryId, TenantId, UserId};
use tracing::{debug, error, info};

use super::error::LedgerError;
use super::sink::{LedgerSink, NoopSink};
use super::state::{LedgerSnapshot, LedgerState};
use super::types::{
    Account, DraftHandle, EntryStatus, JournalEntry, JournalLine, NewAccount,
};
use super::validation::{usable_account, validate_for_posting, validate_line_amounts};
use crate::balance::{BalanceAggregator, BalanceQuery};

pub(crate) type StateGuard<'a> = RwLockWriteGuard<'a, Arc<LedgerState>>;

/// One tenant's ledger.
pub struct LedgerStore {
    tenant_id: TenantId,
    entry_number_prefix: String,
    state: RwLock<Arc<LedgerState>>,
    sink: Arc<dyn LedgerSink>,
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("tenant_id", &self.tenant_id)
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

impl LedgerStore {
    /// Creates an empty in-memory ledger.
    #[must_use]
    pub fn new(tenant_id: TenantId) -> Self {
        Self::with_sink(tenant_id, Arc::new(NoopSink), "JE")
    }

    /// Creates an empty ledger that persists through `sink`.
    #[must_use]
    pub fn with_sink(
        tenant_id: TenantId,
        sink: Arc<dyn LedgerSink>,
        entry_number_prefix: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            entry_number_prefix: entry_number_prefix.into(),
            state: RwLock::new(Arc::new(LedgerState::new(tenant_id))),
            sink,
        }
    }

    /// Tenant this ledger belongs to.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns a consistent read-only view of the current version.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::new(Arc::clone(&self.state.read()))
    }

    /// Current ledger version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    /// Returns a copy of an entry.
    #[must_use]
    pub fn entry(&self, entry_id: JournalEntryId) -> Option<JournalEntry> {
        self.state.read().entries.get(&entry_id).cloned()
    }

    /// Returns a copy of an account.
    #[must_use]
    pub fn account(&self, account_id: AccountId) -> Option<Account> {
        self.state.read().accounts.get(&account_id).cloned()
    }

    pub(crate) fn write(&self) -> StateGuard<'_> {
        self.state.write()
    }

    /// Applies `change` and publishes the result as the next version.
    pub(crate) fn publish(guard: &mut StateGuard<'_>, change: impl FnOnce(&mut LedgerState)) -> u64 {
        let state = Arc::make_mut(guard);
        change(state);
        state.version += 1;
        state.version
    }

    fn persist_entry(&self, entry: &JournalEntry) -> Result<(), LedgerError> {
        self.sink.save_entry(self.tenant_id, entry).map_err(|err| {
            error!(
                tenant_id = %self.tenant_id,
                entry_id = %entry.id,
                error = %err,
                "persisting journal entry failed, change rolled back"
            );
            LedgerError::Persistence(err.to_string())
        })
    }

    fn persist_account(&self, account: &Account) -> Result<(), LedgerError> {
        self.sink.save_account(self.tenant_id, account).map_err(|err| {
            error!(
                tenant_id = %self.tenant_id,
                account_id = %account.id,
                error = %err,
                "persisting account failed, change rolled back"
            );
            LedgerError::Persistence(err.to_string())
        })
    }

    // ========== Accounts ==========

    /// Adds an account to the chart of accounts.
    ///
    /// # Errors
    ///
    /// `DuplicateAccountCode`, `UnknownAccount` for a missing parent, or
    /// `Persistence`.
    pub fn create_account(&self, input: NewAccount) -> Result<Account, LedgerError> {
        let mut guard = self.write();

        if guard.account_code_taken(&input.code) {
            return Err(LedgerError::DuplicateAccountCode(input.code));
        }
        if let Some(parent_id) = input.parent_id {
            if !guard.accounts.contains_key(&parent_id) {
                return Err(LedgerError::UnknownAccount(parent_id));
            }
        }

        let account = Account {
            id: AccountId::new(),
            tenant_id: self.tenant_id,
            code: input.code,
            name: input.name,
            class: input.class,
            parent_id: input.parent_id,
            is_active: true,
            cash_equivalent: input.cash_equivalent,
            cached_balance: Decimal::ZERO,
            cached_at_version: None,
        };

        self.persist_account(&account)?;
        Self::publish(&mut guard, |state| {
            state.accounts.insert(account.id, account.clone());
        });

        debug!(tenant_id = %self.tenant_id, code = %account.code, "account created");
        Ok(account)
    }

    /// Deactivates an account; it keeps its history but accepts no new lines.
    ///
    /// # Errors
    ///
    /// `UnknownAccount` or `Persistence`.
    pub fn deactivate_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.set_account_active(account_id, false)
    }

    /// Reactivates a deactivated account.
    ///
    /// # Errors
    ///
    /// `UnknownAccount` or `Persistence`.
    pub fn reactivate_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.set_account_active(account_id, true)
    }

    fn set_account_active(&self, account_id: AccountId, active: bool) -> Result<Account, LedgerError> {
        let mut guard = self.write();
        let mut account = guard
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(LedgerError::UnknownAccount(account_id))?;

        if account.is_active == active {
            return Ok(account);
        }
        account.is_active = active;

        self.persist_account(&account)?;
        Self::publish(&mut guard, |state| {
            state.accounts.insert(account_id, account.clone());
        });
        Ok(account)
    }

    /// Deletes an account that no journal line references.
    ///
    /// Child accounts are detached rather than deleted.
    ///
    /// # Errors
    ///
    /// `UnknownAccount`, `AccountInUse`, or `Persistence`.
    pub fn delete_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        let mut guard = self.write();
        let account = guard
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(LedgerError::UnknownAccount(account_id))?;

        if guard.is_account_referenced(account_id) {
            return Err(LedgerError::AccountInUse(account_id));
        }

        let children: Vec<Account> = guard
            .accounts
            .values()
            .filter(|child| child.parent_id == Some(account_id))
            .map(|child| Account {
                parent_id: None,
                ..child.clone()
            })
            .collect();

        // Children are detached in the sink first so a failed delete never
        // leaves them pointing at a missing parent.
        for child in &children {
            self.persist_account(child)?;
        }
        self.sink
            .delete_account(self.tenant_id, account_id)
            .map_err(|err| LedgerError::Persistence(err.to_string()))?;

        Self::publish(&mut guard, |state| {
            state.accounts.remove(&account_id);
            for child in children {
                state.accounts.insert(child.id, child);
            }
        });

        info!(tenant_id = %self.tenant_id, code = %account.code, "account deleted");
        Ok(account)
    }

    // ========== Drafting ==========

    /// Creates an empty DRAFT entry with the next entry number.
    ///
    /// # Errors
    ///
    /// `Persistence` if the sink rejects the new entry.
    pub fn create_entry(
        &self,
        entry_date: NaiveDate,
        description: impl Into<String>,
    ) -> Result<DraftHandle, LedgerError> {
        let mut guard = self.write();
        let entry = JournalEntry {
            id: JournalEntryId::new(),
            tenant_id: self.tenant_id,
            entry_number: self.entry_number(guard.next_entry_seq),
            entry_date,
            description: description.into(),
            status: EntryStatus::Draft,
            lines: Vec::new(),
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            posted_at: None,
            posted_by: None,
            voided_at: None,
            reversal_of: None,
        };

        self.insert_new_entry(&mut guard, &entry)?;
        Ok(DraftHandle {
            entry_id: entry.id,
            entry_number: entry.entry_number,
        })
    }

    fn entry_number(&self, seq: u64) -> String {
        format!("{}-{seq:06}", self.entry_number_prefix)
    }

    fn insert_new_entry(
        &self,
        guard: &mut StateGuard<'_>,
        entry: &JournalEntry,
    ) -> Result<(), LedgerError> {
        self.persist_entry(entry)?;
        Self::publish(guard, |state| {
            state.entries.insert(entry.id, entry.clone());
            state.next_entry_seq += 1;
        });
        Ok(())
    }

    /// Adds a line to a DRAFT entry and recomputes its totals.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`, `ZeroLine`, `TwoSidedLine` for bad amounts
    /// - `UnknownAccount` / `InactiveAccount`
    /// - `DuplicateLineNumber`
    /// - `EntryNotFound` / `ImmutableEntry`
    /// - `Persistence`
    pub fn add_line(
        &self,
        handle: &DraftHandle,
        account_id: AccountId,
        debit: Decimal,
        credit: Decimal,
        line_number: u32,
    ) -> Result<JournalEntry, LedgerError> {
        validate_line_amounts(debit, credit)?;

        self.mutate_draft(handle.entry_id, |state, draft| {
            usable_account(state, account_id)?;
            if draft.line(line_number).is_some() {
                return Err(LedgerError::DuplicateLineNumber(line_number));
            }
            draft.lines.push(JournalLine {
                line_number,
                account_id,
                debit,
                credit,
            });
            Ok(())
        })
    }

    /// Replaces the amounts of an existing DRAFT line.
    ///
    /// # Errors
    ///
    /// Same amount rules as [`Self::add_line`], plus `LineNotFound`.
    pub fn update_line(
        &self,
        handle: &DraftHandle,
        line_number: u32,
        debit: Decimal,
        credit: Decimal,
    ) -> Result<JournalEntry, LedgerError> {
        validate_line_amounts(debit, credit)?;

        self.mutate_draft(handle.entry_id, |_, draft| {
            let line = draft
                .lines
                .iter_mut()
                .find(|line| line.line_number == line_number)
                .ok_or(LedgerError::LineNotFound(line_number))?;
            line.debit = debit;
            line.credit = credit;
            Ok(())
        })
    }

    /// Removes a line from a DRAFT entry.
    ///
    /// # Errors
    ///
    /// `LineNotFound`, `EntryNotFound`, `ImmutableEntry`, or `Persistence`.
    pub fn remove_line(&self, handle: &DraftHandle, line_number: u32) -> Result<JournalEntry, LedgerError> {
        self.mutate_draft(handle.entry_id, |_, draft| {
            let before = draft.lines.len();
            draft.lines.retain(|line| line.line_number != line_number);
            if draft.lines.len() == before {
                return Err(LedgerError::LineNotFound(line_number));
            }
            Ok(())
        })
    }

    fn mutate_draft(
        &self,
        entry_id: JournalEntryId,
        edit: impl FnOnce(&LedgerState, &mut JournalEntry) -> Result<(), LedgerError>,
    ) -> Result<JournalEntry, LedgerError> {
        let mut guard = self.write();
        let current = guard
            .entries
            .get(&entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        if !current.status.is_editable() {
            return Err(LedgerError::ImmutableEntry {
                entry_id,
                status: current.status,
            });
        }

        let mut draft = current.clone();
        edit(&**guard, &mut draft)?;
        draft.recompute_totals();

        self.persist_entry(&draft)?;
        Self::publish(&mut guard, |state| {
            state.entries.insert(entry_id, draft.clone());
        });
        Ok(draft)
    }

    // ========== Posting ==========

    /// Posts a DRAFT entry.
    ///
    /// Totals are recomputed from the lines, then the entry is checked for
    /// lines, usable accounts, and debit/credit equality. Validation, the
    /// sink call, and the status flip happen under one write lock; on any
    /// error the entry stays DRAFT.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound`
    /// - `InvalidTransition` if the entry is not DRAFT
    /// - `EmptyEntry`, `UnknownAccount`, `InactiveAccount`, `Unbalanced`
    /// - `Persistence`
    pub fn post(
        &self,
        entry_id: JournalEntryId,
        posted_by: Option<UserId>,
        posted_at: DateTime<Utc>,
    ) -> Result<JournalEntry, LedgerError> {
        let mut guard = self.write();
        let current = guard
            .entries
            .get(&entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        if !current.status.can_transition_to(EntryStatus::Posted) {
            return Err(LedgerError::InvalidTransition {
                from: current.status,
                to: EntryStatus::Posted,
            });
        }

        let mut posted = current.clone();
        posted.recompute_totals();
        validate_for_posting(&guard, &posted)?;

        posted.status = EntryStatus::Posted;
        posted.posted_at = Some(posted_at);
        posted.posted_by = posted_by;

        self.persist_entry(&posted)?;
        let version = Self::publish(&mut guard, |state| {
            state.entries.insert(entry_id, posted.clone());
        });

        info!(
            tenant_id = %self.tenant_id,
            entry_id = %entry_id,
            entry_number = %posted.entry_number,
            amount = %posted.total_debit,
            version,
            "journal entry posted"
        );
        Ok(posted)
    }

    /// Flags a POSTED entry as VOID. The entry and its lines are kept.
    ///
    /// # Errors
    ///
    /// `EntryNotFound`, `InvalidTransition` unless POSTED, or `Persistence`.
    pub fn void(
        &self,
        entry_id: JournalEntryId,
        voided_at: DateTime<Utc>,
    ) -> Result<JournalEntry, LedgerError> {
        let mut guard = self.write();
        let current = guard
            .entries
            .get(&entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        if !current.status.can_transition_to(EntryStatus::Void) {
            return Err(LedgerError::InvalidTransition {
                from: current.status,
                to: EntryStatus::Void,
            });
        }

        let voided = JournalEntry {
            status: EntryStatus::Void,
            voided_at: Some(voided_at),
            ..current.clone()
        };

        self.persist_entry(&voided)?;
        let version = Self::publish(&mut guard, |state| {
            state.entries.insert(entry_id, voided.clone());
        });

        info!(
            tenant_id = %self.tenant_id,
            entry_id = %entry_id,
            entry_number = %voided.entry_number,
            version,
            "journal entry voided"
        );
        Ok(voided)
    }

    /// Drafts a new entry that swaps the debits and credits of a POSTED one.
    ///
    /// # Errors
    ///
    /// `EntryNotFound`, `NotPosted`, or `Persistence`.
    pub fn reverse(
        &self,
        entry_id: JournalEntryId,
        reversal_date: NaiveDate,
    ) -> Result<DraftHandle, LedgerError> {
        let mut guard = self.write();
        let original = guard
            .entries
            .get(&entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        if original.status != EntryStatus::Posted {
            return Err(LedgerError::NotPosted(entry_id));
        }

        let mut reversal = JournalEntry {
            id: JournalEntryId::new(),
            tenant_id: self.tenant_id,
            entry_number: self.entry_number(guard.next_entry_seq),
            entry_date: reversal_date,
            description: format!("Reversal of {}", original.entry_number),
            status: EntryStatus::Draft,
            lines: original
                .lines
                .iter()
                .map(|line| JournalLine {
                    debit: line.credit,
                    credit: line.debit,
                    ..line.clone()
                })
                .collect(),
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            posted_at: None,
            posted_by: None,
            voided_at: None,
            reversal_of: Some(entry_id),
        };
        reversal.recompute_totals();

        self.insert_new_entry(&mut guard, &reversal)?;
        Ok(DraftHandle {
            entry_id: reversal.id,
            entry_number: reversal.entry_number,
        })
    }

    // ========== Cached balances ==========

    /// Recomputes an account's display balance from posted lines and stores it.
    ///
    /// Does not bump the ledger version: the cache is not ledger content.
    ///
    /// # Errors
    ///
    /// `UnknownAccount` or `Persistence`.
    pub fn refresh_cached_balance(&self, account_id: AccountId) -> Result<Decimal, LedgerError> {
        let mut guard = self.write();
        let version = guard.version;

        let balance = {
            let snapshot = LedgerSnapshot::new(Arc::clone(&guard));
            BalanceAggregator::balance(&snapshot, account_id, &BalanceQuery::posted())?
        };

        let mut account = guard
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(LedgerError::UnknownAccount(account_id))?;
        account.cached_balance = balance;
        account.cached_at_version = Some(version);

        self.persist_account(&account)?;
        Arc::make_mut(&mut guard).accounts.insert(account_id, account);
        Ok(balance)
    }

    /// Refreshes the display balance of every account in one pass.
    ///
    /// # Errors
    ///
    /// `Persistence` if the sink rejects any account. The in-memory cache is
    /// then left untouched, but accounts saved before the failure stay saved
    /// in the sink; the next refresh overwrites them.
    pub fn refresh_all_cached_balances(&self) -> Result<usize, LedgerError> {
        let mut guard = self.write();
        let version = guard.version;

        let refreshed: Vec<Account> = {
            let snapshot = LedgerSnapshot::new(Arc::clone(&guard));
            let balances = BalanceAggregator::all_balances(&snapshot, &BalanceQuery::posted());
            snapshot
                .accounts()
                .map(|account| Account {
                    cached_balance: balances
                        .get(&account.id)
                        .map_or(Decimal::ZERO, |b| b.balance),
                    cached_at_version: Some(version),
                    ..account.clone()
                })
                .collect()
        };

        for account in &refreshed {
            self.persist_account(account)?;
        }

        let count = refreshed.len();
        let state = Arc::make_mut(&mut guard);
        for account in refreshed {
            state.accounts.insert(account.id, account);
        }
        Ok(count)
    }
}
