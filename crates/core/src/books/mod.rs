//! Tenant-scoped bookkeeping facade.
//!
//! [`Bookkeeper`] is the function-call boundary a web or CLI layer talks to.
//! Every method takes the tenant first; "today" and "now" come from the
//! injected [`Clock`]. Posting and voiding reconcile the budgets they touch,
//! depreciation runs post their charge to the ledger, and bank
//! reconciliations re-derive their book balance whenever they are touched.

pub mod error;
pub mod tenant;

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tally_shared::AppConfig;
use tally_shared::types::{
    AccountId, BillId, BudgetId, ExpenseId, FixedAssetId, InvoiceId, JournalEntryId,
    ReconciliationId, StatementLineId, TenantId, UserId,
};
use tracing::info;

pub use error::BooksError;
pub use tenant::TenantBooks;

use crate::balance::{BalanceAggregator, BalanceQuery};
use crate::budget::{Budget, BudgetError, BudgetReconciler, BudgetVsActualReport, NewBudget, NewBudgetLine};
use crate::clock::{Clock, SystemClock};
use crate::depreciation::{
    AssetTaxSummary, DepreciationEngine, DepreciationError, DepreciationRun, FixedAsset,
    NewAssetTaxInfo, NewFixedAsset,
};
use crate::ledger::{
    Account, DraftHandle, JournalEntry, LedgerError, LedgerSink, LedgerSnapshot, NewAccount,
    NoopSink,
};
use crate::reconciliation::{
    BankReconciler, BankReconciliation, BankStatementLine, NewAdjustment, NewReconciliation,
    NewStatementLine, ReconciliationError, ReconciliationWorksheet,
};
use crate::reports::{
    AgingReport, BalanceSheet, CashFlowForecast, CashFlowStatement, FinancialRatios,
    ProfitAndLoss, ReportCache, ReportSettings, StatementEngine, TrialBalance,
};
use crate::subledger::{
    Bill, Expense, ExpenseStatus, Invoice, NewBill, NewExpense, NewInvoice, NewPayment, Payment,
};

/// Facade settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooksSettings {
    /// Prefix for generated journal entry numbers.
    pub entry_number_prefix: String,
    /// Statement engine settings.
    pub reports: ReportSettings,
    /// Maximum number of cached reports per kind.
    pub cache_capacity: u64,
    /// Time-to-live of cached reports in seconds.
    pub cache_ttl_secs: u64,
}

impl BooksSettings {
    /// Builds settings from the application configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            entry_number_prefix: config.ledger.entry_number_prefix.clone(),
            reports: ReportSettings::from_config(config),
            cache_capacity: config.reports.cache_capacity,
            cache_ttl_secs: config.reports.cache_ttl_secs,
        }
    }
}

impl Default for BooksSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Multi-tenant bookkeeping facade.
pub struct Bookkeeper<C: Clock = SystemClock> {
    clock: C,
    settings: BooksSettings,
    engine: StatementEngine,
    cache: ReportCache,
    sink: Arc<dyn LedgerSink>,
    tenants: DashMap<TenantId, Arc<TenantBooks>>,
}

impl<C: Clock> std::fmt::Debug for Bookkeeper<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bookkeeper")
            .field("settings", &self.settings)
            .field("tenants", &self.tenants.len())
            .finish_non_exhaustive()
    }
}

fn ensure_usable(snapshot: &LedgerSnapshot, account_id: AccountId) -> Result<(), LedgerError> {
    let account = snapshot
        .account(account_id)
        .ok_or(LedgerError::UnknownAccount(account_id))?;
    if !account.is_active {
        return Err(LedgerError::InactiveAccount(account_id));
    }
    Ok(())
}

impl<C: Clock> Bookkeeper<C> {
    /// Creates an in-memory bookkeeper.
    #[must_use]
    pub fn new(clock: C, settings: BooksSettings) -> Self {
        Self::with_sink(clock, settings, Arc::new(NoopSink))
    }

    /// Creates a bookkeeper whose ledgers persist through `sink`.
    #[must_use]
    pub fn with_sink(clock: C, settings: BooksSettings, sink: Arc<dyn LedgerSink>) -> Self {
        Self {
            clock,
            engine: StatementEngine::new(settings.reports.clone()),
            cache: ReportCache::with_config(settings.cache_capacity, settings.cache_ttl_secs),
            settings,
            sink,
            tenants: DashMap::new(),
        }
    }

    /// The injected clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Settings in use.
    pub fn settings(&self) -> &BooksSettings {
        &self.settings
    }

    /// A tenant's books, created empty on first use.
    pub fn tenant(&self, tenant: TenantId) -> Arc<TenantBooks> {
        let books = self.tenants.entry(tenant).or_insert_with(|| {
            info!(tenant_id = %tenant, "tenant books opened");
            Arc::new(TenantBooks::new(
                tenant,
                Arc::clone(&self.sink),
                &self.settings.entry_number_prefix,
            ))
        });
        Arc::clone(books.value())
    }

    /// The current ledger snapshot of a tenant.
    pub fn snapshot(&self, tenant: TenantId) -> LedgerSnapshot {
        self.tenant(tenant).ledger().snapshot()
    }

    // ========== Accounts ==========

    /// Adds an account.
    ///
    /// # Errors
    ///
    /// `DuplicateAccountCode`, `UnknownAccount` (parent), or `Persistence`.
    pub fn create_account(&self, tenant: TenantId, input: NewAccount) -> Result<Account, BooksError> {
        Ok(self.tenant(tenant).ledger().create_account(input)?)
    }

    /// Deactivates an account.
    ///
    /// # Errors
    ///
    /// `UnknownAccount` or `Persistence`.
    pub fn deactivate_account(&self, tenant: TenantId, account_id: AccountId) -> Result<Account, BooksError> {
        Ok(self.tenant(tenant).ledger().deactivate_account(account_id)?)
    }

    /// Deletes an account nothing refers to.
    ///
    /// Journal lines, expenses, fixed assets, budget lines, bank statement
    /// lines, and reconciliations all count as references.
    ///
    /// # Errors
    ///
    /// `AccountInUse`, `UnknownAccount`, or `Persistence`.
    pub fn delete_account(&self, tenant: TenantId, account_id: AccountId) -> Result<Account, BooksError> {
        let books = self.tenant(tenant);
        let assets = books.assets.read();
        let budgets = books.budgets.read();
        let statement_lines = books.statement_lines.read();
        let reconciliations = books.reconciliations.read();

        let used_by_asset = assets.values().any(|asset| {
            asset.account_id == account_id
                || asset.expense_account_id == Some(account_id)
                || asset.accumulated_account_id == Some(account_id)
        });
        let used_by_budget = budgets.values().any(|budget| budget.references(account_id));
        let used_by_bank = statement_lines
            .values()
            .any(|line| line.account_id == account_id)
            || reconciliations
                .values()
                .any(|reconciliation| reconciliation.account_id == account_id);
        if used_by_asset || used_by_budget || used_by_bank {
            return Err(LedgerError::AccountInUse(account_id).into());
        }

        Ok(books.ledger().delete_account(account_id)?)
    }

    /// Stores a freshly aggregated balance in the account's display cache.
    ///
    /// # Errors
    ///
    /// `UnknownAccount` or `Persistence`.
    pub fn refresh_cached_balance(&self, tenant: TenantId, account_id: AccountId) -> Result<Decimal, BooksError> {
        Ok(self.tenant(tenant).ledger().refresh_cached_balance(account_id)?)
    }

    /// Balance of an account, optionally as of a date.
    ///
    /// With `posted_only` false, DRAFT entries count too. VOID entries never do.
    ///
    /// # Errors
    ///
    /// `UnknownAccount`.
    pub fn get_balance(
        &self,
        tenant: TenantId,
        account_id: AccountId,
        as_of: Option<NaiveDate>,
        posted_only: bool,
    ) -> Result<Decimal, BooksError> {
        let mut query = as_of.map_or_else(BalanceQuery::posted, BalanceQuery::as_of);
        if !posted_only {
            query = query.including_drafts();
        }
        Ok(BalanceAggregator::balance(&self.snapshot(tenant), account_id, &query)?)
    }

    // ========== Journal Entries ==========

    /// Opens a DRAFT entry.
    ///
    /// # Errors
    ///
    /// `Persistence`.
    pub fn create_entry(
        &self,
        tenant: TenantId,
        entry_date: NaiveDate,
        description: impl Into<String>,
    ) -> Result<DraftHandle, BooksError> {
        Ok(self.tenant(tenant).ledger().create_entry(entry_date, description)?)
    }

    /// Adds a line to a DRAFT entry.
    ///
    /// # Errors
    ///
    /// Line amount, account, and entry state errors from the ledger.
    pub fn add_line(
        &self,
        tenant: TenantId,
        handle: &DraftHandle,
        account_id: AccountId,
        debit: Decimal,
        credit: Decimal,
        line_number: u32,
    ) -> Result<JournalEntry, BooksError> {
        Ok(self
            .tenant(tenant)
            .ledger()
            .add_line(handle, account_id, debit, credit, line_number)?)
    }

    /// Removes a line from a DRAFT entry.
    ///
    /// # Errors
    ///
    /// `LineNotFound`, `EntryNotFound`, `ImmutableEntry`, or `Persistence`.
    pub fn remove_line(
        &self,
        tenant: TenantId,
        handle: &DraftHandle,
        line_number: u32,
    ) -> Result<JournalEntry, BooksError> {
        Ok(self.tenant(tenant).ledger().remove_line(handle, line_number)?)
    }

    /// Posts a DRAFT entry and reconciles the budgets it touches.
    ///
    /// # Errors
    ///
    /// `Unbalanced`, `EmptyEntry`, account errors, `InvalidTransition`, or
    /// `Persistence`. The entry stays DRAFT on any error.
    pub fn post_journal_entry(
        &self,
        tenant: TenantId,
        entry_id: JournalEntryId,
        posted_by: Option<UserId>,
    ) -> Result<JournalEntry, BooksError> {
        let books = self.tenant(tenant);
        self.post_in(&books, entry_id, posted_by)
    }

    fn post_in(
        &self,
        books: &TenantBooks,
        entry_id: JournalEntryId,
        posted_by: Option<UserId>,
    ) -> Result<JournalEntry, BooksError> {
        let posted = books.ledger().post(entry_id, posted_by, self.clock.now())?;
        Self::reconcile_affected(books, &posted);
        Ok(posted)
    }

    /// Voids a POSTED entry and reconciles the budgets it touched.
    ///
    /// # Errors
    ///
    /// `EntryNotFound`, `InvalidTransition`, or `Persistence`.
    pub fn void_journal_entry(&self, tenant: TenantId, entry_id: JournalEntryId) -> Result<JournalEntry, BooksError> {
        let books = self.tenant(tenant);
        let voided = books.ledger().void(entry_id, self.clock.now())?;
        Self::reconcile_affected(&books, &voided);
        Ok(voided)
    }

    /// Drafts the reversal of a POSTED entry.
    ///
    /// # Errors
    ///
    /// `EntryNotFound`, `NotPosted`, or `Persistence`.
    pub fn reverse_journal_entry(
        &self,
        tenant: TenantId,
        entry_id: JournalEntryId,
        reversal_date: NaiveDate,
    ) -> Result<DraftHandle, BooksError> {
        Ok(self.tenant(tenant).ledger().reverse(entry_id, reversal_date)?)
    }

    fn reconcile_affected(books: &TenantBooks, entry: &JournalEntry) {
        let mut budgets = books.budgets.write();
        if !budgets
            .values()
            .any(|budget| BudgetReconciler::is_affected_by(budget, entry))
        {
            return;
        }

        let snapshot = books.ledger().snapshot();
        for budget in budgets.values_mut() {
            if BudgetReconciler::is_affected_by(budget, entry) {
                *budget = BudgetReconciler::reconcile(budget, &snapshot);
            }
        }
    }

    // ========== Reports ==========

    /// Profit and loss for `[start, end]`.
    ///
    /// # Errors
    ///
    /// `InvalidDateRange`.
    pub fn generate_profit_and_loss(
        &self,
        tenant: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<ProfitAndLoss>, BooksError> {
        let snapshot = self.snapshot(tenant);
        Ok(self.cache.profit_and_loss(&self.engine, &snapshot, start, end)?)
    }

    /// Balance sheet at `as_of`.
    pub fn generate_balance_sheet(&self, tenant: TenantId, as_of: NaiveDate) -> Arc<BalanceSheet> {
        self.cache
            .balance_sheet(&self.engine, &self.snapshot(tenant), as_of)
    }

    /// Cash flow statement for `[start, end]`.
    ///
    /// # Errors
    ///
    /// `InvalidDateRange`.
    pub fn generate_cash_flow_statement(
        &self,
        tenant: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<CashFlowStatement, BooksError> {
        let books = self.tenant(tenant);
        let assets = books.assets();
        Ok(self
            .engine
            .cash_flow_statement(&books.ledger().snapshot(), &assets, start, end)?)
    }

    /// Receivables aging as of today.
    pub fn generate_aging_report(&self, tenant: TenantId) -> AgingReport {
        self.engine.aging(&self.snapshot(tenant), self.clock.today())
    }

    /// Cash forecast from today; the configured horizon when `None`.
    ///
    /// # Errors
    ///
    /// `InvalidHorizon`.
    pub fn generate_cash_flow_forecast(
        &self,
        tenant: TenantId,
        horizon_days: Option<u32>,
    ) -> Result<CashFlowForecast, BooksError> {
        let horizon = horizon_days.unwrap_or(self.engine.settings().forecast_horizon_days);
        Ok(self
            .engine
            .forecast(&self.snapshot(tenant), self.clock.today(), horizon)?)
    }

    /// Trial balance at `as_of`.
    pub fn generate_trial_balance(&self, tenant: TenantId, as_of: NaiveDate) -> Arc<TrialBalance> {
        self.cache
            .trial_balance(&self.engine, &self.snapshot(tenant), as_of)
    }

    /// Headline ratios at `as_of`.
    pub fn generate_financial_ratios(&self, tenant: TenantId, as_of: NaiveDate) -> FinancialRatios {
        self.engine.financial_ratios(&self.snapshot(tenant), as_of)
    }

    // ========== Fixed Assets ==========

    /// Registers a fixed asset.
    ///
    /// # Errors
    ///
    /// - `UnknownAccount` / `InactiveAccount` for any linked account
    /// - `DuplicateAssetCode`
    /// - Validation errors from [`DepreciationEngine::register`]
    pub fn register_asset(&self, tenant: TenantId, input: NewFixedAsset) -> Result<FixedAsset, BooksError> {
        let books = self.tenant(tenant);
        let mut assets = books.assets.write();

        let snapshot = books.ledger().snapshot();
        for account_id in [Some(input.account_id), input.expense_account_id, input.accumulated_account_id]
            .into_iter()
            .flatten()
        {
            ensure_usable(&snapshot, account_id)?;
        }
        if assets.values().any(|asset| asset.asset_code == input.asset_code) {
            return Err(DepreciationError::DuplicateAssetCode(input.asset_code).into());
        }

        let asset = DepreciationEngine::register(tenant, input)?;
        info!(
            tenant_id = %tenant,
            asset_id = %asset.id,
            asset_code = %asset.asset_code,
            cost = %asset.purchase_cost,
            "fixed asset registered"
        );
        assets.insert(asset.id, asset.clone());
        Ok(asset)
    }

    /// Returns a copy of an asset.
    pub fn asset(&self, tenant: TenantId, asset_id: FixedAssetId) -> Option<FixedAsset> {
        self.tenant(tenant).assets.read().get(&asset_id).cloned()
    }

    /// Attaches or replaces an asset's tax information.
    ///
    /// # Errors
    ///
    /// `AssetNotFound`.
    pub fn attach_tax_info(
        &self,
        tenant: TenantId,
        asset_id: FixedAssetId,
        input: NewAssetTaxInfo,
    ) -> Result<FixedAsset, BooksError> {
        let books = self.tenant(tenant);
        let mut assets = books.assets.write();
        let asset = assets
            .get(&asset_id)
            .ok_or(DepreciationError::AssetNotFound(asset_id))?;
        let updated = DepreciationEngine::attach_tax_info(asset, input);
        assets.insert(asset_id, updated.clone());
        Ok(updated)
    }

    /// Brings one asset's depreciation up to `as_of` and posts the charge.
    ///
    /// The entry debits the expense account and credits accumulated
    /// depreciation when both are configured and the charge is positive.
    /// The asset is stored only after the entry posts.
    ///
    /// # Errors
    ///
    /// `AssetNotFound`, or ledger errors from posting the charge.
    pub fn run_depreciation(
        &self,
        tenant: TenantId,
        asset_id: FixedAssetId,
        as_of: NaiveDate,
    ) -> Result<DepreciationRun, BooksError> {
        let books = self.tenant(tenant);
        let mut assets = books.assets.write();
        let asset = assets
            .get(&asset_id)
            .ok_or(DepreciationError::AssetNotFound(asset_id))?;

        let (updated, run) = DepreciationEngine::run(asset, as_of);
        let run = self.post_depreciation(&books, &updated, run)?;
        assets.insert(asset_id, updated);
        Ok(run)
    }

    /// Runs depreciation for every active asset of a tenant.
    ///
    /// # Errors
    ///
    /// The first posting error; assets processed before it keep their update.
    pub fn run_all_depreciation(&self, tenant: TenantId, as_of: NaiveDate) -> Result<Vec<DepreciationRun>, BooksError> {
        let books = self.tenant(tenant);
        let mut assets = books.assets.write();
        let current: Vec<FixedAsset> = assets.values().cloned().collect();

        let mut runs = Vec::with_capacity(current.len());
        for (updated, run) in DepreciationEngine::run_batch(&current, as_of) {
            let run = self.post_depreciation(&books, &updated, run)?;
            assets.insert(updated.id, updated);
            runs.push(run);
        }

        info!(tenant_id = %tenant, %as_of, assets = runs.len(), "depreciation batch complete");
        Ok(runs)
    }

    fn post_depreciation(
        &self,
        books: &TenantBooks,
        asset: &FixedAsset,
        mut run: DepreciationRun,
    ) -> Result<DepreciationRun, BooksError> {
        if run.delta <= Decimal::ZERO {
            return Ok(run);
        }
        let Some((expense_account, accumulated_account)) = asset.posting_accounts() else {
            return Ok(run);
        };

        let ledger = books.ledger();
        let snapshot = ledger.snapshot();
        ensure_usable(&snapshot, expense_account)?;
        ensure_usable(&snapshot, accumulated_account)?;

        let handle = ledger.create_entry(
            run.as_of,
            format!("Depreciation {} through {}", asset.asset_code, run.as_of),
        )?;
        ledger.add_line(&handle, expense_account, run.delta, Decimal::ZERO, 1)?;
        ledger.add_line(&handle, accumulated_account, Decimal::ZERO, run.delta, 2)?;
        let entry = self.post_in(books, handle.entry_id, None)?;

        run.journal_entry_id = Some(entry.id);
        Ok(run)
    }

    /// Depreciates an asset through the disposal date, then disposes of it.
    ///
    /// # Errors
    ///
    /// `AssetNotFound`, `AlreadyDisposed`, `DisposalBeforePurchase`,
    /// `NegativeAmount`, or ledger errors from posting the final charge.
    pub fn dispose_asset(
        &self,
        tenant: TenantId,
        asset_id: FixedAssetId,
        disposal_date: NaiveDate,
        proceeds: Decimal,
    ) -> Result<FixedAsset, BooksError> {
        let books = self.tenant(tenant);
        let mut assets = books.assets.write();
        let asset = assets
            .get(&asset_id)
            .ok_or(DepreciationError::AssetNotFound(asset_id))?;

        // Validate before anything is posted.
        DepreciationEngine::dispose(asset, disposal_date, proceeds)?;

        let (depreciated, run) = DepreciationEngine::run(asset, disposal_date);
        self.post_depreciation(&books, &depreciated, run)?;
        let disposed = DepreciationEngine::dispose(&depreciated, disposal_date, proceeds)?;
        assets.insert(asset_id, disposed.clone());
        Ok(disposed)
    }

    /// Tax schedule and status of an asset; as of today when `None`.
    ///
    /// # Errors
    ///
    /// `AssetNotFound` or `NoTaxInfo`.
    pub fn asset_tax_summary(
        &self,
        tenant: TenantId,
        asset_id: FixedAssetId,
        as_of: Option<NaiveDate>,
    ) -> Result<AssetTaxSummary, BooksError> {
        let asset = self
            .asset(tenant, asset_id)
            .ok_or(DepreciationError::AssetNotFound(asset_id))?;
        let as_of = as_of.unwrap_or_else(|| self.clock.today());
        Ok(DepreciationEngine::tax_summary(&asset, as_of)?)
    }

    // ========== Budgets ==========

    /// Creates an empty budget.
    ///
    /// # Errors
    ///
    /// `InvalidPeriod`.
    pub fn create_budget(&self, tenant: TenantId, input: NewBudget) -> Result<Budget, BooksError> {
        let budget = BudgetReconciler::create(tenant, input)?;
        self.tenant(tenant)
            .budgets
            .write()
            .insert(budget.id, budget.clone());
        Ok(budget)
    }

    /// Adds a line to a budget.
    ///
    /// # Errors
    ///
    /// `NotFound`, `BudgetLocked`, `NegativeAmount`, `UnknownAccount`, or
    /// `DuplicateBudgetLine`.
    pub fn add_budget_line(
        &self,
        tenant: TenantId,
        budget_id: BudgetId,
        input: NewBudgetLine,
    ) -> Result<Budget, BooksError> {
        self.update_budget(tenant, budget_id, |budget, snapshot| {
            BudgetReconciler::add_line(budget, snapshot, input)
        })
    }

    /// Locks a budget against line changes.
    ///
    /// # Errors
    ///
    /// `NotFound`.
    pub fn lock_budget(&self, tenant: TenantId, budget_id: BudgetId) -> Result<Budget, BooksError> {
        self.update_budget(tenant, budget_id, |budget, _| Ok(BudgetReconciler::lock(budget)))
    }

    /// Recomputes a budget's actuals on demand.
    ///
    /// # Errors
    ///
    /// `NotFound`.
    pub fn reconcile_budget(&self, tenant: TenantId, budget_id: BudgetId) -> Result<Budget, BooksError> {
        self.update_budget(tenant, budget_id, |budget, snapshot| {
            Ok(BudgetReconciler::reconcile(budget, snapshot))
        })
    }

    fn update_budget(
        &self,
        tenant: TenantId,
        budget_id: BudgetId,
        change: impl FnOnce(&Budget, &LedgerSnapshot) -> Result<Budget, BudgetError>,
    ) -> Result<Budget, BooksError> {
        let books = self.tenant(tenant);
        let mut budgets = books.budgets.write();
        let current = budgets
            .get(&budget_id)
            .ok_or(BudgetError::NotFound(budget_id))?;
        let updated = change(current, &books.ledger().snapshot())?;
        budgets.insert(budget_id, updated.clone());
        Ok(updated)
    }

    /// Budget vs actual analysis.
    ///
    /// # Errors
    ///
    /// `NotFound`.
    pub fn budget_vs_actual(&self, tenant: TenantId, budget_id: BudgetId) -> Result<BudgetVsActualReport, BooksError> {
        let books = self.tenant(tenant);
        let budget = books
            .budgets
            .read()
            .get(&budget_id)
            .cloned()
            .ok_or(BudgetError::NotFound(budget_id))?;
        Ok(BudgetReconciler::budget_vs_actual(&budget, &books.ledger().snapshot()))
    }

    // ========== Bank Reconciliation ==========

    /// Imports one bank statement line.
    ///
    /// # Errors
    ///
    /// `ZeroAmount`, `UnknownAccount`, or `DuplicateTransaction`.
    pub fn import_statement_line(
        &self,
        tenant: TenantId,
        input: NewStatementLine,
    ) -> Result<BankStatementLine, BooksError> {
        let books = self.tenant(tenant);
        let mut lines = books.statement_lines.write();
        let line = BankReconciler::import_line(tenant, &books.ledger().snapshot(), lines.values(), input)?;
        lines.insert(line.id, line.clone());
        Ok(line)
    }

    /// Marks a statement line as matched today, optionally against a posted entry.
    ///
    /// # Errors
    ///
    /// `StatementLineNotFound`, `AlreadyReconciled`, `UnknownEntry`, or
    /// `EntryNotPosted`.
    pub fn match_statement_line(
        &self,
        tenant: TenantId,
        line_id: StatementLineId,
        entry_id: Option<JournalEntryId>,
    ) -> Result<BankStatementLine, BooksError> {
        let books = self.tenant(tenant);
        let mut lines = books.statement_lines.write();
        let current = lines
            .get(&line_id)
            .ok_or(ReconciliationError::StatementLineNotFound(line_id))?;
        let matched =
            BankReconciler::match_line(current, &books.ledger().snapshot(), entry_id, self.clock.today())?;
        lines.insert(line_id, matched.clone());
        Ok(matched)
    }

    /// Opens a reconciliation for a bank account and statement.
    ///
    /// # Errors
    ///
    /// `StatementAfterReconciliation`, `UnknownAccount`, or
    /// `DuplicateReconciliation`.
    pub fn start_reconciliation(
        &self,
        tenant: TenantId,
        input: NewReconciliation,
    ) -> Result<BankReconciliation, BooksError> {
        let books = self.tenant(tenant);
        let mut reconciliations = books.reconciliations.write();
        let reconciliation = BankReconciler::start(
            tenant,
            &books.ledger().snapshot(),
            reconciliations.values(),
            input,
        )?;
        reconciliations.insert(reconciliation.id, reconciliation.clone());

        info!(
            tenant_id = %tenant,
            reconciliation_id = %reconciliation.id,
            book_balance = %reconciliation.book_balance,
            statement_balance = %reconciliation.statement_balance,
            "reconciliation started"
        );
        Ok(reconciliation)
    }

    /// Adds an adjustment to an open reconciliation.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Closed`, `NonPositiveAmount`, `UnknownEntry`, or
    /// `EntryNotPosted`.
    pub fn add_reconciliation_adjustment(
        &self,
        tenant: TenantId,
        reconciliation_id: ReconciliationId,
        input: NewAdjustment,
    ) -> Result<BankReconciliation, BooksError> {
        self.update_reconciliation(tenant, reconciliation_id, |reconciliation, snapshot| {
            let current = BankReconciler::refresh(reconciliation, snapshot);
            BankReconciler::add_adjustment(&current, snapshot, input)
        })
    }

    /// Closes a reconciliation whose adjusted book balance matches the statement.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Closed`, or `Unbalanced`.
    pub fn complete_reconciliation(
        &self,
        tenant: TenantId,
        reconciliation_id: ReconciliationId,
    ) -> Result<BankReconciliation, BooksError> {
        let now = self.clock.now();
        let completed = self.update_reconciliation(tenant, reconciliation_id, |reconciliation, snapshot| {
            BankReconciler::complete(reconciliation, snapshot, now)
        })?;
        info!(tenant_id = %tenant, reconciliation_id = %reconciliation_id, "reconciliation completed");
        Ok(completed)
    }

    /// Abandons an open reconciliation.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Closed`.
    pub fn cancel_reconciliation(
        &self,
        tenant: TenantId,
        reconciliation_id: ReconciliationId,
    ) -> Result<BankReconciliation, BooksError> {
        self.update_reconciliation(tenant, reconciliation_id, |reconciliation, _| {
            BankReconciler::cancel(reconciliation)
        })
    }

    /// A reconciliation with its book balance brought up to date and the
    /// statement lines it covers.
    ///
    /// # Errors
    ///
    /// `NotFound`.
    pub fn reconciliation_worksheet(
        &self,
        tenant: TenantId,
        reconciliation_id: ReconciliationId,
    ) -> Result<ReconciliationWorksheet, BooksError> {
        let books = self.tenant(tenant);
        let reconciliation = self.update_reconciliation(tenant, reconciliation_id, |reconciliation, snapshot| {
            Ok(BankReconciler::refresh(reconciliation, snapshot))
        })?;
        let lines = books.statement_lines.read();
        Ok(BankReconciler::worksheet(&reconciliation, lines.values()))
    }

    fn update_reconciliation(
        &self,
        tenant: TenantId,
        reconciliation_id: ReconciliationId,
        change: impl FnOnce(&BankReconciliation, &LedgerSnapshot) -> Result<BankReconciliation, ReconciliationError>,
    ) -> Result<BankReconciliation, BooksError> {
        let books = self.tenant(tenant);
        let mut reconciliations = books.reconciliations.write();
        let current = reconciliations
            .get(&reconciliation_id)
            .ok_or(ReconciliationError::NotFound(reconciliation_id))?;
        let updated = change(current, &books.ledger().snapshot())?;
        reconciliations.insert(reconciliation_id, updated.clone());
        Ok(updated)
    }

    // ========== Subledger ==========

    /// Records a DRAFT invoice.
    ///
    /// # Errors
    ///
    /// See [`crate::ledger::LedgerStore::record_invoice`].
    pub fn record_invoice(&self, tenant: TenantId, input: NewInvoice) -> Result<Invoice, BooksError> {
        Ok(self.tenant(tenant).ledger().record_invoice(input)?)
    }

    /// Marks an invoice as sent.
    ///
    /// # Errors
    ///
    /// `InvoiceNotFound` or `InvoiceTransition`.
    pub fn send_invoice(&self, tenant: TenantId, invoice_id: InvoiceId) -> Result<Invoice, BooksError> {
        Ok(self.tenant(tenant).ledger().send_invoice(invoice_id)?)
    }

    /// Cancels an unpaid invoice.
    ///
    /// # Errors
    ///
    /// `InvoiceNotFound` or `InvoiceTransition`.
    pub fn cancel_invoice(&self, tenant: TenantId, invoice_id: InvoiceId) -> Result<Invoice, BooksError> {
        Ok(self.tenant(tenant).ledger().cancel_invoice(invoice_id)?)
    }

    /// Records a customer payment.
    ///
    /// # Errors
    ///
    /// See [`crate::ledger::LedgerStore::record_payment`].
    pub fn record_payment(&self, tenant: TenantId, input: NewPayment) -> Result<Payment, BooksError> {
        Ok(self.tenant(tenant).ledger().record_payment(input)?)
    }

    /// Records a DRAFT vendor bill.
    ///
    /// # Errors
    ///
    /// See [`crate::ledger::LedgerStore::record_bill`].
    pub fn record_bill(&self, tenant: TenantId, input: NewBill) -> Result<Bill, BooksError> {
        Ok(self.tenant(tenant).ledger().record_bill(input)?)
    }

    /// Approves a bill for payment.
    ///
    /// # Errors
    ///
    /// `BillNotFound` or `BillTransition`.
    pub fn approve_bill(&self, tenant: TenantId, bill_id: BillId) -> Result<Bill, BooksError> {
        Ok(self.tenant(tenant).ledger().approve_bill(bill_id)?)
    }

    /// Pays part or all of a bill.
    ///
    /// # Errors
    ///
    /// See [`crate::ledger::LedgerStore::pay_bill`].
    pub fn pay_bill(&self, tenant: TenantId, bill_id: BillId, amount: Decimal) -> Result<Bill, BooksError> {
        Ok(self.tenant(tenant).ledger().pay_bill(bill_id, amount)?)
    }

    /// Records a DRAFT expense.
    ///
    /// # Errors
    ///
    /// `NegativeAmount`, `UnknownAccount`, `InactiveAccount`, or `DuplicateNumber`.
    pub fn record_expense(&self, tenant: TenantId, input: NewExpense) -> Result<Expense, BooksError> {
        Ok(self.tenant(tenant).ledger().record_expense(input)?)
    }

    /// Moves an expense along its workflow; PAID is stamped with today.
    ///
    /// # Errors
    ///
    /// `ExpenseNotFound` or `ExpenseTransition`.
    pub fn advance_expense(
        &self,
        tenant: TenantId,
        expense_id: ExpenseId,
        next: ExpenseStatus,
    ) -> Result<Expense, BooksError> {
        Ok(self
            .tenant(tenant)
            .ledger()
            .advance_expense(expense_id, next, self.clock.today())?)
    }
}

impl Bookkeeper<SystemClock> {
    /// Creates an in-memory bookkeeper on the system clock.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(SystemClock, BooksSettings::from_config(config))
    }
}
