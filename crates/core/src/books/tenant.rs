//! Per-tenant state held by the facade.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tally_shared::types::{BudgetId, FixedAssetId, ReconciliationId, StatementLineId, TenantId};

use crate::budget::Budget;
use crate::depreciation::FixedAsset;
use crate::ledger::{LedgerSink, LedgerStore};
use crate::reconciliation::{BankReconciliation, BankStatementLine};

/// One tenant's ledger, asset register, budgets, and bank reconciliations.
///
/// Lock order when more than one is needed: assets, budgets, statement
/// lines, reconciliations. The ledger store has its own lock and may be
/// called while holding any of them.
#[derive(Debug)]
pub struct TenantBooks {
    ledger: LedgerStore,
    pub(crate) assets: RwLock<BTreeMap<FixedAssetId, FixedAsset>>,
    pub(crate) budgets: RwLock<BTreeMap<BudgetId, Budget>>,
    pub(crate) statement_lines: RwLock<BTreeMap<StatementLineId, BankStatementLine>>,
    pub(crate) reconciliations: RwLock<BTreeMap<ReconciliationId, BankReconciliation>>,
}

impl TenantBooks {
    pub(crate) fn new(
        tenant_id: TenantId,
        sink: Arc<dyn LedgerSink>,
        entry_number_prefix: &str,
    ) -> Self {
        Self {
            ledger: LedgerStore::with_sink(tenant_id, sink, entry_number_prefix),
            assets: RwLock::new(BTreeMap::new()),
            budgets: RwLock::new(BTreeMap::new()),
            statement_lines: RwLock::new(BTreeMap::new()),
            reconciliations: RwLock::new(BTreeMap::new()),
        }
    }

    /// The tenant's ledger store.
    #[must_use]
    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Copies of every registered asset, ordered by ID.
    #[must_use]
    pub fn assets(&self) -> Vec<FixedAsset> {
        self.assets.read().values().cloned().collect()
    }

    /// Copies of every budget, ordered by ID.
    #[must_use]
    pub fn budgets(&self) -> Vec<Budget> {
        self.budgets.read().values().cloned().collect()
    }

    /// Copies of every imported bank statement line, ordered by ID.
    #[must_use]
    pub fn statement_lines(&self) -> Vec<BankStatementLine> {
        self.statement_lines.read().values().cloned().collect()
    }

    /// Copies of every bank reconciliation, ordered by ID.
    #[must_use]
    pub fn reconciliations(&self) -> Vec<BankReconciliation> {
        self.reconciliations.read().values().cloned().collect()
    }
}
