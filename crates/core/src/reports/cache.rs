//! Report caching using Moka.
//!
//! Keys carry the ledger version, so any write to a tenant's ledger makes
//! its older entries unreachable. They age out through capacity and TTL.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use moka::sync::Cache;
use tally_shared::types::TenantId;
use tracing::debug;

use super::error::ReportError;
use super::service::StatementEngine;
use super::types::{BalanceSheet, ProfitAndLoss, TrialBalance};
use crate::ledger::state::LedgerSnapshot;

/// Default cache capacity (number of entries per report kind).
const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Default time-to-live for cache entries (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

type PeriodKey = (TenantId, u64, NaiveDate, NaiveDate);
type DateKey = (TenantId, u64, NaiveDate);

/// Cache for the reports computed most often.
///
/// Thread-safe; clones share the same underlying storage.
#[derive(Clone)]
pub struct ReportCache {
    profit_and_loss: Cache<PeriodKey, Arc<ProfitAndLoss>>,
    balance_sheets: Cache<DateKey, Arc<BalanceSheet>>,
    trial_balances: Cache<DateKey, Arc<TrialBalance>>,
}

impl std::fmt::Debug for ReportCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportCache")
            .field("entry_count", &self.entry_count())
            .finish()
    }
}

impl ReportCache {
    /// Creates a cache with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and time-to-live.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        fn build<K, V>(max_capacity: u64, ttl_secs: u64) -> Cache<K, V>
        where
            K: std::hash::Hash + Eq + Send + Sync + 'static,
            V: Clone + Send + Sync + 'static,
        {
            Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(Duration::from_secs(ttl_secs))
                .build()
        }

        Self {
            profit_and_loss: build(max_capacity, ttl_secs),
            balance_sheets: build(max_capacity, ttl_secs),
            trial_balances: build(max_capacity, ttl_secs),
        }
    }

    /// Profit and loss, from cache when the ledger has not changed.
    ///
    /// # Errors
    ///
    /// `InvalidDateRange` if `start > end`. Errors are never cached.
    pub fn profit_and_loss(
        &self,
        engine: &StatementEngine,
        snapshot: &LedgerSnapshot,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<ProfitAndLoss>, ReportError> {
        let key = (snapshot.tenant_id(), snapshot.version(), start, end);
        if let Some(cached) = self.profit_and_loss.get(&key) {
            debug!(tenant_id = %key.0, version = key.1, "profit and loss served from cache");
            return Ok(cached);
        }

        let report = Arc::new(engine.profit_and_loss(snapshot, start, end)?);
        self.profit_and_loss.insert(key, Arc::clone(&report));
        Ok(report)
    }

    /// Balance sheet, from cache when the ledger has not changed.
    #[must_use]
    pub fn balance_sheet(
        &self,
        engine: &StatementEngine,
        snapshot: &LedgerSnapshot,
        as_of: NaiveDate,
    ) -> Arc<BalanceSheet> {
        let key = (snapshot.tenant_id(), snapshot.version(), as_of);
        self.balance_sheets
            .get_with(key, || Arc::new(engine.balance_sheet(snapshot, as_of)))
    }

    /// Trial balance, from cache when the ledger has not changed.
    #[must_use]
    pub fn trial_balance(
        &self,
        engine: &StatementEngine,
        snapshot: &LedgerSnapshot,
        as_of: NaiveDate,
    ) -> Arc<TrialBalance> {
        let key = (snapshot.tenant_id(), snapshot.version(), as_of);
        self.trial_balances
            .get_with(key, || Arc::new(engine.trial_balance(snapshot, as_of)))
    }

    /// Invalidates all cached entries.
    pub fn invalidate_all(&self) {
        self.profit_and_loss.invalidate_all();
        self.balance_sheets.invalidate_all();
        self.trial_balances.invalidate_all();
    }

    /// Returns the number of entries currently cached across all report kinds.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.profit_and_loss.entry_count()
            + self.balance_sheets.entry_count()
            + self.trial_balances.entry_count()
    }

    /// Runs cache maintenance tasks.
    pub fn run_pending_tasks(&self) {
        self.profit_and_loss.run_pending_tasks();
        self.balance_sheets.run_pending_tasks();
        self.trial_balances.run_pending_tasks();
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::store::LedgerStore;
    use crate::ledger::types::{AccountClass, NewAccount};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store_with_account() -> LedgerStore {
        let store = LedgerStore::new(TenantId::new());
        store
            .create_account(NewAccount::new("1000", "Cash", AccountClass::Asset))
            .unwrap();
        store
    }

    #[test]
    fn test_same_version_hits_cache() {
        let cache = ReportCache::new();
        let engine = StatementEngine::default();
        let store = store_with_account();
        let snapshot = store.snapshot();

        let first = cache.balance_sheet(&engine, &snapshot, date(2025, 1, 31));
        let second = cache.balance_sheet(&engine, &snapshot, date(2025, 1, 31));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_new_version_misses_cache() {
        let cache = ReportCache::new();
        let engine = StatementEngine::default();
        let store = store_with_account();

        let before = cache.trial_balance(&engine, &store.snapshot(), date(2025, 1, 31));
        store
            .create_account(NewAccount::new("4000", "Sales", AccountClass::Revenue))
            .unwrap();
        let after = cache.trial_balance(&engine, &store.snapshot(), date(2025, 1, 31));
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_invalid_range_is_not_cached() {
        let cache = ReportCache::new();
        let engine = StatementEngine::default();
        let snapshot = store_with_account().snapshot();

        let result = cache.profit_and_loss(&engine, &snapshot, date(2025, 2, 1), date(2025, 1, 1));
        assert!(matches!(result, Err(ReportError::InvalidDateRange { .. })));
        cache.run_pending_tasks();
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn test_invalidate_all() {
        let cache = ReportCache::with_config(10, 60);
        let engine = StatementEngine::default();
        let snapshot = store_with_account().snapshot();

        let first = cache
            .profit_and_loss(&engine, &snapshot, date(2025, 1, 1), date(2025, 1, 31))
            .unwrap();
        cache.run_pending_tasks();
        assert!(cache.entry_count() >= 1);

        cache.invalidate_all();
        cache.run_pending_tasks();
        let second = cache
            .profit_and_loss(&engine, &snapshot, date(2025, 1, 1), date(2025, 1, 31))
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
    }
}
