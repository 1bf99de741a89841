//! Persistence seam for the ledger store.
//!
//! The store calls the sink while it holds the write lock and before the new
//! state is published. A sink error aborts the operation and the published
//! state does not change. Operations that write several rows are not atomic
//! in the sink; rows written before the failure stay written.

use tally_shared::types::{AccountId, TenantId};
use thiserror::Error;

use super::types::{Account, JournalEntry};

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SinkError(pub String);

/// Storage backend receiving every committed ledger change.
pub trait LedgerSink: Send + Sync {
    /// Persists a new or changed journal entry together with its lines.
    fn save_entry(&self, tenant_id: TenantId, entry: &JournalEntry) -> Result<(), SinkError>;

    /// Persists a new or changed account.
    fn save_account(&self, _tenant_id: TenantId, _account: &Account) -> Result<(), SinkError> {
        Ok(())
    }

    /// Removes an account.
    fn delete_account(&self, _tenant_id: TenantId, _account_id: AccountId) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Sink for purely in-memory ledgers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LedgerSink for NoopSink {
    fn save_entry(&self, _tenant_id: TenantId, _entry: &JournalEntry) -> Result<(), SinkError> {
        Ok(())
    }
}
