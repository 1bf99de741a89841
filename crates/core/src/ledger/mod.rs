//! Double-entry ledger: accounts, journal entries, and the store that
//! enforces posting invariants.
//!
//! A POSTED entry always has `total_debit == total_credit`. Lines of POSTED
//! and VOID entries never change; VOID entries stay in the ledger but are
//! excluded from balances.

pub mod error;
pub mod sink;
pub mod state;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod store_props;

pub use error::LedgerError;
pub use sink::{LedgerSink, NoopSink, SinkError};
pub use state::{LedgerSnapshot, LedgerState};
pub use store::LedgerStore;
pub use types::{
    Account, AccountClass, DraftHandle, EntryStatus, JournalEntry, JournalLine, NewAccount,
};
