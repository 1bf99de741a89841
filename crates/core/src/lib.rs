//! Core bookkeeping logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached only through the [`ledger::LedgerSink`] hook.
//!
//! # Modules
//!
//! - `ledger` - Double-entry ledger store and posting invariants
//! - `balance` - Balance aggregation with sign conventions
//! - `subledger` - Invoices, payments, bills, and expenses
//! - `reports` - Financial statements, aging, and cash forecasting
//! - `depreciation` - Book and tax depreciation of fixed assets
//! - `budget` - Budget reconciliation and variance analysis
//! - `reconciliation` - Bank statement reconciliation
//! - `clock` - Injected time source
//! - `books` - Tenant-scoped facade over all of the above

pub mod balance;
pub mod books;
pub mod budget;
pub mod clock;
pub mod depreciation;
pub mod ledger;
pub mod reconciliation;
pub mod reports;
pub mod subledger;
