//! Property-based tests for LedgerStore.
//!
//! - Property 1: Posted entries balance exactly
//! - Property 2: A rejected post changes nothing
//! - Property 3: Balances do not depend on query order

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::TenantId;

use super::error::LedgerError;
use super::store::LedgerStore;
use super::types::{Account, AccountClass, EntryStatus, NewAccount};
use crate::balance::{BalanceAggregator, BalanceQuery};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Debit-side amounts plus an optional skew applied to the credit side.
fn entry_amounts() -> impl Strategy<Value = (Vec<Decimal>, i64)> {
    (prop::collection::vec(positive_amount(), 1..6), -500i64..500i64)
}

fn store_with_accounts() -> (LedgerStore, Vec<Account>) {
    let store = LedgerStore::new(TenantId::new());
    let accounts = [
        ("1000", "Cash", AccountClass::Asset),
        ("2000", "Payables", AccountClass::Liability),
        ("3000", "Capital", AccountClass::Equity),
        ("4000", "Sales", AccountClass::Revenue),
        ("6000", "Supplies", AccountClass::Expense),
    ]
    .into_iter()
    .map(|(code, name, class)| store.create_account(NewAccount::new(code, name, class)).unwrap())
    .collect();
    (store, accounts)
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 1: Posted entries balance exactly**
    ///
    /// Whatever lines were drafted, an entry that reaches POSTED has equal
    /// totals and those totals match the sum of its lines.
    #[test]
    fn prop_posted_entries_balance((debits, skew_cents) in entry_amounts()) {
        let (store, accounts) = store_with_accounts();
        let handle = store.create_entry(date(), "generated").unwrap();

        let total: Decimal = debits.iter().copied().sum();
        let mut line_number = 1;
        for (i, amount) in debits.iter().enumerate() {
            let account = &accounts[i % accounts.len()];
            store.add_line(&handle, account.id, *amount, Decimal::ZERO, line_number).unwrap();
            line_number += 1;
        }
        let credit = total + Decimal::new(skew_cents, 2);
        if credit > Decimal::ZERO {
            store.add_line(&handle, accounts[3].id, Decimal::ZERO, credit, line_number).unwrap();
        }

        match store.post(handle.entry_id, None, Utc::now()) {
            Ok(posted) => {
                let line_debits: Decimal = posted.lines.iter().map(|l| l.debit).sum();
                let line_credits: Decimal = posted.lines.iter().map(|l| l.credit).sum();
                prop_assert_eq!(posted.total_debit, posted.total_credit);
                prop_assert_eq!(line_debits, line_credits);
                prop_assert_eq!(skew_cents, 0);
            }
            Err(LedgerError::Unbalanced { debit, credit }) => {
                prop_assert_ne!(debit, credit);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }

        for entry in store.snapshot().posted_entries() {
            prop_assert_eq!(entry.total_debit, entry.total_credit);
        }
    }

    /// **Property 2: A rejected post changes nothing**
    #[test]
    fn prop_failed_post_leaves_draft(amount in positive_amount(), short in 1i64..1000i64) {
        let (store, accounts) = store_with_accounts();
        let handle = store.create_entry(date(), "short").unwrap();
        store.add_line(&handle, accounts[4].id, amount + Decimal::new(short, 2), Decimal::ZERO, 1).unwrap();
        store.add_line(&handle, accounts[0].id, Decimal::ZERO, amount, 2).unwrap();

        let version = store.version();
        let before = store.entry(handle.entry_id).unwrap();
        let is_unbalanced = matches!(
            store.post(handle.entry_id, None, Utc::now()),
            Err(LedgerError::Unbalanced { .. })
        );
        prop_assert!(is_unbalanced);

        let after = store.entry(handle.entry_id).unwrap();
        prop_assert_eq!(after.status, EntryStatus::Draft);
        prop_assert_eq!(before, after);
        prop_assert_eq!(store.version(), version);
    }

    /// **Property 3: Balances do not depend on query order**
    #[test]
    fn prop_balance_is_order_independent(amounts in prop::collection::vec(positive_amount(), 1..10)) {
        let (store, accounts) = store_with_accounts();
        for amount in &amounts {
            let handle = store.create_entry(date(), "sale").unwrap();
            store.add_line(&handle, accounts[0].id, *amount, Decimal::ZERO, 1).unwrap();
            store.add_line(&handle, accounts[3].id, Decimal::ZERO, *amount, 2).unwrap();
            store.post(handle.entry_id, None, Utc::now()).unwrap();
        }

        let snapshot = store.snapshot();
        let query = BalanceQuery::posted();
        let forward: Vec<Decimal> = accounts
            .iter()
            .map(|a| BalanceAggregator::balance(&snapshot, a.id, &query).unwrap())
            .collect();
        let mut backward: Vec<Decimal> = accounts
            .iter()
            .rev()
            .map(|a| BalanceAggregator::balance(&store.snapshot(), a.id, &query).unwrap())
            .collect();
        backward.reverse();

        let total: Decimal = amounts.iter().copied().sum();
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(forward[0], total);
        prop_assert_eq!(forward[3], total);
    }
}
