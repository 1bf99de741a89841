//! Tests for the statement engine.
//!
//! - Property 1: A ledger of posted balanced entries yields a balanced sheet
//! - Property 2: Trial balance debits equal credits

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{AccountId, TenantId};

use super::error::ReportError;
use super::service::{MAX_FORECAST_HORIZON_DAYS, StatementEngine};
use crate::depreciation::{DepreciationEngine, DepreciationMethod, NewFixedAsset};
use crate::ledger::store::LedgerStore;
use crate::ledger::types::{Account, AccountClass, NewAccount};
use crate::subledger::{ExpenseStatus, NewBill, NewExpense, NewInvoice, NewPayment};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Books {
    store: LedgerStore,
    cash: Account,
    receivables: Account,
    capital: Account,
    sales: Account,
    rent: Account,
}

fn books() -> Books {
    let store = LedgerStore::new(TenantId::new());
    let cash = store
        .create_account(NewAccount::new("1000", "Operating account", AccountClass::Asset).cash())
        .unwrap();
    let receivables = store
        .create_account(NewAccount::new("1100", "Receivables", AccountClass::Asset))
        .unwrap();
    store
        .create_account(NewAccount::new("2000", "Payables", AccountClass::Liability))
        .unwrap();
    let capital = store
        .create_account(NewAccount::new("3000", "Capital", AccountClass::Equity))
        .unwrap();
    let sales = store
        .create_account(NewAccount::new("4000", "Sales", AccountClass::Revenue))
        .unwrap();
    let rent = store
        .create_account(NewAccount::new("6000", "Rent", AccountClass::Expense))
        .unwrap();
    Books {
        store,
        cash,
        receivables,
        capital,
        sales,
        rent,
    }
}

fn post(store: &LedgerStore, on: NaiveDate, debit: AccountId, credit: AccountId, amount: Decimal) {
    let handle = store.create_entry(on, "test entry").unwrap();
    store.add_line(&handle, debit, amount, Decimal::ZERO, 1).unwrap();
    store.add_line(&handle, credit, Decimal::ZERO, amount, 2).unwrap();
    store.post(handle.entry_id, None, Utc::now()).unwrap();
}

/// January: capital in, a sale on account, rent paid, part of the sale collected.
/// A draft rent entry stays unposted.
fn january(books: &Books) {
    let store = &books.store;
    post(store, date(2025, 1, 1), books.cash.id, books.capital.id, dec!(10000));
    post(store, date(2025, 1, 10), books.receivables.id, books.sales.id, dec!(5000));
    post(store, date(2025, 1, 15), books.rent.id, books.cash.id, dec!(2000));
    post(store, date(2025, 1, 20), books.cash.id, books.receivables.id, dec!(3000));

    let draft = store.create_entry(date(2025, 1, 25), "unposted rent").unwrap();
    store.add_line(&draft, books.rent.id, dec!(999), Decimal::ZERO, 1).unwrap();
    store.add_line(&draft, books.cash.id, Decimal::ZERO, dec!(999), 2).unwrap();
}

fn sent_invoice(store: &LedgerStore, number: &str, due: NaiveDate, amount: Decimal) {
    let invoice = store
        .record_invoice(NewInvoice {
            invoice_number: number.to_string(),
            customer_name: "Acme".to_string(),
            invoice_date: date(2024, 10, 1),
            due_date: due,
            total_amount: amount,
        })
        .unwrap();
    store.send_invoice(invoice.id).unwrap();
}

#[test]
fn test_profit_and_loss() {
    let books = books();
    january(&books);
    let engine = StatementEngine::default();

    let report = engine
        .profit_and_loss(&books.store.snapshot(), date(2025, 1, 1), date(2025, 1, 31))
        .unwrap();
    assert_eq!(report.total_revenue, dec!(5000));
    assert_eq!(report.total_expenses, dec!(2000));
    assert_eq!(report.net_income, dec!(3000));
    assert_eq!(report.net_margin, dec!(0.6));
    assert_eq!(report.net_margin_percent, dec!(60.00));
    assert_eq!(report.revenue.lines.len(), 1);
    assert_eq!(report.expenses.lines[0].code, "6000");
    assert_eq!(report.currency, "USD");
}

#[test]
fn test_profit_and_loss_without_revenue_has_zero_margin() {
    let books = books();
    post(&books.store, date(2025, 1, 15), books.rent.id, books.cash.id, dec!(100));
    let report = StatementEngine::default()
        .profit_and_loss(&books.store.snapshot(), date(2025, 1, 1), date(2025, 1, 31))
        .unwrap();
    assert_eq!(report.net_income, dec!(-100));
    assert_eq!(report.net_margin, Decimal::ZERO);
    assert_eq!(report.net_margin_percent, Decimal::ZERO);
}

#[test]
fn test_profit_and_loss_rejects_inverted_range() {
    let books = books();
    let result = StatementEngine::default().profit_and_loss(
        &books.store.snapshot(),
        date(2025, 2, 1),
        date(2025, 1, 1),
    );
    assert_eq!(
        result.unwrap_err(),
        ReportError::InvalidDateRange {
            start: date(2025, 2, 1),
            end: date(2025, 1, 1)
        }
    );
}

#[test]
fn test_balance_sheet_folds_retained_earnings_into_equity() {
    let books = books();
    january(&books);

    let sheet = StatementEngine::default().balance_sheet(&books.store.snapshot(), date(2025, 1, 31));
    assert_eq!(sheet.total_assets, dec!(13000));
    assert_eq!(sheet.total_liabilities, Decimal::ZERO);
    assert_eq!(sheet.equity.total, dec!(10000));
    assert_eq!(sheet.retained_earnings, dec!(3000));
    assert_eq!(sheet.total_equity, dec!(13000));
    assert_eq!(sheet.liabilities_and_equity, dec!(13000));
    assert!(sheet.balanced);
    // Payables has no balance and is left off.
    assert!(sheet.liabilities.lines.is_empty());
}

#[test]
fn test_balance_sheet_as_of_excludes_later_entries() {
    let books = books();
    january(&books);

    let sheet = StatementEngine::default().balance_sheet(&books.store.snapshot(), date(2025, 1, 12));
    assert_eq!(sheet.total_assets, dec!(15000));
    assert_eq!(sheet.retained_earnings, dec!(5000));
    assert!(sheet.balanced);
}

#[test]
fn test_trial_balance_and_ratios() {
    let books = books();
    january(&books);
    let engine = StatementEngine::default();
    let snapshot = books.store.snapshot();

    let trial = engine.trial_balance(&snapshot, date(2025, 1, 31));
    assert_eq!(trial.total_debit, dec!(20000));
    assert_eq!(trial.total_credit, dec!(20000));
    assert!(trial.is_balanced);
    let codes: Vec<&str> = trial.lines.iter().map(|line| line.code.as_str()).collect();
    assert_eq!(codes, vec!["1000", "1100", "3000", "4000", "6000"]);
    assert_eq!(trial.lines[0].debit_total, dec!(13000));
    assert_eq!(trial.lines[0].credit_total, dec!(2000));

    let ratios = engine.financial_ratios(&snapshot, date(2025, 1, 31));
    assert_eq!(ratios.working_capital, dec!(13000));
    assert_eq!(ratios.current_ratio, Decimal::ZERO);
    assert_eq!(ratios.debt_to_equity, Decimal::ZERO);
}

#[test]
fn test_cash_accounts_by_flag_or_name() {
    let engine = StatementEngine::default();
    let store = LedgerStore::new(TenantId::new());
    let flagged = store
        .create_account(NewAccount::new("1000", "Operating", AccountClass::Asset).cash())
        .unwrap();
    let named = store
        .create_account(NewAccount::new("1010", "First National BANK", AccountClass::Asset))
        .unwrap();
    let other = store
        .create_account(NewAccount::new("1100", "Inventory", AccountClass::Asset))
        .unwrap();
    let not_asset = store
        .create_account(NewAccount::new("4000", "Cash sales", AccountClass::Revenue))
        .unwrap();

    assert!(engine.is_cash_account(&flagged));
    assert!(engine.is_cash_account(&named));
    assert!(!engine.is_cash_account(&other));
    assert!(!engine.is_cash_account(&not_asset));
}

#[test]
fn test_cash_flow_statement() {
    let books = books();
    let store = &books.store;
    post(store, date(2025, 1, 1), books.cash.id, books.capital.id, dec!(1000));

    let invoice = store
        .record_invoice(NewInvoice {
            invoice_number: "INV-1".to_string(),
            customer_name: "Acme".to_string(),
            invoice_date: date(2025, 2, 1),
            due_date: date(2025, 3, 1),
            total_amount: dec!(600),
        })
        .unwrap();
    store.send_invoice(invoice.id).unwrap();
    store
        .record_payment(NewPayment {
            invoice_id: Some(invoice.id),
            payment_date: date(2025, 2, 10),
            amount: dec!(400),
            method: "CHECK".to_string(),
        })
        .unwrap();
    // Received outside the period.
    store
        .record_payment(NewPayment {
            invoice_id: None,
            payment_date: date(2025, 3, 5),
            amount: dec!(50),
            method: "CASH".to_string(),
        })
        .unwrap();

    let expense = store
        .record_expense(NewExpense {
            expense_number: "EXP-1".to_string(),
            expense_date: date(2025, 2, 12),
            amount: dec!(150),
            description: "Courier".to_string(),
            account_id: None,
        })
        .unwrap();
    for next in [ExpenseStatus::Submitted, ExpenseStatus::Approved, ExpenseStatus::Paid] {
        store.advance_expense(expense.id, next, date(2025, 2, 20)).unwrap();
    }
    // Approved but never paid.
    let unpaid = store
        .record_expense(NewExpense {
            expense_number: "EXP-2".to_string(),
            expense_date: date(2025, 2, 14),
            amount: dec!(75),
            description: "Lunch".to_string(),
            account_id: None,
        })
        .unwrap();
    store
        .advance_expense(unpaid.id, ExpenseStatus::Submitted, date(2025, 2, 14))
        .unwrap();

    let printer = DepreciationEngine::register(
        store.tenant_id(),
        NewFixedAsset {
            asset_code: "FA-1".to_string(),
            name: "Printer".to_string(),
            account_id: books.receivables.id,
            purchase_date: date(2025, 2, 5),
            purchase_cost: dec!(300),
            salvage_value: Decimal::ZERO,
            useful_life_years: 3,
            method: DepreciationMethod::StraightLine,
            depreciable: true,
            opening_accumulated_depreciation: Decimal::ZERO,
            expense_account_id: None,
            accumulated_account_id: None,
        },
    )
    .unwrap();

    let statement = StatementEngine::default()
        .cash_flow_statement(&store.snapshot(), &[printer], date(2025, 2, 1), date(2025, 2, 28))
        .unwrap();
    assert_eq!(statement.cash_received, dec!(400));
    assert_eq!(statement.cash_paid, dec!(150));
    assert_eq!(statement.operating, dec!(250));
    assert_eq!(statement.investing, dec!(-300));
    assert_eq!(statement.financing, Decimal::ZERO);
    assert_eq!(statement.net_change, dec!(-50));
    assert_eq!(statement.ending_cash, dec!(1000));
    assert_eq!(statement.beginning_cash, dec!(1050));
}

#[test]
fn test_aging_buckets_use_inclusive_upper_bounds() {
    let store = LedgerStore::new(TenantId::new());
    let today = date(2025, 3, 1);
    sent_invoice(&store, "INV-30", date(2025, 1, 30), dec!(100));
    sent_invoice(&store, "INV-31", date(2025, 1, 29), dec!(200));
    sent_invoice(&store, "INV-OLD", date(2024, 11, 1), dec!(300));
    sent_invoice(&store, "INV-NEW", date(2025, 3, 15), dec!(400));
    // Drafts are not receivables yet.
    store
        .record_invoice(NewInvoice {
            invoice_number: "INV-DRAFT".to_string(),
            customer_name: "Acme".to_string(),
            invoice_date: date(2025, 1, 1),
            due_date: date(2025, 1, 2),
            total_amount: dec!(999),
        })
        .unwrap();

    let report = StatementEngine::default().aging(&store.snapshot(), today);
    let labels: Vec<&str> = report.buckets.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["0-30", "31-60", "61-90", "90+"]);

    let current = &report.buckets[0];
    assert_eq!(current.count, 2);
    assert_eq!(current.amount, dec!(500));
    assert_eq!(current.items[0].invoice_number, "INV-30");
    assert_eq!(current.items[0].days_overdue, 30);
    assert_eq!(current.items[1].days_overdue, -14);

    assert_eq!(report.buckets[1].count, 1);
    assert_eq!(report.buckets[1].items[0].days_overdue, 31);
    assert_eq!(report.buckets[2].count, 0);
    assert_eq!(report.buckets[3].amount, dec!(300));
    assert_eq!(report.total_outstanding, dec!(1000));
}

#[test]
fn test_aging_uses_balance_due() {
    let store = LedgerStore::new(TenantId::new());
    sent_invoice(&store, "INV-1", date(2025, 2, 1), dec!(1000));
    let invoice = store.snapshot().invoices().next().unwrap().clone();
    store
        .record_payment(NewPayment {
            invoice_id: Some(invoice.id),
            payment_date: date(2025, 2, 10),
            amount: dec!(250),
            method: "CHECK".to_string(),
        })
        .unwrap();

    let report = StatementEngine::default().aging(&store.snapshot(), date(2025, 3, 1));
    assert_eq!(report.total_outstanding, dec!(750));
    assert_eq!(report.buckets[0].items[0].balance_due, dec!(750));
}

#[test]
fn test_forecast_buckets() {
    let books = books();
    let store = &books.store;
    let today = date(2025, 3, 1);
    post(store, date(2025, 2, 1), books.cash.id, books.capital.id, dec!(1000));

    sent_invoice(store, "INV-LATE", date(2025, 2, 15), dec!(500));
    sent_invoice(store, "INV-APR", date(2025, 4, 15), dec!(300));
    sent_invoice(store, "INV-JUL", date(2025, 7, 1), dec!(700));

    let bill = store
        .record_bill(NewBill {
            bill_number: "B-1".to_string(),
            vendor_name: "Landlord".to_string(),
            bill_date: date(2025, 3, 1),
            due_date: date(2025, 3, 31),
            total_amount: dec!(200),
        })
        .unwrap();
    store.approve_bill(bill.id).unwrap();
    store
        .record_bill(NewBill {
            bill_number: "B-2".to_string(),
            vendor_name: "Landlord".to_string(),
            bill_date: date(2025, 3, 1),
            due_date: date(2025, 3, 10),
            total_amount: dec!(900),
        })
        .unwrap();

    let forecast = StatementEngine::default().forecast(&store.snapshot(), today, 90).unwrap();
    assert_eq!(forecast.current_cash, dec!(1000));
    assert_eq!(forecast.expected_inflows, dec!(800));
    assert_eq!(forecast.expected_outflows, dec!(200));
    assert_eq!(forecast.projected_cash, dec!(1600));

    assert_eq!(forecast.buckets.len(), 3);
    let first = &forecast.buckets[0];
    assert_eq!((first.start, first.end), (today, date(2025, 3, 31)));
    assert_eq!(first.inflows, dec!(500));
    assert_eq!(first.outflows, dec!(200));
    assert_eq!(first.closing_cash, dec!(1300));
    assert_eq!(forecast.buckets[1].start, date(2025, 4, 1));
    assert_eq!(forecast.buckets[1].inflows, dec!(300));
    assert_eq!(forecast.buckets[2].end, date(2025, 5, 30));
    assert_eq!(forecast.buckets[2].closing_cash, forecast.projected_cash);
}

#[test]
fn test_forecast_zero_horizon_has_one_bucket() {
    let store = LedgerStore::new(TenantId::new());
    sent_invoice(&store, "INV-1", date(2025, 2, 1), dec!(50));
    let forecast = StatementEngine::default().forecast(&store.snapshot(), date(2025, 3, 1), 0).unwrap();
    assert_eq!(forecast.buckets.len(), 1);
    assert_eq!(forecast.buckets[0].end, date(2025, 3, 1));
    assert_eq!(forecast.expected_inflows, dec!(50));
}

#[test]
fn test_forecast_rejects_oversized_horizon() {
    let store = LedgerStore::new(TenantId::new());
    let engine = StatementEngine::default();

    let err = engine
        .forecast(&store.snapshot(), date(2024, 1, 1), u32::MAX)
        .unwrap_err();
    assert_eq!(
        err,
        ReportError::InvalidHorizon {
            days: u32::MAX,
            max: MAX_FORECAST_HORIZON_DAYS
        }
    );
    assert_eq!(err.error_code(), "INVALID_HORIZON");

    // Allowed length, but past the last representable date.
    let err = engine
        .forecast(&store.snapshot(), NaiveDate::MAX, 30)
        .unwrap_err();
    assert!(matches!(err, ReportError::InvalidHorizon { .. }));
}

#[test]
fn test_forecast_longest_horizon_caps_last_bucket() {
    let store = LedgerStore::new(TenantId::new());
    let today = date(2024, 1, 1);
    let forecast = StatementEngine::default()
        .forecast(&store.snapshot(), today, MAX_FORECAST_HORIZON_DAYS)
        .unwrap();
    assert_eq!(forecast.buckets.len(), 122);
    assert_eq!(
        forecast.buckets.last().unwrap().end,
        today + chrono::Days::new(u64::from(MAX_FORECAST_HORIZON_DAYS))
    );
}

/// Account index pairs and amounts for generated entries.
fn entries_strategy() -> impl Strategy<Value = Vec<(usize, usize, Decimal)>> {
    prop::collection::vec(
        (0usize..5, 0usize..5, (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))),
        1..25,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 1: A ledger of posted balanced entries yields a balanced sheet**
    #[test]
    fn prop_balance_sheet_balances(entries in entries_strategy(), day in 1u32..28u32) {
        let books = books();
        let accounts = [
            books.cash.id,
            books.receivables.id,
            books.capital.id,
            books.sales.id,
            books.rent.id,
        ];
        for (debit, credit, amount) in entries {
            if debit == credit {
                continue;
            }
            post(&books.store, date(2025, 1, day), accounts[debit], accounts[credit], amount);
        }

        let sheet = StatementEngine::default().balance_sheet(&books.store.snapshot(), date(2025, 1, 31));
        prop_assert!(sheet.balanced);
        prop_assert_eq!(sheet.total_assets, sheet.liabilities_and_equity);
    }

    /// **Property 2: Trial balance debits equal credits**
    #[test]
    fn prop_trial_balance_balances(entries in entries_strategy()) {
        let books = books();
        let accounts = [
            books.cash.id,
            books.receivables.id,
            books.capital.id,
            books.sales.id,
            books.rent.id,
        ];
        let mut expected = Decimal::ZERO;
        for (debit, credit, amount) in entries {
            if debit == credit {
                continue;
            }
            post(&books.store, date(2025, 1, 5), accounts[debit], accounts[credit], amount);
            expected += amount;
        }

        let trial = StatementEngine::default().trial_balance(&books.store.snapshot(), date(2025, 1, 31));
        prop_assert!(trial.is_balanced);
        prop_assert_eq!(trial.total_debit, expected);
    }
}
