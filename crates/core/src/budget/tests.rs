//! Tests for the budget reconciler.
//!
//! - Property 1: Variance sign and status follow the account class
//! - Property 2: Reconciliation converges

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{AccountId, TenantId};

use super::error::BudgetError;
use super::service::BudgetReconciler;
use super::types::{Budget, BudgetPeriod, NewBudget, NewBudgetLine, VarianceStatus};
use crate::ledger::store::LedgerStore;
use crate::ledger::types::{AccountClass, NewAccount};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Fixture {
    store: LedgerStore,
    cash: AccountId,
    sales: AccountId,
    travel: AccountId,
}

fn fixture() -> Fixture {
    let store = LedgerStore::new(TenantId::new());
    let id = |code: &str, name: &str, class| {
        store
            .create_account(NewAccount::new(code, name, class))
            .unwrap()
            .id
    };
    let cash = id("1000", "Cash", AccountClass::Asset);
    let sales = id("4000", "Sales", AccountClass::Revenue);
    let travel = id("6100", "Travel", AccountClass::Expense);
    Fixture {
        store,
        cash,
        sales,
        travel,
    }
}

fn post(store: &LedgerStore, on: NaiveDate, debit: AccountId, credit: AccountId, amount: Decimal) {
    let handle = store.create_entry(on, "test").unwrap();
    store.add_line(&handle, debit, amount, Decimal::ZERO, 1).unwrap();
    store.add_line(&handle, credit, Decimal::ZERO, amount, 2).unwrap();
    store.post(handle.entry_id, None, Utc::now()).unwrap();
}

fn q1_budget(fx: &Fixture) -> Budget {
    let budget = BudgetReconciler::create(
        fx.store.tenant_id(),
        NewBudget {
            name: "Q1".to_string(),
            period_type: BudgetPeriod::Quarterly,
            start_date: date(2025, 1, 1),
            end_date: date(2025, 3, 31),
        },
    )
    .unwrap();
    let snapshot = fx.store.snapshot();
    let budget = BudgetReconciler::add_line(
        &budget,
        &snapshot,
        NewBudgetLine {
            account_id: fx.travel,
            budgeted_amount: dec!(1000),
        },
    )
    .unwrap();
    BudgetReconciler::add_line(
        &budget,
        &snapshot,
        NewBudgetLine {
            account_id: fx.sales,
            budgeted_amount: dec!(5000),
        },
    )
    .unwrap()
}

#[test]
fn test_create_rejects_inverted_period() {
    let result = BudgetReconciler::create(
        TenantId::new(),
        NewBudget {
            name: "Backwards".to_string(),
            period_type: BudgetPeriod::Project,
            start_date: date(2025, 6, 1),
            end_date: date(2025, 1, 1),
        },
    );
    assert!(matches!(result, Err(BudgetError::InvalidPeriod { .. })));
}

#[test]
fn test_reconcile_counts_only_posted_entries_in_range() {
    let fx = fixture();
    let budget = q1_budget(&fx);
    assert_eq!(budget.total_budget, dec!(6000));

    post(&fx.store, date(2025, 2, 10), fx.travel, fx.cash, dec!(800));
    post(&fx.store, date(2025, 3, 31), fx.travel, fx.cash, dec!(400));
    // Outside the range.
    post(&fx.store, date(2025, 4, 1), fx.travel, fx.cash, dec!(999));
    post(&fx.store, date(2024, 12, 31), fx.cash, fx.sales, dec!(999));
    post(&fx.store, date(2025, 1, 15), fx.cash, fx.sales, dec!(4500));
    // Drafts never count.
    let draft = fx.store.create_entry(date(2025, 2, 1), "draft").unwrap();
    fx.store.add_line(&draft, fx.travel, dec!(50), Decimal::ZERO, 1).unwrap();
    fx.store.add_line(&draft, fx.cash, Decimal::ZERO, dec!(50), 2).unwrap();

    let reconciled = BudgetReconciler::reconcile(&budget, &fx.store.snapshot());
    let travel = reconciled.line_for(fx.travel).unwrap();
    assert_eq!(travel.actual_amount, dec!(1200));
    assert_eq!(travel.variance, dec!(200));
    let sales = reconciled.line_for(fx.sales).unwrap();
    assert_eq!(sales.actual_amount, dec!(4500));
    assert_eq!(sales.variance, dec!(-500));
    assert_eq!(reconciled.reconciled_version, Some(fx.store.version()));
}

#[test]
fn test_void_reverts_actuals() {
    let fx = fixture();
    let budget = q1_budget(&fx);
    let handle = fx.store.create_entry(date(2025, 1, 5), "trip").unwrap();
    fx.store.add_line(&handle, fx.travel, dec!(300), Decimal::ZERO, 1).unwrap();
    fx.store.add_line(&handle, fx.cash, Decimal::ZERO, dec!(300), 2).unwrap();
    fx.store.post(handle.entry_id, None, Utc::now()).unwrap();

    let after_post = BudgetReconciler::reconcile(&budget, &fx.store.snapshot());
    assert_eq!(after_post.line_for(fx.travel).unwrap().actual_amount, dec!(300));

    fx.store.void(handle.entry_id, Utc::now()).unwrap();
    let after_void = BudgetReconciler::reconcile(&after_post, &fx.store.snapshot());
    assert_eq!(after_void.line_for(fx.travel).unwrap().actual_amount, Decimal::ZERO);
}

#[test]
fn test_add_line_validation() {
    let fx = fixture();
    let budget = q1_budget(&fx);
    let snapshot = fx.store.snapshot();

    let duplicate = BudgetReconciler::add_line(
        &budget,
        &snapshot,
        NewBudgetLine {
            account_id: fx.travel,
            budgeted_amount: dec!(1),
        },
    );
    assert_eq!(duplicate.unwrap_err(), BudgetError::DuplicateBudgetLine(fx.travel));

    let negative = BudgetReconciler::add_line(
        &budget,
        &snapshot,
        NewBudgetLine {
            account_id: fx.cash,
            budgeted_amount: dec!(-1),
        },
    );
    assert_eq!(negative.unwrap_err(), BudgetError::NegativeAmount(dec!(-1)));

    let stranger = AccountId::new();
    let unknown = BudgetReconciler::add_line(
        &budget,
        &snapshot,
        NewBudgetLine {
            account_id: stranger,
            budgeted_amount: dec!(1),
        },
    );
    assert_eq!(unknown.unwrap_err(), BudgetError::UnknownAccount(stranger));

    let locked = BudgetReconciler::lock(&budget);
    let result = BudgetReconciler::add_line(
        &locked,
        &snapshot,
        NewBudgetLine {
            account_id: fx.cash,
            budgeted_amount: dec!(1),
        },
    );
    assert_eq!(result.unwrap_err(), BudgetError::BudgetLocked(budget.id));
}

#[test]
fn test_is_affected_by() {
    let fx = fixture();
    let mut budget = q1_budget(&fx);

    let handle = fx.store.create_entry(date(2025, 2, 1), "trip").unwrap();
    fx.store.add_line(&handle, fx.travel, dec!(10), Decimal::ZERO, 1).unwrap();
    fx.store.add_line(&handle, fx.cash, Decimal::ZERO, dec!(10), 2).unwrap();
    let in_range = fx.store.post(handle.entry_id, None, Utc::now()).unwrap();
    assert!(BudgetReconciler::is_affected_by(&budget, &in_range));

    let handle = fx.store.create_entry(date(2025, 5, 1), "late trip").unwrap();
    fx.store.add_line(&handle, fx.travel, dec!(10), Decimal::ZERO, 1).unwrap();
    fx.store.add_line(&handle, fx.cash, Decimal::ZERO, dec!(10), 2).unwrap();
    let out_of_range = fx.store.post(handle.entry_id, None, Utc::now()).unwrap();
    assert!(!BudgetReconciler::is_affected_by(&budget, &out_of_range));

    budget.is_active = false;
    assert!(!BudgetReconciler::is_affected_by(&budget, &in_range));
}

#[test]
fn test_budget_vs_actual() {
    let fx = fixture();
    let budget = q1_budget(&fx);
    post(&fx.store, date(2025, 2, 10), fx.travel, fx.cash, dec!(1200));
    post(&fx.store, date(2025, 1, 15), fx.cash, fx.sales, dec!(6000));

    let report = BudgetReconciler::budget_vs_actual(&budget, &fx.store.snapshot());
    assert_eq!(report.lines[0].account_code, "4000");
    let sales = &report.lines[0].variance;
    assert_eq!(sales.variance, dec!(1000));
    assert_eq!(sales.variance_percent, dec!(20.00));
    assert_eq!(sales.status, VarianceStatus::Favorable);

    let travel = &report.lines[1].variance;
    assert_eq!(travel.variance, dec!(200));
    assert_eq!(travel.utilization_percent, dec!(120.00));
    assert_eq!(travel.status, VarianceStatus::Unfavorable);

    assert_eq!(report.summary.total_budgeted, dec!(6000));
    assert_eq!(report.summary.total_actual, dec!(7200));
    assert_eq!(report.summary.overall_utilization, dec!(120.00));
}

#[rstest]
#[case::expense_under(dec!(1000), dec!(800), AccountClass::Expense, VarianceStatus::Favorable)]
#[case::expense_over(dec!(1000), dec!(1200), AccountClass::Expense, VarianceStatus::Unfavorable)]
#[case::revenue_over(dec!(1000), dec!(1200), AccountClass::Revenue, VarianceStatus::Favorable)]
#[case::revenue_under(dec!(1000), dec!(800), AccountClass::Revenue, VarianceStatus::Unfavorable)]
#[case::on_budget(dec!(1000), dec!(1000), AccountClass::Expense, VarianceStatus::OnBudget)]
fn test_variance_status(
    #[case] budgeted: Decimal,
    #[case] actual: Decimal,
    #[case] class: AccountClass,
    #[case] expected: VarianceStatus,
) {
    let result = BudgetReconciler::calculate_variance(budgeted, actual, class);
    assert_eq!(result.status, expected);
    assert_eq!(result.variance, actual - budgeted);
}

#[test]
fn test_zero_budget_percentages() {
    let result = BudgetReconciler::calculate_variance(dec!(0), dec!(500), AccountClass::Expense);
    assert_eq!(result.utilization_percent, dec!(0));
    assert_eq!(result.variance_percent, dec!(0));
    assert_eq!(result.status, VarianceStatus::Unfavorable);
}

fn class_strategy() -> impl Strategy<Value = AccountClass> {
    prop_oneof![
        Just(AccountClass::Asset),
        Just(AccountClass::Liability),
        Just(AccountClass::Equity),
        Just(AccountClass::Revenue),
        Just(AccountClass::Expense),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 1: Variance sign and status follow the account class**
    #[test]
    fn prop_variance_status_by_class(
        budgeted in 0i64..1_000_000_000,
        actual in 0i64..1_000_000_000,
        class in class_strategy(),
    ) {
        let budgeted = Decimal::from(budgeted);
        let actual = Decimal::from(actual);
        let result = BudgetReconciler::calculate_variance(budgeted, actual, class);

        prop_assert_eq!(result.variance, actual - budgeted);
        let expected = match (actual.cmp(&budgeted), class) {
            (std::cmp::Ordering::Equal, _) => VarianceStatus::OnBudget,
            (std::cmp::Ordering::Greater, AccountClass::Revenue)
            | (std::cmp::Ordering::Less, AccountClass::Asset
                | AccountClass::Liability
                | AccountClass::Equity
                | AccountClass::Expense) => VarianceStatus::Favorable,
            _ => VarianceStatus::Unfavorable,
        };
        prop_assert_eq!(result.status, expected);
    }

    /// **Property 2: Reconciliation converges**
    #[test]
    fn prop_reconcile_converges(amounts in prop::collection::vec(1i64..1_000_000i64, 0..10)) {
        let fx = fixture();
        let budget = q1_budget(&fx);
        for (i, cents) in amounts.iter().enumerate() {
            let day = u32::try_from(i % 28).unwrap() + 1;
            post(&fx.store, date(2025, 2, day), fx.travel, fx.cash, Decimal::new(*cents, 2));
        }
        let snapshot = fx.store.snapshot();
        let once = BudgetReconciler::reconcile(&budget, &snapshot);
        let twice = BudgetReconciler::reconcile(&once, &snapshot);
        prop_assert_eq!(&once, &twice);

        let expected: Decimal = amounts.iter().map(|cents| Decimal::new(*cents, 2)).sum();
        prop_assert_eq!(once.line_for(fx.travel).unwrap().actual_amount, expected);
    }
}
