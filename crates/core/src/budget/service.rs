//! Budget reconciler: line actuals, reactive reconciliation, and variance.

use rust_decimal::Decimal;
use tally_shared::types::{BudgetId, BudgetLineId, TenantId, percent_of};
use tracing::debug;

use super::error::BudgetError;
use super::types::{
    Budget, BudgetLine, BudgetLineWithActual, BudgetVsActualReport, BudgetVsActualSummary,
    NewBudget, NewBudgetLine, VarianceResult, VarianceStatus,
};
use crate::balance::{BalanceAggregator, BalanceQuery};
use crate::ledger::state::LedgerSnapshot;
use crate::ledger::types::{AccountClass, JournalEntry};

/// Budget business logic.
///
/// Like the depreciation engine it works on copies: every method returns
/// the updated budget and storing it is the caller's job.
pub struct BudgetReconciler;

impl BudgetReconciler {
    /// Validates input and builds an empty, active budget.
    ///
    /// # Errors
    ///
    /// `InvalidPeriod` if the start date is after the end date.
    pub fn create(tenant_id: TenantId, input: NewBudget) -> Result<Budget, BudgetError> {
        if input.start_date > input.end_date {
            return Err(BudgetError::InvalidPeriod {
                start: input.start_date,
                end: input.end_date,
            });
        }

        Ok(Budget {
            id: BudgetId::new(),
            tenant_id,
            name: input.name,
            period_type: input.period_type,
            start_date: input.start_date,
            end_date: input.end_date,
            is_active: true,
            is_locked: false,
            lines: Vec::new(),
            total_budget: Decimal::ZERO,
            reconciled_version: None,
        })
    }

    /// Adds a line and computes its actual amount from `snapshot`.
    ///
    /// # Errors
    ///
    /// - `BudgetLocked` if the budget is locked
    /// - `NegativeAmount` if the amount is negative
    /// - `UnknownAccount` if the account is not in the ledger
    /// - `DuplicateBudgetLine` if the account already has a line
    pub fn add_line(
        budget: &Budget,
        snapshot: &LedgerSnapshot,
        input: NewBudgetLine,
    ) -> Result<Budget, BudgetError> {
        if budget.is_locked {
            return Err(BudgetError::BudgetLocked(budget.id));
        }
        if input.budgeted_amount < Decimal::ZERO {
            return Err(BudgetError::NegativeAmount(input.budgeted_amount));
        }
        if snapshot.account(input.account_id).is_none() {
            return Err(BudgetError::UnknownAccount(input.account_id));
        }
        if budget.references(input.account_id) {
            return Err(BudgetError::DuplicateBudgetLine(input.account_id));
        }

        let mut updated = budget.clone();
        updated.lines.push(BudgetLine {
            id: BudgetLineId::new(),
            budget_id: budget.id,
            account_id: input.account_id,
            budgeted_amount: input.budgeted_amount,
            actual_amount: Decimal::ZERO,
            variance: Decimal::ZERO,
        });
        updated.refresh_total();
        Ok(Self::reconcile(&updated, snapshot))
    }

    /// Locks a budget against further line changes.
    #[must_use]
    pub fn lock(budget: &Budget) -> Budget {
        Budget {
            is_locked: true,
            ..budget.clone()
        }
    }

    /// Recomputes every line's actual amount from posted entries dated
    /// within the budget range.
    ///
    /// Converges: reconciling twice against the same snapshot changes nothing.
    #[must_use]
    pub fn reconcile(budget: &Budget, snapshot: &LedgerSnapshot) -> Budget {
        let query = BalanceQuery::between(budget.start_date, budget.end_date);
        let balances = BalanceAggregator::all_balances(snapshot, &query);

        let mut updated = budget.clone();
        for line in &mut updated.lines {
            let actual = balances
                .get(&line.account_id)
                .map_or(Decimal::ZERO, |balance| balance.balance);
            line.set_actual(actual);
        }
        updated.reconciled_version = Some(snapshot.version());

        debug!(
            tenant_id = %budget.tenant_id,
            budget_id = %budget.id,
            version = snapshot.version(),
            lines = updated.lines.len(),
            "budget reconciled"
        );
        updated
    }

    /// Returns true if posting or voiding `entry` can change this budget's actuals.
    #[must_use]
    pub fn is_affected_by(budget: &Budget, entry: &JournalEntry) -> bool {
        budget.is_active
            && budget.covers(entry.entry_date)
            && entry.lines.iter().any(|line| budget.references(line.account_id))
    }

    /// Calculate variance between budgeted and actual amounts.
    ///
    /// `variance = actual - budgeted` for every class. The status depends on
    /// the class: for revenue, coming in above budget is favorable; for
    /// expenses (and balance sheet accounts), coming in above budget is
    /// unfavorable.
    #[must_use]
    pub fn calculate_variance(
        budgeted: Decimal,
        actual: Decimal,
        class: AccountClass,
    ) -> VarianceResult {
        let variance = actual - budgeted;

        let favorable_direction = match class {
            AccountClass::Revenue => variance,
            AccountClass::Asset
            | AccountClass::Liability
            | AccountClass::Equity
            | AccountClass::Expense => -variance,
        };
        let status = match favorable_direction.cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Greater => VarianceStatus::Favorable,
            std::cmp::Ordering::Less => VarianceStatus::Unfavorable,
            std::cmp::Ordering::Equal => VarianceStatus::OnBudget,
        };

        VarianceResult {
            budgeted,
            actual,
            variance,
            variance_percent: percent_of(variance, budgeted),
            utilization_percent: percent_of(actual, budgeted),
            status,
        }
    }

    /// Budget vs actual analysis against a fresh reconciliation.
    #[must_use]
    pub fn budget_vs_actual(budget: &Budget, snapshot: &LedgerSnapshot) -> BudgetVsActualReport {
        let reconciled = Self::reconcile(budget, snapshot);

        let mut lines: Vec<BudgetLineWithActual> = reconciled
            .lines
            .iter()
            .filter_map(|line| {
                let account = snapshot.account(line.account_id)?;
                Some(BudgetLineWithActual {
                    line_id: line.id,
                    account_id: account.id,
                    account_code: account.code.clone(),
                    account_name: account.name.clone(),
                    class: account.class,
                    variance: Self::calculate_variance(
                        line.budgeted_amount,
                        line.actual_amount,
                        account.class,
                    ),
                })
            })
            .collect();
        lines.sort_by(|a, b| a.account_code.cmp(&b.account_code));

        let total_budgeted: Decimal = lines.iter().map(|line| line.variance.budgeted).sum();
        let total_actual: Decimal = lines.iter().map(|line| line.variance.actual).sum();

        BudgetVsActualReport {
            budget_id: budget.id,
            budget_name: budget.name.clone(),
            start_date: budget.start_date,
            end_date: budget.end_date,
            lines,
            summary: BudgetVsActualSummary {
                total_budgeted,
                total_actual,
                total_variance: total_actual - total_budgeted,
                overall_utilization: percent_of(total_actual, total_budgeted),
            },
        }
    }
}
