//! Budget data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, BudgetId, BudgetLineId, TenantId};

use crate::ledger::types::AccountClass;

/// Budget period classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetPeriod {
    /// Monthly budget.
    Monthly,
    /// Quarterly budget.
    Quarterly,
    /// Budget covering a full year.
    Annual,
    /// Project-based budget with an arbitrary range.
    Project,
}

/// A budget record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Budget ID.
    pub id: BudgetId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Budget name.
    pub name: String,
    /// Period type.
    pub period_type: BudgetPeriod,
    /// First day covered.
    pub start_date: NaiveDate,
    /// Last day covered.
    pub end_date: NaiveDate,
    /// Inactive budgets are not reconciled after postings.
    pub is_active: bool,
    /// Whether the budget is locked (no line changes allowed).
    pub is_locked: bool,
    /// Lines, one per account.
    pub lines: Vec<BudgetLine>,
    /// Σ budgeted amounts.
    pub total_budget: Decimal,
    /// Ledger version the actuals were computed from.
    pub reconciled_version: Option<u64>,
}

impl Budget {
    /// Returns true if `date` falls within the budget range.
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// The line for `account_id`, if any.
    #[must_use]
    pub fn line_for(&self, account_id: AccountId) -> Option<&BudgetLine> {
        self.lines.iter().find(|line| line.account_id == account_id)
    }

    /// Returns true if any line budgets against `account_id`.
    #[must_use]
    pub fn references(&self, account_id: AccountId) -> bool {
        self.line_for(account_id).is_some()
    }

    pub(crate) fn refresh_total(&mut self) {
        self.total_budget = self.lines.iter().map(|line| line.budgeted_amount).sum();
    }
}

/// A budget line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetLine {
    /// Budget line ID.
    pub id: BudgetLineId,
    /// Parent budget ID.
    pub budget_id: BudgetId,
    /// Account ID.
    pub account_id: AccountId,
    /// Budgeted amount.
    pub budgeted_amount: Decimal,
    /// Posted balance of the account over the budget range.
    pub actual_amount: Decimal,
    /// `actual_amount - budgeted_amount`.
    pub variance: Decimal,
}

impl BudgetLine {
    pub(crate) fn set_actual(&mut self, actual: Decimal) {
        self.actual_amount = actual;
        self.variance = actual - self.budgeted_amount;
    }
}

/// Input for creating a new budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBudget {
    /// Budget name.
    pub name: String,
    /// Period type.
    pub period_type: BudgetPeriod,
    /// First day covered.
    pub start_date: NaiveDate,
    /// Last day covered.
    pub end_date: NaiveDate,
}

/// Input for creating a budget line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBudgetLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Budgeted amount.
    pub budgeted_amount: Decimal,
}

/// Variance status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VarianceStatus {
    /// Favorable variance (under budget for expenses, over target for revenue).
    Favorable,
    /// Unfavorable variance (over budget for expenses, under target for revenue).
    Unfavorable,
    /// On budget (no variance).
    OnBudget,
}

/// Variance calculation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceResult {
    /// Budgeted amount.
    pub budgeted: Decimal,
    /// Actual amount.
    pub actual: Decimal,
    /// `actual - budgeted`.
    pub variance: Decimal,
    /// Variance percentage.
    pub variance_percent: Decimal,
    /// Utilization percentage.
    pub utilization_percent: Decimal,
    /// Variance status.
    pub status: VarianceStatus,
}

/// Budget line with its account and variance analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetLineWithActual {
    /// Budget line ID.
    pub line_id: BudgetLineId,
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub account_code: String,
    /// Account name.
    pub account_name: String,
    /// Account class, which decides the variance status.
    pub class: AccountClass,
    /// Variance figures.
    #[serde(flatten)]
    pub variance: VarianceResult,
}

/// Budget vs actual report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetVsActualReport {
    /// Budget ID.
    pub budget_id: BudgetId,
    /// Budget name.
    pub budget_name: String,
    /// First day covered.
    pub start_date: NaiveDate,
    /// Last day covered.
    pub end_date: NaiveDate,
    /// Lines ordered by account code.
    pub lines: Vec<BudgetLineWithActual>,
    /// Summary totals.
    pub summary: BudgetVsActualSummary,
}

/// Budget vs actual summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetVsActualSummary {
    /// Total budgeted amount.
    pub total_budgeted: Decimal,
    /// Total actual amount.
    pub total_actual: Decimal,
    /// Total variance.
    pub total_variance: Decimal,
    /// Overall utilization percentage.
    pub overall_utilization: Decimal,
}
