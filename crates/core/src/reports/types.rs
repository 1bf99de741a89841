//! Report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, InvoiceId};

use crate::ledger::types::AccountClass;

/// One account's balance on a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account class.
    pub class: AccountClass,
    /// Signed balance.
    pub balance: Decimal,
}

/// A group of statement lines with their total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSection {
    /// Lines ordered by account code.
    pub lines: Vec<ReportLine>,
    /// Sum of line balances.
    pub total: Decimal,
}

impl StatementSection {
    pub(crate) fn push(&mut self, line: ReportLine) {
        self.total += line.balance;
        self.lines.push(line);
    }
}

/// Profit and loss over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitAndLoss {
    /// First day included.
    pub period_start: NaiveDate,
    /// Last day included.
    pub period_end: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Revenue accounts.
    pub revenue: StatementSection,
    /// Expense accounts.
    pub expenses: StatementSection,
    /// Σ revenue.
    pub total_revenue: Decimal,
    /// Σ expenses.
    pub total_expenses: Decimal,
    /// Revenue minus expenses.
    pub net_income: Decimal,
    /// Net income over revenue; zero without revenue.
    pub net_margin: Decimal,
    /// `net_margin` × 100, two places.
    pub net_margin_percent: Decimal,
}

/// Balance sheet at a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// Statement date.
    pub as_of: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Asset accounts.
    pub assets: StatementSection,
    /// Liability accounts.
    pub liabilities: StatementSection,
    /// Equity accounts, excluding retained earnings.
    pub equity: StatementSection,
    /// Net income from the start of the ledger through `as_of`.
    pub retained_earnings: Decimal,
    /// Total assets.
    pub total_assets: Decimal,
    /// Total liabilities.
    pub total_liabilities: Decimal,
    /// Equity section plus retained earnings.
    pub total_equity: Decimal,
    /// Liabilities plus total equity.
    pub liabilities_and_equity: Decimal,
    /// Assets match liabilities plus equity within tolerance.
    pub balanced: bool,
}

/// Cash flow statement over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    /// First day included.
    pub period_start: NaiveDate,
    /// Last day included.
    pub period_end: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Customer payments received in the period.
    pub cash_received: Decimal,
    /// Expenses paid in the period.
    pub cash_paid: Decimal,
    /// Received minus paid.
    pub operating: Decimal,
    /// Negative of fixed asset purchases in the period.
    pub investing: Decimal,
    /// Always zero; no financing instruments are modelled.
    pub financing: Decimal,
    /// Operating plus investing plus financing.
    pub net_change: Decimal,
    /// Ending cash minus net change.
    pub beginning_cash: Decimal,
    /// Balance of cash accounts at `period_end`.
    pub ending_cash: Decimal,
}

/// One open invoice on the aging report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingItem {
    /// Invoice ID.
    pub invoice_id: InvoiceId,
    /// Invoice number.
    pub invoice_number: String,
    /// Customer.
    pub customer_name: String,
    /// Due date.
    pub due_date: NaiveDate,
    /// Days past due; negative when not yet due.
    pub days_overdue: i64,
    /// Amount still owed.
    pub balance_due: Decimal,
}

/// One aging bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingBucket {
    /// Display label such as "31-60".
    pub label: String,
    /// Lowest days overdue in the bucket; the first bucket also holds invoices not yet due.
    pub from_days: i64,
    /// Highest days overdue in the bucket; open-ended when `None`.
    pub to_days: Option<i64>,
    /// Invoices in the bucket.
    pub items: Vec<AgingItem>,
    /// Number of invoices.
    pub count: usize,
    /// Σ balance due.
    pub amount: Decimal,
}

/// Receivables aging at a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingReport {
    /// Date days overdue are measured from.
    pub as_of: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Four buckets, youngest first.
    pub buckets: Vec<AgingBucket>,
    /// Σ balance due of all open invoices.
    pub total_outstanding: Decimal,
}

/// One 30-day slice of the cash forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastBucket {
    /// 1-based bucket number.
    pub index: u32,
    /// First due date counted (items already overdue also land in bucket 1).
    pub start: NaiveDate,
    /// Last due date counted.
    pub end: NaiveDate,
    /// Receivables due in the bucket.
    pub inflows: Decimal,
    /// Payables due in the bucket.
    pub outflows: Decimal,
    /// Inflows minus outflows.
    pub net: Decimal,
    /// Projected cash at the end of the bucket.
    pub closing_cash: Decimal,
}

/// Cash forecast over a horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowForecast {
    /// Forecast start.
    pub as_of: NaiveDate,
    /// Horizon in days.
    pub horizon_days: u32,
    /// Currency code.
    pub currency: String,
    /// Cash account balances today.
    pub current_cash: Decimal,
    /// Σ open receivables due within the horizon.
    pub expected_inflows: Decimal,
    /// Σ open payables due within the horizon.
    pub expected_outflows: Decimal,
    /// Current cash plus inflows minus outflows.
    pub projected_cash: Decimal,
    /// Breakdown by 30-day bucket.
    pub buckets: Vec<ForecastBucket>,
}

/// One account on the trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account class.
    pub class: AccountClass,
    /// Σ debits.
    pub debit_total: Decimal,
    /// Σ credits.
    pub credit_total: Decimal,
    /// Signed balance.
    pub balance: Decimal,
}

/// Trial balance at a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// Balance date.
    pub as_of: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Accounts with activity, ordered by code.
    pub lines: Vec<TrialBalanceLine>,
    /// Σ debits.
    pub total_debit: Decimal,
    /// Σ credits.
    pub total_credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

/// Headline ratios from the balance sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialRatios {
    /// Ratio date.
    pub as_of: NaiveDate,
    /// Total assets.
    pub total_assets: Decimal,
    /// Total liabilities.
    pub total_liabilities: Decimal,
    /// Total equity including retained earnings.
    pub total_equity: Decimal,
    /// Assets over liabilities.
    pub current_ratio: Decimal,
    /// Liabilities over equity.
    pub debt_to_equity: Decimal,
    /// Assets minus liabilities.
    pub working_capital: Decimal,
}
