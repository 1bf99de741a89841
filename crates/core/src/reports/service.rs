//! Statement engine.
//!
//! Every report is a pure function of a ledger snapshot and its parameters.
//! Balances come from one aggregation pass per report; DRAFT and VOID
//! entries never count.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use tally_shared::AppConfig;
use tally_shared::types::{AccountId, percent_of, safe_ratio, within_tolerance};

use super::error::ReportError;
use super::types::{
    AgingBucket, AgingItem, AgingReport, BalanceSheet, CashFlowForecast, CashFlowStatement,
    FinancialRatios, ForecastBucket, ProfitAndLoss, ReportLine, StatementSection, TrialBalance,
    TrialBalanceLine,
};
use crate::balance::{AccountBalance, BalanceAggregator, BalanceQuery};
use crate::depreciation::types::FixedAsset;
use crate::ledger::state::LedgerSnapshot;
use crate::ledger::types::{Account, AccountClass};

/// Width of one cash forecast bucket.
const FORECAST_BUCKET_DAYS: u32 = 30;

/// Longest accepted forecast horizon (ten years).
pub const MAX_FORECAST_HORIZON_DAYS: u32 = 3660;

/// Number of aging buckets.
const AGING_BUCKETS: i64 = 4;

/// Report settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    /// Currency code printed on reports.
    pub currency: String,
    /// Balance sheet tolerance.
    pub balance_tolerance: Decimal,
    /// Lower-case name fragments that mark an asset account as cash.
    pub cash_account_keywords: Vec<String>,
    /// Width of each aging bucket in days.
    pub aging_bucket_days: u32,
    /// Default forecast horizon in days.
    pub forecast_horizon_days: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ReportSettings {
    /// Builds settings from the application configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            currency: config.ledger.currency.clone(),
            balance_tolerance: config.ledger.balance_tolerance,
            cash_account_keywords: config
                .reports
                .cash_account_keywords
                .iter()
                .map(|keyword| keyword.to_lowercase())
                .collect(),
            aging_bucket_days: config.reports.aging_bucket_days.max(1),
            forecast_horizon_days: config.reports.forecast_horizon_days,
        }
    }
}

/// Builds financial statements from ledger snapshots.
#[derive(Debug, Clone, Default)]
pub struct StatementEngine {
    settings: ReportSettings,
}

impl StatementEngine {
    /// Creates an engine with the given settings.
    #[must_use]
    pub fn new(settings: ReportSettings) -> Self {
        Self { settings }
    }

    /// Settings in use.
    #[must_use]
    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Returns true for asset accounts flagged as cash or named like one.
    #[must_use]
    pub fn is_cash_account(&self, account: &Account) -> bool {
        if account.class != AccountClass::Asset {
            return false;
        }
        if account.cash_equivalent {
            return true;
        }
        let name = account.name.to_lowercase();
        self.settings
            .cash_account_keywords
            .iter()
            .any(|keyword| name.contains(keyword.as_str()))
    }

    fn cash_balance(&self, snapshot: &LedgerSnapshot, as_of: NaiveDate) -> Decimal {
        let balances = BalanceAggregator::all_balances(snapshot, &BalanceQuery::as_of(as_of));
        snapshot
            .accounts()
            .filter(|account| self.is_cash_account(account))
            .filter_map(|account| balances.get(&account.id))
            .map(|balance| balance.balance)
            .sum()
    }

    /// Report lines for accounts of `class` with a non-zero balance, by code.
    fn section(
        snapshot: &LedgerSnapshot,
        balances: &BTreeMap<AccountId, AccountBalance>,
        class: AccountClass,
    ) -> StatementSection {
        let mut section = StatementSection::default();
        for account in snapshot
            .accounts_by_code()
            .into_iter()
            .filter(|account| account.class == class)
        {
            let Some(balance) = balances.get(&account.id) else {
                continue;
            };
            if balance.balance.is_zero() {
                continue;
            }
            section.push(ReportLine {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                class: account.class,
                balance: balance.balance,
            });
        }
        section
    }

    fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(())
    }

    // ========== Profit & Loss ==========

    /// Profit and loss for entries dated within `[start, end]`.
    ///
    /// # Errors
    ///
    /// `InvalidDateRange` if `start > end`.
    pub fn profit_and_loss(
        &self,
        snapshot: &LedgerSnapshot,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ProfitAndLoss, ReportError> {
        Self::check_range(start, end)?;

        let balances = BalanceAggregator::all_balances(snapshot, &BalanceQuery::between(start, end));
        let revenue = Self::section(snapshot, &balances, AccountClass::Revenue);
        let expenses = Self::section(snapshot, &balances, AccountClass::Expense);

        let total_revenue = revenue.total;
        let total_expenses = expenses.total;
        let net_income = total_revenue - total_expenses;

        Ok(ProfitAndLoss {
            period_start: start,
            period_end: end,
            currency: self.settings.currency.clone(),
            revenue,
            expenses,
            total_revenue,
            total_expenses,
            net_income,
            net_margin: safe_ratio(net_income, total_revenue),
            net_margin_percent: percent_of(net_income, total_revenue),
        })
    }

    // ========== Balance Sheet ==========

    /// Balance sheet at `as_of`, with retained earnings folded into equity.
    #[must_use]
    pub fn balance_sheet(&self, snapshot: &LedgerSnapshot, as_of: NaiveDate) -> BalanceSheet {
        let balances = BalanceAggregator::all_balances(snapshot, &BalanceQuery::as_of(as_of));

        let assets = Self::section(snapshot, &balances, AccountClass::Asset);
        let liabilities = Self::section(snapshot, &balances, AccountClass::Liability);
        let equity = Self::section(snapshot, &balances, AccountClass::Equity);

        // Income statement accounts from the start of the ledger.
        let retained_earnings = Self::section(snapshot, &balances, AccountClass::Revenue).total
            - Self::section(snapshot, &balances, AccountClass::Expense).total;

        let total_assets = assets.total;
        let total_liabilities = liabilities.total;
        let total_equity = equity.total + retained_earnings;
        let liabilities_and_equity = total_liabilities + total_equity;

        BalanceSheet {
            as_of,
            currency: self.settings.currency.clone(),
            assets,
            liabilities,
            equity,
            retained_earnings,
            total_assets,
            total_liabilities,
            total_equity,
            liabilities_and_equity,
            balanced: within_tolerance(
                total_assets,
                liabilities_and_equity,
                self.settings.balance_tolerance,
            ),
        }
    }

    // ========== Cash Flow Statement ==========

    /// Cash flow statement for `[start, end]`.
    ///
    /// Operating cash comes from customer payments and paid expenses;
    /// investing is the cost of assets bought in the period.
    ///
    /// # Errors
    ///
    /// `InvalidDateRange` if `start > end`.
    pub fn cash_flow_statement(
        &self,
        snapshot: &LedgerSnapshot,
        assets: &[FixedAsset],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<CashFlowStatement, ReportError> {
        Self::check_range(start, end)?;
        let in_range = |date: NaiveDate| date >= start && date <= end;

        let cash_received: Decimal = snapshot
            .payments()
            .filter(|payment| in_range(payment.payment_date))
            .map(|payment| payment.amount)
            .sum();
        let cash_paid: Decimal = snapshot
            .expenses()
            .filter(|expense| expense.cash_date().is_some_and(in_range))
            .map(|expense| expense.amount)
            .sum();
        let purchases: Decimal = assets
            .iter()
            .filter(|asset| in_range(asset.purchase_date))
            .map(|asset| asset.purchase_cost)
            .sum();

        let operating = cash_received - cash_paid;
        let investing = -purchases;
        let financing = Decimal::ZERO;
        let net_change = operating + investing + financing;
        let ending_cash = self.cash_balance(snapshot, end);

        Ok(CashFlowStatement {
            period_start: start,
            period_end: end,
            currency: self.settings.currency.clone(),
            cash_received,
            cash_paid,
            operating,
            investing,
            financing,
            net_change,
            beginning_cash: ending_cash - net_change,
            ending_cash,
        })
    }

    // ========== Receivables Aging ==========

    /// Open invoices bucketed by days past due.
    ///
    /// Bucket boundaries are inclusive on the upper end, so an invoice exactly
    /// one bucket width overdue stays in the first bucket. Invoices not yet due
    /// count as current.
    #[must_use]
    pub fn aging(&self, snapshot: &LedgerSnapshot, today: NaiveDate) -> AgingReport {
        let width = i64::from(self.settings.aging_bucket_days);
        let last_slot = usize::try_from(AGING_BUCKETS - 1).unwrap_or_default();
        let mut buckets: Vec<AgingBucket> = (0..AGING_BUCKETS)
            .map(|index| {
                let from_days = if index == 0 { 0 } else { index * width + 1 };
                let to_days = (index + 1 < AGING_BUCKETS).then_some((index + 1) * width);
                let label = match to_days {
                    Some(to) => format!("{from_days}-{to}"),
                    None => format!("{}+", index * width),
                };
                AgingBucket {
                    label,
                    from_days,
                    to_days,
                    items: Vec::new(),
                    count: 0,
                    amount: Decimal::ZERO,
                }
            })
            .collect();

        let mut total_outstanding = Decimal::ZERO;
        for invoice in snapshot.invoices().filter(|invoice| invoice.is_open()) {
            let days_overdue = invoice.days_overdue(today);
            let slot = if days_overdue <= width {
                0
            } else {
                usize::try_from((days_overdue - 1) / width).map_or(last_slot, |slot| slot.min(last_slot))
            };

            let balance_due = invoice.balance_due();
            let bucket = &mut buckets[slot];
            bucket.count += 1;
            bucket.amount += balance_due;
            bucket.items.push(AgingItem {
                invoice_id: invoice.id,
                invoice_number: invoice.invoice_number.clone(),
                customer_name: invoice.customer_name.clone(),
                due_date: invoice.due_date,
                days_overdue,
                balance_due,
            });
            total_outstanding += balance_due;
        }

        for bucket in &mut buckets {
            bucket.items.sort_by(|a, b| {
                b.days_overdue
                    .cmp(&a.days_overdue)
                    .then_with(|| a.invoice_number.cmp(&b.invoice_number))
            });
        }

        AgingReport {
            as_of: today,
            currency: self.settings.currency.clone(),
            buckets,
            total_outstanding,
        }
    }

    // ========== Cash Flow Forecast ==========

    /// Projects cash over `horizon_days` from today's cash balance and the
    /// open receivables and payables falling due.
    ///
    /// Overdue items are expected in the first bucket.
    ///
    /// # Errors
    ///
    /// `InvalidHorizon` if the horizon exceeds [`MAX_FORECAST_HORIZON_DAYS`]
    /// or runs past the last representable date.
    pub fn forecast(
        &self,
        snapshot: &LedgerSnapshot,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Result<CashFlowForecast, ReportError> {
        let invalid = || ReportError::InvalidHorizon {
            days: horizon_days,
            max: MAX_FORECAST_HORIZON_DAYS,
        };
        if horizon_days > MAX_FORECAST_HORIZON_DAYS {
            return Err(invalid());
        }
        let horizon_end = today
            .checked_add_days(Days::new(u64::from(horizon_days)))
            .ok_or_else(invalid)?;
        let bucket_count = horizon_days.div_ceil(FORECAST_BUCKET_DAYS).max(1);
        // Every bucket date is capped at the horizon end.
        let offset = |days: u32| {
            today
                .checked_add_days(Days::new(u64::from(days)))
                .map_or(horizon_end, |day| day.min(horizon_end))
        };

        let mut buckets: Vec<ForecastBucket> = (1..=bucket_count)
            .map(|index| {
                let start = if index == 1 {
                    today
                } else {
                    offset((index - 1) * FORECAST_BUCKET_DAYS + 1)
                };
                let end = offset(index * FORECAST_BUCKET_DAYS);
                ForecastBucket {
                    index,
                    start,
                    end,
                    inflows: Decimal::ZERO,
                    outflows: Decimal::ZERO,
                    net: Decimal::ZERO,
                    closing_cash: Decimal::ZERO,
                }
            })
            .collect();

        let last_slot = buckets.len() - 1;
        let slot_for = |due: NaiveDate| -> usize {
            let days_ahead = (due - today).num_days();
            if days_ahead <= 0 {
                return 0;
            }
            let slot = (days_ahead - 1) / i64::from(FORECAST_BUCKET_DAYS);
            usize::try_from(slot).map_or(last_slot, |slot| slot.min(last_slot))
        };

        let receivables: Vec<(usize, Decimal)> = snapshot
            .invoices()
            .filter(|invoice| invoice.is_open() && invoice.due_date <= horizon_end)
            .map(|invoice| (slot_for(invoice.due_date), invoice.balance_due()))
            .collect();
        let payables: Vec<(usize, Decimal)> = snapshot
            .bills()
            .filter(|bill| bill.is_open() && bill.due_date <= horizon_end)
            .map(|bill| (slot_for(bill.due_date), bill.balance_due()))
            .collect();

        for &(slot, amount) in &receivables {
            buckets[slot].inflows += amount;
        }
        for &(slot, amount) in &payables {
            buckets[slot].outflows += amount;
        }

        let current_cash = self.cash_balance(snapshot, today);
        let mut running = current_cash;
        for bucket in &mut buckets {
            bucket.net = bucket.inflows - bucket.outflows;
            running += bucket.net;
            bucket.closing_cash = running;
        }

        let expected_inflows: Decimal = receivables.iter().map(|&(_, amount)| amount).sum();
        let expected_outflows: Decimal = payables.iter().map(|&(_, amount)| amount).sum();

        Ok(CashFlowForecast {
            as_of: today,
            horizon_days,
            currency: self.settings.currency.clone(),
            current_cash,
            expected_inflows,
            expected_outflows,
            projected_cash: current_cash + expected_inflows - expected_outflows,
            buckets,
        })
    }

    // ========== Trial Balance ==========

    /// Debit and credit totals per account at `as_of`.
    ///
    /// Accounts without activity are omitted.
    #[must_use]
    pub fn trial_balance(&self, snapshot: &LedgerSnapshot, as_of: NaiveDate) -> TrialBalance {
        let balances = BalanceAggregator::all_balances(snapshot, &BalanceQuery::as_of(as_of));

        let lines: Vec<TrialBalanceLine> = snapshot
            .accounts_by_code()
            .into_iter()
            .filter_map(|account| {
                let balance = balances.get(&account.id)?;
                if balance.debit_total.is_zero() && balance.credit_total.is_zero() {
                    return None;
                }
                Some(TrialBalanceLine {
                    account_id: account.id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    class: account.class,
                    debit_total: balance.debit_total,
                    credit_total: balance.credit_total,
                    balance: balance.balance,
                })
            })
            .collect();

        let total_debit: Decimal = lines.iter().map(|line| line.debit_total).sum();
        let total_credit: Decimal = lines.iter().map(|line| line.credit_total).sum();

        TrialBalance {
            as_of,
            currency: self.settings.currency.clone(),
            lines,
            total_debit,
            total_credit,
            is_balanced: total_debit == total_credit,
        }
    }

    // ========== Ratios ==========

    /// Current ratio, debt to equity, and working capital at `as_of`.
    #[must_use]
    pub fn financial_ratios(&self, snapshot: &LedgerSnapshot, as_of: NaiveDate) -> FinancialRatios {
        let sheet = self.balance_sheet(snapshot, as_of);
        FinancialRatios {
            as_of,
            total_assets: sheet.total_assets,
            total_liabilities: sheet.total_liabilities,
            total_equity: sheet.total_equity,
            current_ratio: safe_ratio(sheet.total_assets, sheet.total_liabilities).round_dp(4),
            debt_to_equity: safe_ratio(sheet.total_liabilities, sheet.total_equity).round_dp(4),
            working_capital: sheet.total_assets - sheet.total_liabilities,
        }
    }
}
