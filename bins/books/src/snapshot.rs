//! JSON ledger snapshot, replayed through the facade.
//!
//! Everything in the file refers to accounts and invoices by code or number,
//! so a snapshot can be written by hand. Replaying goes through the same
//! operations as any other caller, which means a snapshot that breaks a
//! ledger rule fails to load.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::books::Bookkeeper;
use tally_core::budget::{BudgetPeriod, NewBudget, NewBudgetLine};
use tally_core::clock::Clock;
use tally_core::depreciation::{DepreciationMethod, NewAssetTaxInfo, NewFixedAsset};
use tally_core::ledger::{AccountClass, NewAccount};
use tally_core::reconciliation::{NewStatementLine, StatementLineType};
use tally_core::subledger::{ExpenseStatus, NewBill, NewExpense, NewInvoice, NewPayment};
use tally_shared::types::{AccountId, InvoiceId, TenantId};
use tracing::info;

/// A whole tenant's books.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LedgerFile {
    /// Tenant to load into; a fresh one when absent.
    pub tenant_id: Option<TenantId>,
    /// Chart of accounts; parents must precede children.
    pub accounts: Vec<AccountDoc>,
    /// Journal entries.
    pub entries: Vec<EntryDoc>,
    /// Customer invoices.
    pub invoices: Vec<InvoiceDoc>,
    /// Customer payments.
    pub payments: Vec<PaymentDoc>,
    /// Vendor bills.
    pub bills: Vec<BillDoc>,
    /// Employee expenses.
    pub expenses: Vec<ExpenseDoc>,
    /// Fixed assets.
    pub assets: Vec<AssetDoc>,
    /// Budgets.
    pub budgets: Vec<BudgetDoc>,
    /// Bank statement lines.
    pub bank_lines: Vec<StatementLineDoc>,
}

/// Account row.
#[derive(Debug, Deserialize)]
pub struct AccountDoc {
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account class.
    pub class: AccountClass,
    /// Parent account code.
    #[serde(default)]
    pub parent: Option<String>,
    /// Counts as cash in cash reports.
    #[serde(default)]
    pub cash_equivalent: bool,
    /// Deactivated after the entries are replayed.
    #[serde(default)]
    pub inactive: bool,
}

/// Journal entry.
#[derive(Debug, Deserialize)]
pub struct EntryDoc {
    /// Entry date.
    pub date: NaiveDate,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Post after adding lines; left DRAFT otherwise.
    #[serde(default = "default_post")]
    pub post: bool,
    /// Lines in order.
    pub lines: Vec<LineDoc>,
}

fn default_post() -> bool {
    true
}

/// Journal line.
#[derive(Debug, Deserialize)]
pub struct LineDoc {
    /// Account code.
    pub account: String,
    /// Debit amount.
    #[serde(default)]
    pub debit: Decimal,
    /// Credit amount.
    #[serde(default)]
    pub credit: Decimal,
}

/// Invoice.
#[derive(Debug, Deserialize)]
pub struct InvoiceDoc {
    /// Invoice fields.
    #[serde(flatten)]
    pub invoice: NewInvoice,
    /// Mark as sent after recording.
    #[serde(default)]
    pub sent: bool,
}

/// Payment.
#[derive(Debug, Deserialize)]
pub struct PaymentDoc {
    /// Invoice number the payment applies to.
    #[serde(default)]
    pub invoice: Option<String>,
    /// Payment date.
    pub date: NaiveDate,
    /// Amount received.
    pub amount: Decimal,
    /// Payment method.
    #[serde(default)]
    pub method: String,
}

/// Bill.
#[derive(Debug, Deserialize)]
pub struct BillDoc {
    /// Bill fields.
    #[serde(flatten)]
    pub bill: NewBill,
    /// Approve after recording.
    #[serde(default)]
    pub approved: bool,
    /// Payments made against the bill; implies approval.
    #[serde(default)]
    pub payments: Vec<Decimal>,
}

/// Expense.
#[derive(Debug, Deserialize)]
pub struct ExpenseDoc {
    /// Expense number.
    pub expense_number: String,
    /// Expense date.
    pub date: NaiveDate,
    /// Amount.
    pub amount: Decimal,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Expense account code.
    #[serde(default)]
    pub account: Option<String>,
    /// Status to walk the expense to.
    #[serde(default = "default_expense_status")]
    pub status: ExpenseStatus,
}

fn default_expense_status() -> ExpenseStatus {
    ExpenseStatus::Draft
}

/// Fixed asset.
#[derive(Debug, Deserialize)]
pub struct AssetDoc {
    /// Asset code.
    pub asset_code: String,
    /// Name.
    pub name: String,
    /// Asset account code.
    pub account: String,
    /// Purchase date.
    pub purchase_date: NaiveDate,
    /// Purchase cost.
    pub purchase_cost: Decimal,
    /// Salvage value.
    #[serde(default)]
    pub salvage_value: Decimal,
    /// Useful life in years.
    pub useful_life_years: u32,
    /// Book method.
    #[serde(default = "default_method")]
    pub method: DepreciationMethod,
    /// False for land.
    #[serde(default = "default_post")]
    pub depreciable: bool,
    /// Depreciation already recorded before the snapshot.
    #[serde(default)]
    pub opening_accumulated_depreciation: Decimal,
    /// Depreciation expense account code.
    #[serde(default)]
    pub expense_account: Option<String>,
    /// Accumulated depreciation account code.
    #[serde(default)]
    pub accumulated_account: Option<String>,
    /// Tax information.
    #[serde(default)]
    pub tax: Option<NewAssetTaxInfo>,
}

fn default_method() -> DepreciationMethod {
    DepreciationMethod::StraightLine
}

/// Budget.
#[derive(Debug, Deserialize)]
pub struct BudgetDoc {
    /// Name.
    pub name: String,
    /// Period classification.
    pub period_type: BudgetPeriod,
    /// First day covered.
    pub start_date: NaiveDate,
    /// Last day covered.
    pub end_date: NaiveDate,
    /// Lock after adding lines.
    #[serde(default)]
    pub locked: bool,
    /// Budget lines.
    #[serde(default)]
    pub lines: Vec<BudgetLineDoc>,
}

/// Budget line.
#[derive(Debug, Deserialize)]
pub struct BudgetLineDoc {
    /// Account code.
    pub account: String,
    /// Budgeted amount.
    pub amount: Decimal,
}

/// Bank statement line.
#[derive(Debug, Deserialize)]
pub struct StatementLineDoc {
    /// Bank account code.
    pub account: String,
    /// Date the bank booked the line.
    pub date: NaiveDate,
    /// Bank description.
    #[serde(default)]
    pub description: String,
    /// Signed amount, deposits positive.
    pub amount: Decimal,
    /// Line kind.
    #[serde(rename = "type")]
    pub line_type: StatementLineType,
    /// Bank transaction ID.
    pub transaction_id: String,
    /// Check number for cleared checks.
    #[serde(default)]
    pub check_number: Option<String>,
    /// Already matched against the books.
    #[serde(default)]
    pub matched: bool,
}

impl LedgerFile {
    /// Parses a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid snapshot.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid ledger snapshot")
    }

    /// Replays the snapshot into `keeper` and returns the tenant it loaded.
    ///
    /// # Errors
    ///
    /// The first operation the books reject, with the offending item named.
    pub fn replay<C: Clock>(self, keeper: &Bookkeeper<C>) -> Result<TenantId> {
        let tenant = self.tenant_id.unwrap_or_else(TenantId::new);
        let mut codes: HashMap<String, AccountId> = HashMap::new();
        let mut inactive = Vec::new();

        for doc in self.accounts {
            let mut input = NewAccount::new(&doc.code, doc.name, doc.class);
            input.cash_equivalent = doc.cash_equivalent;
            if let Some(parent) = &doc.parent {
                input = input.with_parent(lookup(&codes, parent)?);
            }
            let account = keeper
                .create_account(tenant, input)
                .with_context(|| format!("account {}", doc.code))?;
            if doc.inactive {
                inactive.push(account.id);
            }
            codes.insert(doc.code, account.id);
        }

        for doc in self.assets {
            let code = doc.asset_code.clone();
            let tax = doc.tax;
            let input = NewFixedAsset {
                asset_code: doc.asset_code,
                name: doc.name,
                account_id: lookup(&codes, &doc.account)?,
                purchase_date: doc.purchase_date,
                purchase_cost: doc.purchase_cost,
                salvage_value: doc.salvage_value,
                useful_life_years: doc.useful_life_years,
                method: doc.method,
                depreciable: doc.depreciable,
                opening_accumulated_depreciation: doc.opening_accumulated_depreciation,
                expense_account_id: lookup_opt(&codes, doc.expense_account.as_deref())?,
                accumulated_account_id: lookup_opt(&codes, doc.accumulated_account.as_deref())?,
            };
            let asset = keeper
                .register_asset(tenant, input)
                .with_context(|| format!("asset {code}"))?;
            if let Some(tax) = tax {
                keeper.attach_tax_info(tenant, asset.id, tax)?;
            }
        }

        for (index, doc) in self.entries.into_iter().enumerate() {
            let label = format!("entry #{} ({})", index + 1, doc.date);
            let handle = keeper.create_entry(tenant, doc.date, doc.description)?;
            for (line_number, line) in (1u32..).zip(&doc.lines) {
                keeper
                    .add_line(
                        tenant,
                        &handle,
                        lookup(&codes, &line.account)?,
                        line.debit,
                        line.credit,
                        line_number,
                    )
                    .with_context(|| format!("{label}, line {line_number}"))?;
            }
            if doc.post {
                keeper
                    .post_journal_entry(tenant, handle.entry_id, None)
                    .with_context(|| label.clone())?;
            }
        }

        let mut invoices: HashMap<String, InvoiceId> = HashMap::new();
        for doc in self.invoices {
            let number = doc.invoice.invoice_number.clone();
            let invoice = keeper
                .record_invoice(tenant, doc.invoice)
                .with_context(|| format!("invoice {number}"))?;
            if doc.sent {
                keeper.send_invoice(tenant, invoice.id)?;
            }
            invoices.insert(number, invoice.id);
        }

        for doc in self.payments {
            let invoice_id = doc
                .invoice
                .as_deref()
                .map(|number| {
                    invoices
                        .get(number)
                        .copied()
                        .ok_or_else(|| anyhow!("unknown invoice {number}"))
                })
                .transpose()?;
            keeper
                .record_payment(
                    tenant,
                    NewPayment {
                        invoice_id,
                        payment_date: doc.date,
                        amount: doc.amount,
                        method: doc.method,
                    },
                )
                .with_context(|| format!("payment of {} on {}", doc.amount, doc.date))?;
        }

        for doc in self.bills {
            let number = doc.bill.bill_number.clone();
            let bill = keeper
                .record_bill(tenant, doc.bill)
                .with_context(|| format!("bill {number}"))?;
            if doc.approved || !doc.payments.is_empty() {
                keeper.approve_bill(tenant, bill.id)?;
            }
            for amount in doc.payments {
                keeper
                    .pay_bill(tenant, bill.id, amount)
                    .with_context(|| format!("bill {number}"))?;
            }
        }

        for doc in self.expenses {
            let number = doc.expense_number.clone();
            let expense = keeper
                .record_expense(
                    tenant,
                    NewExpense {
                        expense_number: doc.expense_number,
                        expense_date: doc.date,
                        amount: doc.amount,
                        description: doc.description,
                        account_id: lookup_opt(&codes, doc.account.as_deref())?,
                    },
                )
                .with_context(|| format!("expense {number}"))?;
            for step in expense_path(doc.status) {
                keeper
                    .advance_expense(tenant, expense.id, *step)
                    .with_context(|| format!("expense {number}"))?;
            }
        }

        for doc in self.budgets {
            let name = doc.name.clone();
            let budget = keeper
                .create_budget(
                    tenant,
                    NewBudget {
                        name: doc.name,
                        period_type: doc.period_type,
                        start_date: doc.start_date,
                        end_date: doc.end_date,
                    },
                )
                .with_context(|| format!("budget {name}"))?;
            for line in &doc.lines {
                keeper
                    .add_budget_line(
                        tenant,
                        budget.id,
                        NewBudgetLine {
                            account_id: lookup(&codes, &line.account)?,
                            budgeted_amount: line.amount,
                        },
                    )
                    .with_context(|| format!("budget {name}, account {}", line.account))?;
            }
            if doc.locked {
                keeper.lock_budget(tenant, budget.id)?;
            }
        }

        for doc in self.bank_lines {
            let transaction = doc.transaction_id.clone();
            let line = keeper
                .import_statement_line(
                    tenant,
                    NewStatementLine {
                        account_id: lookup(&codes, &doc.account)?,
                        statement_date: doc.date,
                        description: doc.description,
                        amount: doc.amount,
                        line_type: doc.line_type,
                        reference_number: None,
                        check_number: doc.check_number,
                        transaction_id: doc.transaction_id,
                    },
                )
                .with_context(|| format!("bank line {transaction}"))?;
            if doc.matched {
                keeper.match_statement_line(tenant, line.id, None)?;
            }
        }

        // Deactivated only once their history is in place.
        for account_id in inactive {
            keeper.deactivate_account(tenant, account_id)?;
        }

        info!(
            tenant_id = %tenant,
            accounts = codes.len(),
            version = keeper.tenant(tenant).ledger().version(),
            "snapshot replayed"
        );
        Ok(tenant)
    }
}

fn lookup(codes: &HashMap<String, AccountId>, code: &str) -> Result<AccountId> {
    codes
        .get(code)
        .copied()
        .ok_or_else(|| anyhow!("unknown account code {code}"))
}

fn lookup_opt(codes: &HashMap<String, AccountId>, code: Option<&str>) -> Result<Option<AccountId>> {
    code.map(|code| lookup(codes, code)).transpose()
}

/// Workflow steps from DRAFT to `target`.
fn expense_path(target: ExpenseStatus) -> &'static [ExpenseStatus] {
    use ExpenseStatus::{Approved, Draft, Paid, Rejected, Submitted};
    match target {
        Draft => &[],
        Submitted => &[Submitted],
        Approved => &[Submitted, Approved],
        Rejected => &[Submitted, Rejected],
        Paid => &[Submitted, Approved, Paid],
    }
}
