//! Receivable and payable source documents.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, BillId, ExpenseId, InvoiceId, PaymentId, TenantId};

/// Invoice lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Not yet sent to the customer.
    Draft,
    /// Sent and awaiting payment.
    Sent,
    /// Some payments received.
    PartiallyPaid,
    /// Fully settled.
    Paid,
    /// Withdrawn.
    Cancelled,
}

/// A customer invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice ID.
    pub id: InvoiceId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Unique invoice number.
    pub invoice_number: String,
    /// Customer display name.
    pub customer_name: String,
    /// Issue date.
    pub invoice_date: NaiveDate,
    /// Payment due date.
    pub due_date: NaiveDate,
    /// Invoice total.
    pub total_amount: Decimal,
    /// Sum of applied payments.
    pub paid_amount: Decimal,
    /// Lifecycle status.
    pub status: InvoiceStatus,
}

impl Invoice {
    /// Amount still owed.
    #[must_use]
    pub fn balance_due(&self) -> Decimal {
        self.total_amount - self.paid_amount
    }

    /// Sent or partially paid with money still owed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.status, InvoiceStatus::Sent | InvoiceStatus::PartiallyPaid)
            && self.balance_due() > Decimal::ZERO
    }

    /// Open and past its due date.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_open() && self.due_date < today
    }

    /// Days past due as of `today`; negative when not yet due.
    #[must_use]
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days()
    }
}

/// Input for recording an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    /// Unique invoice number.
    pub invoice_number: String,
    /// Customer display name.
    pub customer_name: String,
    /// Issue date.
    pub invoice_date: NaiveDate,
    /// Payment due date.
    pub due_date: NaiveDate,
    /// Invoice total.
    pub total_amount: Decimal,
}

/// A payment received from a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID.
    pub id: PaymentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Invoice settled by this payment, if any.
    pub invoice_id: Option<InvoiceId>,
    /// Date the money was received.
    pub payment_date: NaiveDate,
    /// Amount received.
    pub amount: Decimal,
    /// Free-form method (e.g. "BANK_TRANSFER").
    pub method: String,
}

/// Input for recording a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    /// Invoice to apply the payment to.
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
    /// Date received.
    pub payment_date: NaiveDate,
    /// Amount received.
    pub amount: Decimal,
    /// Payment method.
    #[serde(default = "default_payment_method")]
    pub method: String,
}

fn default_payment_method() -> String {
    "BANK_TRANSFER".to_string()
}

/// Vendor bill lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    /// Entered, not yet approved.
    Draft,
    /// Approved for payment.
    Approved,
    /// Some payments made.
    PartiallyPaid,
    /// Fully settled.
    Paid,
    /// Withdrawn.
    Cancelled,
}

/// A vendor bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    /// Bill ID.
    pub id: BillId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Vendor's bill number.
    pub bill_number: String,
    /// Vendor display name.
    pub vendor_name: String,
    /// Bill date.
    pub bill_date: NaiveDate,
    /// Payment due date.
    pub due_date: NaiveDate,
    /// Bill total.
    pub total_amount: Decimal,
    /// Amount already paid.
    pub paid_amount: Decimal,
    /// Lifecycle status.
    pub status: BillStatus,
}

impl Bill {
    /// Amount still owed to the vendor.
    #[must_use]
    pub fn balance_due(&self) -> Decimal {
        self.total_amount - self.paid_amount
    }

    /// Approved or partially paid with money still owed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.status, BillStatus::Approved | BillStatus::PartiallyPaid)
            && self.balance_due() > Decimal::ZERO
    }
}

/// Input for recording a bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBill {
    /// Vendor's bill number.
    pub bill_number: String,
    /// Vendor display name.
    pub vendor_name: String,
    /// Bill date.
    pub bill_date: NaiveDate,
    /// Payment due date.
    pub due_date: NaiveDate,
    /// Bill total.
    pub total_amount: Decimal,
}

/// Expense claim lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseStatus {
    /// Being prepared.
    Draft,
    /// Awaiting approval.
    Submitted,
    /// Approved for payment.
    Approved,
    /// Refused.
    Rejected,
    /// Reimbursed or paid out.
    Paid,
}

impl ExpenseStatus {
    /// Returns true if the status may move to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Submitted)
                | (Self::Submitted, Self::Approved | Self::Rejected)
                | (Self::Approved, Self::Paid)
        )
    }
}

/// An expense claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense ID.
    pub id: ExpenseId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Unique expense number.
    pub expense_number: String,
    /// Date incurred.
    pub expense_date: NaiveDate,
    /// Amount, never negative.
    pub amount: Decimal,
    /// Description.
    pub description: String,
    /// Expense account it is charged to, if known.
    pub account_id: Option<AccountId>,
    /// Lifecycle status.
    pub status: ExpenseStatus,
    /// Date it was paid.
    pub paid_date: Option<NaiveDate>,
}

impl Expense {
    /// Date the cash left the business, for paid expenses.
    #[must_use]
    pub fn cash_date(&self) -> Option<NaiveDate> {
        (self.status == ExpenseStatus::Paid).then(|| self.paid_date.unwrap_or(self.expense_date))
    }
}

/// Input for recording an expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    /// Unique expense number.
    pub expense_number: String,
    /// Date incurred.
    pub expense_date: NaiveDate,
    /// Amount.
    pub amount: Decimal,
    /// Description.
    pub description: String,
    /// Expense account.
    #[serde(default)]
    pub account_id: Option<AccountId>,
}
