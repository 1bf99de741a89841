//! Operations on receivable and payable documents.
//!
//! Documents share the ledger's lock and version counter so a report
//! snapshot sees invoices, payments and journal entries from the same moment.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{BillId, ExpenseId, InvoiceId, PaymentId};
use tracing::debug;

use super::error::SubledgerError;
use super::types::{
    Bill, BillStatus, Expense, ExpenseStatus, Invoice, InvoiceStatus, NewBill, NewExpense,
    NewInvoice, NewPayment, Payment,
};
use crate::ledger::LedgerError;
use crate::ledger::store::LedgerStore;
use crate::ledger::validation::usable_account;

fn require_positive(amount: Decimal) -> Result<(), SubledgerError> {
    if amount <= Decimal::ZERO {
        return Err(SubledgerError::NonPositiveAmount(amount));
    }
    Ok(())
}

fn require_due_after_issue(issued: NaiveDate, due: NaiveDate) -> Result<(), SubledgerError> {
    if due < issued {
        return Err(SubledgerError::DueBeforeIssue);
    }
    Ok(())
}

impl LedgerStore {
    // ========== Receivables ==========

    /// Records a DRAFT invoice.
    ///
    /// # Errors
    ///
    /// `NonPositiveAmount`, `DueBeforeIssue`, or `DuplicateNumber`.
    pub fn record_invoice(&self, input: NewInvoice) -> Result<Invoice, SubledgerError> {
        require_positive(input.total_amount)?;
        require_due_after_issue(input.invoice_date, input.due_date)?;

        let mut guard = self.write();
        if guard
            .invoices
            .values()
            .any(|invoice| invoice.invoice_number == input.invoice_number)
        {
            return Err(SubledgerError::DuplicateNumber(input.invoice_number));
        }

        let invoice = Invoice {
            id: InvoiceId::new(),
            tenant_id: self.tenant_id(),
            invoice_number: input.invoice_number,
            customer_name: input.customer_name,
            invoice_date: input.invoice_date,
            due_date: input.due_date,
            total_amount: input.total_amount,
            paid_amount: Decimal::ZERO,
            status: InvoiceStatus::Draft,
        };
        Self::publish(&mut guard, |state| {
            state.invoices.insert(invoice.id, invoice.clone());
        });
        Ok(invoice)
    }

    /// Marks a DRAFT invoice as sent; it now counts as a receivable.
    ///
    /// # Errors
    ///
    /// `InvoiceNotFound` or `InvoiceTransition`.
    pub fn send_invoice(&self, invoice_id: InvoiceId) -> Result<Invoice, SubledgerError> {
        self.transition_invoice(invoice_id, InvoiceStatus::Sent, |status| {
            status == InvoiceStatus::Draft
        })
    }

    /// Cancels an invoice that has not received any payment.
    ///
    /// # Errors
    ///
    /// `InvoiceNotFound` or `InvoiceTransition`.
    pub fn cancel_invoice(&self, invoice_id: InvoiceId) -> Result<Invoice, SubledgerError> {
        self.transition_invoice(invoice_id, InvoiceStatus::Cancelled, |status| {
            matches!(status, InvoiceStatus::Draft | InvoiceStatus::Sent)
        })
    }

    fn transition_invoice(
        &self,
        invoice_id: InvoiceId,
        to: InvoiceStatus,
        allowed: impl Fn(InvoiceStatus) -> bool,
    ) -> Result<Invoice, SubledgerError> {
        let mut guard = self.write();
        let mut invoice = guard
            .invoices
            .get(&invoice_id)
            .cloned()
            .ok_or(SubledgerError::InvoiceNotFound(invoice_id))?;

        if !allowed(invoice.status) {
            return Err(SubledgerError::InvoiceTransition {
                from: invoice.status,
                to,
            });
        }
        invoice.status = to;

        Self::publish(&mut guard, |state| {
            state.invoices.insert(invoice_id, invoice.clone());
        });
        Ok(invoice)
    }

    /// Records a customer payment and applies it to its invoice.
    ///
    /// The invoice's `paid_amount` is recomputed as the sum of all of its
    /// payments; it becomes PAID once nothing is left due.
    ///
    /// # Errors
    ///
    /// `NonPositiveAmount`, `InvoiceNotFound`, `InvoiceTransition` for an
    /// invoice that was never sent or is closed, or `Overpayment`.
    pub fn record_payment(&self, input: NewPayment) -> Result<Payment, SubledgerError> {
        require_positive(input.amount)?;

        let mut guard = self.write();
        let payment = Payment {
            id: PaymentId::new(),
            tenant_id: self.tenant_id(),
            invoice_id: input.invoice_id,
            payment_date: input.payment_date,
            amount: input.amount,
            method: input.method,
        };

        let updated_invoice = match input.invoice_id {
            None => None,
            Some(invoice_id) => {
                let mut invoice = guard
                    .invoices
                    .get(&invoice_id)
                    .cloned()
                    .ok_or(SubledgerError::InvoiceNotFound(invoice_id))?;

                if !matches!(invoice.status, InvoiceStatus::Sent | InvoiceStatus::PartiallyPaid) {
                    return Err(SubledgerError::InvoiceTransition {
                        from: invoice.status,
                        to: InvoiceStatus::Paid,
                    });
                }
                if payment.amount > invoice.balance_due() {
                    return Err(SubledgerError::Overpayment {
                        balance_due: invoice.balance_due(),
                        amount: payment.amount,
                    });
                }

                let previously_paid: Decimal = guard
                    .payments
                    .values()
                    .filter(|p| p.invoice_id == Some(invoice_id))
                    .map(|p| p.amount)
                    .sum();
                invoice.paid_amount = previously_paid + payment.amount;
                invoice.status = if invoice.paid_amount >= invoice.total_amount {
                    InvoiceStatus::Paid
                } else {
                    InvoiceStatus::PartiallyPaid
                };
                Some(invoice)
            }
        };

        Self::publish(&mut guard, |state| {
            state.payments.insert(payment.id, payment.clone());
            if let Some(invoice) = updated_invoice {
                state.invoices.insert(invoice.id, invoice);
            }
        });

        debug!(tenant_id = %self.tenant_id(), amount = %payment.amount, "payment recorded");
        Ok(payment)
    }

    // ========== Payables ==========

    /// Records a DRAFT vendor bill.
    ///
    /// # Errors
    ///
    /// `NonPositiveAmount`, `DueBeforeIssue`, or `DuplicateNumber`.
    pub fn record_bill(&self, input: NewBill) -> Result<Bill, SubledgerError> {
        require_positive(input.total_amount)?;
        require_due_after_issue(input.bill_date, input.due_date)?;

        let mut guard = self.write();
        if guard
            .bills
            .values()
            .any(|bill| bill.bill_number == input.bill_number && bill.vendor_name == input.vendor_name)
        {
            return Err(SubledgerError::DuplicateNumber(input.bill_number));
        }

        let bill = Bill {
            id: BillId::new(),
            tenant_id: self.tenant_id(),
            bill_number: input.bill_number,
            vendor_name: input.vendor_name,
            bill_date: input.bill_date,
            due_date: input.due_date,
            total_amount: input.total_amount,
            paid_amount: Decimal::ZERO,
            status: BillStatus::Draft,
        };
        Self::publish(&mut guard, |state| {
            state.bills.insert(bill.id, bill.clone());
        });
        Ok(bill)
    }

    /// Approves a DRAFT bill for payment.
    ///
    /// # Errors
    ///
    /// `BillNotFound` or `BillTransition`.
    pub fn approve_bill(&self, bill_id: BillId) -> Result<Bill, SubledgerError> {
        let mut guard = self.write();
        let mut bill = guard
            .bills
            .get(&bill_id)
            .cloned()
            .ok_or(SubledgerError::BillNotFound(bill_id))?;

        if bill.status != BillStatus::Draft {
            return Err(SubledgerError::BillTransition {
                from: bill.status,
                to: BillStatus::Approved,
            });
        }
        bill.status = BillStatus::Approved;

        Self::publish(&mut guard, |state| {
            state.bills.insert(bill_id, bill.clone());
        });
        Ok(bill)
    }

    /// Pays part or all of an approved bill.
    ///
    /// # Errors
    ///
    /// `NonPositiveAmount`, `BillNotFound`, `BillTransition`, or `Overpayment`.
    pub fn pay_bill(&self, bill_id: BillId, amount: Decimal) -> Result<Bill, SubledgerError> {
        require_positive(amount)?;

        let mut guard = self.write();
        let mut bill = guard
            .bills
            .get(&bill_id)
            .cloned()
            .ok_or(SubledgerError::BillNotFound(bill_id))?;

        if !matches!(bill.status, BillStatus::Approved | BillStatus::PartiallyPaid) {
            return Err(SubledgerError::BillTransition {
                from: bill.status,
                to: BillStatus::Paid,
            });
        }
        if amount > bill.balance_due() {
            return Err(SubledgerError::Overpayment {
                balance_due: bill.balance_due(),
                amount,
            });
        }

        bill.paid_amount += amount;
        bill.status = if bill.balance_due().is_zero() {
            BillStatus::Paid
        } else {
            BillStatus::PartiallyPaid
        };

        Self::publish(&mut guard, |state| {
            state.bills.insert(bill_id, bill.clone());
        });
        Ok(bill)
    }

    // ========== Expenses ==========

    /// Records a DRAFT expense.
    ///
    /// # Errors
    ///
    /// `NegativeAmount`, `UnknownAccount`, `InactiveAccount`, or `DuplicateNumber`.
    pub fn record_expense(&self, input: NewExpense) -> Result<Expense, SubledgerError> {
        if input.amount < Decimal::ZERO {
            return Err(SubledgerError::NegativeAmount(input.amount));
        }

        let mut guard = self.write();
        if let Some(account_id) = input.account_id {
            usable_account(&guard, account_id).map_err(|err| match err {
                LedgerError::InactiveAccount(id) => SubledgerError::InactiveAccount(id),
                _ => SubledgerError::UnknownAccount(account_id),
            })?;
        }
        if guard
            .expenses
            .values()
            .any(|expense| expense.expense_number == input.expense_number)
        {
            return Err(SubledgerError::DuplicateNumber(input.expense_number));
        }

        let expense = Expense {
            id: ExpenseId::new(),
            tenant_id: self.tenant_id(),
            expense_number: input.expense_number,
            expense_date: input.expense_date,
            amount: input.amount,
            description: input.description,
            account_id: input.account_id,
            status: ExpenseStatus::Draft,
            paid_date: None,
        };
        Self::publish(&mut guard, |state| {
            state.expenses.insert(expense.id, expense.clone());
        });
        Ok(expense)
    }

    /// Moves an expense along its approval workflow.
    ///
    /// `on` is stamped as the paid date when the expense becomes PAID.
    ///
    /// # Errors
    ///
    /// `ExpenseNotFound` or `ExpenseTransition`.
    pub fn advance_expense(
        &self,
        expense_id: ExpenseId,
        next: ExpenseStatus,
        on: NaiveDate,
    ) -> Result<Expense, SubledgerError> {
        let mut guard = self.write();
        let mut expense = guard
            .expenses
            .get(&expense_id)
            .cloned()
            .ok_or(SubledgerError::ExpenseNotFound(expense_id))?;

        if !expense.status.can_transition_to(next) {
            return Err(SubledgerError::ExpenseTransition {
                from: expense.status,
                to: next,
            });
        }
        expense.status = next;
        if next == ExpenseStatus::Paid {
            expense.paid_date = Some(on);
        }

        Self::publish(&mut guard, |state| {
            state.expenses.insert(expense_id, expense.clone());
        });
        Ok(expense)
    }
}
