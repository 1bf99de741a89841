//! Receivable and payable source documents: invoices, customer payments,
//! vendor bills, and expenses.
//!
//! The statement engine reads these for the cash flow statement, receivables
//! aging, and cash forecast.

pub mod error;
pub mod service;
pub mod types;

pub use error::SubledgerError;
pub use types::{
    Bill, BillStatus, Expense, ExpenseStatus, Invoice, InvoiceStatus, NewBill, NewExpense,
    NewInvoice, NewPayment, Payment,
};
