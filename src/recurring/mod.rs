//! Recurring transactions and the processor that materializes them.
//!
//! A recurring transaction is a template for an expense or income that repeats
//! on a [Frequency]. Nothing happens on its own: each call to
//! [RecurringProcessor::process_due] turns every occurrence that has fallen due
//! into a concrete [crate::expense::Expense] or [crate::income::Income] and
//! moves the schedule on.

mod core;
mod endpoints;
mod processor;
mod schedule;
mod store;

pub use core::{
    NewRecurringTransaction, RecurringTransaction, create_recurring_transaction,
    create_recurring_transaction_table, deactivate_recurring_transaction, find_due_recurring,
    get_recurring_transaction, get_recurring_transactions, map_recurring_transaction_row,
    update_recurring_schedule,
};
pub use endpoints::{
    ProcessQuery, RecurringTransactionForm, create_recurring_endpoint,
    deactivate_recurring_endpoint, get_recurring_endpoint, list_recurring_endpoint,
    process_recurring_endpoint,
};
pub use processor::{OwnerLocks, RecurringProcessor};
pub use schedule::{Frequency, next_due_date};
pub use store::{LedgerEntry, LedgerStore, SQLiteLedgerStore};
