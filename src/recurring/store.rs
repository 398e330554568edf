//! The ledger operations the recurring transaction processor depends on.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::RecurringTransactionId,
    db::lock_connection,
    expense::{Expense, create_expense},
    income::{Income, create_income},
    owner::OwnerId,
    recurring::{
        RecurringTransaction, find_due_recurring, get_recurring_transaction,
        update_recurring_schedule,
    },
};

/// An expense or income created from a recurring transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEntry {
    /// Created from a recurring expense.
    Expense(Expense),
    /// Created from recurring income.
    Income(Income),
}

impl LedgerEntry {
    /// The date the entry was recorded on.
    pub fn date(&self) -> Date {
        match self {
            LedgerEntry::Expense(expense) => expense.date,
            LedgerEntry::Income(income) => income.date,
        }
    }
}

/// Handles reading due recurring transactions and materializing their occurrences.
pub trait LedgerStore {
    /// Retrieve `owner_id`'s active recurring transactions due on or before `as_of`.
    fn find_due_recurring(
        &self,
        owner_id: OwnerId,
        as_of: Date,
    ) -> Result<Vec<RecurringTransaction>, Error>;

    /// Retrieve one of `owner_id`'s recurring transactions.
    fn get_recurring(
        &self,
        owner_id: OwnerId,
        id: RecurringTransactionId,
    ) -> Result<RecurringTransaction, Error>;

    /// Create the entry for the occurrence of `recurring` due on `due_date`
    /// and advance its schedule to `next_due_date` as one atomic step.
    ///
    /// Returns the new entry and the updated recurring transaction.
    ///
    /// Implementers must return [Error::ConcurrencyConflict], and keep
    /// nothing, if the stored schedule no longer has `due_date` as its next
    /// due date.
    fn materialize(
        &self,
        recurring: &RecurringTransaction,
        due_date: Date,
        next_due_date: Option<Date>,
    ) -> Result<(LedgerEntry, RecurringTransaction), Error>;
}

/// Stores ledger entries and recurring schedules in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteLedgerStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteLedgerStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl LedgerStore for SQLiteLedgerStore {
    fn find_due_recurring(
        &self,
        owner_id: OwnerId,
        as_of: Date,
    ) -> Result<Vec<RecurringTransaction>, Error> {
        let connection = lock_connection(&self.connection)?;

        find_due_recurring(owner_id, as_of, &connection)
    }

    fn get_recurring(
        &self,
        owner_id: OwnerId,
        id: RecurringTransactionId,
    ) -> Result<RecurringTransaction, Error> {
        let connection = lock_connection(&self.connection)?;

        get_recurring_transaction(owner_id, id, &connection)
    }

    /// Insert the expense or income and update the schedule in one SQLite transaction.
    ///
    /// Any error rolls back the inserted entry.
    fn materialize(
        &self,
        recurring: &RecurringTransaction,
        due_date: Date,
        next_due_date: Option<Date>,
    ) -> Result<(LedgerEntry, RecurringTransaction), Error> {
        let mut connection = lock_connection(&self.connection)?;
        let transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let entry = if recurring.is_expense {
            let expense = Expense::build(
                recurring.owner_id,
                &recurring.category,
                recurring.amount,
                due_date,
            )
            .description(recurring.description.clone())
            .recurring_id(Some(recurring.id));

            LedgerEntry::Expense(create_expense(expense, &transaction)?)
        } else {
            let income = Income::build(
                recurring.owner_id,
                &recurring.title,
                recurring.amount,
                due_date,
            )
            .description(recurring.description.clone())
            .recurring_id(Some(recurring.id));

            LedgerEntry::Income(create_income(income, &transaction)?)
        };

        let updated = update_recurring_schedule(recurring, due_date, next_due_date, &transaction)?;

        transaction.commit()?;

        Ok((entry, updated))
    }
}
