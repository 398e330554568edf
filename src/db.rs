//! Creates the database schema and guards access to the shared connection.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, budget::create_budget_table, expense::create_expense_table,
    income::create_income_table, recurring::create_recurring_transaction_table,
    savings_goal::create_savings_goal_table,
};

/// Create all of the database tables for the application.
///
/// Foreign keys are switched on for `connection` before the tables are
/// created in a single exclusive transaction.
///
/// # Errors
/// This function may return a [rusqlite::Error] if something went wrong creating the tables.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_recurring_transaction_table(&transaction)?;
    create_expense_table(&transaction)?;
    create_income_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_savings_goal_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the mutex was poisoned by a panicking thread.
pub fn lock_connection(connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}
