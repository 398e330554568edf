//! Defines the recurring transaction model and its database queries.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::RecurringTransactionId,
    money::{get_decimal, require_name, require_positive},
    owner::OwnerId,
    recurring::Frequency,
};

// ============================================================================
// MODELS
// ============================================================================

/// A template for an expense or income that repeats on a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    /// The ID of the recurring transaction.
    pub id: RecurringTransactionId,
    /// The owner the recurring transaction belongs to.
    pub owner_id: OwnerId,
    /// A short name, e.g. "Rent". Used as the income source for income.
    pub title: String,
    /// The expense category for materialized expenses.
    pub category: String,
    /// The amount of each occurrence. Always greater than zero.
    pub amount: Decimal,
    pub description: Option<String>,
    pub frequency: Frequency,
    /// The date of the first occurrence.
    pub start_date: Date,
    /// No occurrence is materialized after this date.
    pub end_date: Option<Date>,
    /// The due date of the most recently materialized occurrence.
    pub last_processed_date: Option<Date>,
    /// The due date of the next occurrence to materialize.
    pub next_due_date: Date,
    /// Whether occurrences become expenses (`true`) or income (`false`).
    pub is_expense: bool,
    /// Inactive recurring transactions are never processed.
    pub is_active: bool,
}

/// A recurring transaction that has not been written to the database yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringTransaction {
    pub title: String,
    pub category: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub is_expense: bool,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const RECURRING_COLUMNS: &str = "id, owner_id, title, category, amount, description, frequency, \
    start_date, end_date, last_processed_date, next_due_date, is_expense, is_active";

/// Create a new recurring transaction whose first occurrence is due on its start date.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidArgument] if the title or category is blank, the amount is
///   not greater than zero, or the end date is before the start date,
/// - or [Error::PersistenceFailure] if there is some other SQL error.
pub fn create_recurring_transaction(
    owner_id: OwnerId,
    recurring: NewRecurringTransaction,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    let title = require_name(&recurring.title, "title")?;
    let category = require_name(&recurring.category, "category")?;
    let amount = require_positive(recurring.amount, "amount")?;

    if let Some(end_date) = recurring.end_date
        && end_date < recurring.start_date
    {
        return Err(Error::InvalidArgument(format!(
            "end date {end_date} is before the start date {}",
            recurring.start_date
        )));
    }

    let recurring = connection
        .prepare(&format!(
            "INSERT INTO recurring_transaction
                (owner_id, title, category, amount, description, frequency, start_date, end_date,
                 last_processed_date, next_due_date, is_expense, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?7, ?9, 1)
             RETURNING {RECURRING_COLUMNS}"
        ))?
        .query_row(
            (
                owner_id.as_i64(),
                title,
                category,
                amount.to_string(),
                recurring.description,
                recurring.frequency.as_str(),
                recurring.start_date,
                recurring.end_date,
                recurring.is_expense,
            ),
            map_recurring_transaction_row,
        )?;

    Ok(recurring)
}

/// Retrieve one of `owner_id`'s recurring transactions.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a recurring transaction
/// owned by `owner_id`, or [Error::PersistenceFailure] on other SQL errors.
pub fn get_recurring_transaction(
    owner_id: OwnerId,
    id: RecurringTransactionId,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    let recurring = connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction WHERE id = ?1 AND owner_id = ?2"
        ))?
        .query_one((id, owner_id.as_i64()), map_recurring_transaction_row)?;

    Ok(recurring)
}

/// Retrieve all of `owner_id`'s recurring transactions, active or not.
///
/// # Errors
/// Returns an [Error::PersistenceFailure] if there is an SQL error.
pub fn get_recurring_transactions(
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    let mut statement = connection.prepare(&format!(
        "SELECT {RECURRING_COLUMNS} FROM recurring_transaction WHERE owner_id = ?1 ORDER BY id ASC"
    ))?;

    statement
        .query_map((owner_id.as_i64(),), map_recurring_transaction_row)?
        .map(|maybe_recurring| maybe_recurring.map_err(Error::from))
        .collect()
}

/// Retrieve `owner_id`'s active recurring transactions with an occurrence due on or before `as_of`.
///
/// A recurring transaction whose next due date is past its end date is never due.
/// The results are ordered by next due date, then ID.
///
/// # Errors
/// Returns an [Error::PersistenceFailure] if there is an SQL error.
pub fn find_due_recurring(
    owner_id: OwnerId,
    as_of: Date,
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    let mut statement = connection.prepare(&format!(
        "SELECT {RECURRING_COLUMNS} FROM recurring_transaction
         WHERE owner_id = ?1
           AND is_active = 1
           AND next_due_date <= ?2
           AND (end_date IS NULL OR next_due_date <= end_date)
         ORDER BY next_due_date ASC, id ASC"
    ))?;

    statement
        .query_map((owner_id.as_i64(), as_of), map_recurring_transaction_row)?
        .map(|maybe_recurring| maybe_recurring.map_err(Error::from))
        .collect()
}

/// Record that the occurrence due on `due_date` was materialized and move the
/// schedule on to `next_due_date`.
///
/// The update only applies while the stored next due date still equals
/// `due_date`. A `next_due_date` of `None` means the schedule has run off the
/// end of the calendar, so the recurring transaction is deactivated instead.
///
/// # Errors
/// This function will return a:
/// - [Error::ConcurrencyConflict] if the stored next due date no longer equals `due_date`,
/// - or [Error::PersistenceFailure] if there is some other SQL error.
pub fn update_recurring_schedule(
    recurring: &RecurringTransaction,
    due_date: Date,
    next_due_date: Option<Date>,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    connection
        .prepare(&format!(
            "UPDATE recurring_transaction
             SET last_processed_date = ?1,
                 next_due_date = COALESCE(?2, next_due_date),
                 is_active = CASE WHEN ?2 IS NULL THEN 0 ELSE is_active END
             WHERE id = ?3 AND owner_id = ?4 AND next_due_date = ?1
             RETURNING {RECURRING_COLUMNS}"
        ))?
        .query_one(
            (
                due_date,
                next_due_date,
                recurring.id,
                recurring.owner_id.as_i64(),
            ),
            map_recurring_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::ConcurrencyConflict,
            error => error.into(),
        })
}

/// Stop one of `owner_id`'s recurring transactions from being processed.
///
/// Entries that were already materialized are kept.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a recurring transaction
/// owned by `owner_id`, or [Error::PersistenceFailure] on other SQL errors.
pub fn deactivate_recurring_transaction(
    owner_id: OwnerId,
    id: RecurringTransactionId,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    let recurring = connection
        .prepare(&format!(
            "UPDATE recurring_transaction SET is_active = 0 WHERE id = ?1 AND owner_id = ?2
             RETURNING {RECURRING_COLUMNS}"
        ))?
        .query_one((id, owner_id.as_i64()), map_recurring_transaction_row)?;

    Ok(recurring)
}

/// Create the recurring transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_recurring_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_transaction (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                category TEXT NOT NULL,
                amount TEXT NOT NULL,
                description TEXT,
                frequency TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                last_processed_date TEXT,
                next_due_date TEXT NOT NULL,
                is_expense INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_recurring_owner_due
         ON recurring_transaction(owner_id, is_active, next_due_date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a RecurringTransaction.
pub fn map_recurring_transaction_row(row: &Row) -> Result<RecurringTransaction, rusqlite::Error> {
    let frequency: String = row.get(6)?;

    Ok(RecurringTransaction {
        id: row.get(0)?,
        owner_id: OwnerId::new(row.get(1)?),
        title: row.get(2)?,
        category: row.get(3)?,
        amount: get_decimal(row, 4)?,
        description: row.get(5)?,
        frequency: Frequency::parse_or_monthly(&frequency),
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        last_processed_date: row.get(9)?,
        next_due_date: row.get(10)?,
        is_expense: row.get(11)?,
        is_active: row.get(12)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
