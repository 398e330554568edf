//! Defines the core data models and database queries for income.

use std::ops::RangeInclusive;

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{IncomeId, RecurringTransactionId},
    money::{get_decimal, require_name, require_non_negative},
    owner::OwnerId,
};

/// Money that was earned, e.g. wages or interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    /// The ID of the income.
    pub id: IncomeId,
    /// The owner the income belongs to.
    pub owner_id: OwnerId,
    /// Where the money came from, e.g. "Salary".
    pub source: String,
    /// How much was earned. Never negative.
    pub amount: Decimal,
    /// When the money was received.
    pub date: Date,
    /// Optional free text about the income.
    pub description: Option<String>,
    /// The recurring transaction this income was materialized from, if any.
    pub recurring_id: Option<RecurringTransactionId>,
}

impl Income {
    /// Start building a new income.
    pub fn build(owner_id: OwnerId, source: &str, amount: Decimal, date: Date) -> NewIncome {
        NewIncome {
            owner_id,
            source: source.to_owned(),
            amount,
            date,
            description: None,
            recurring_id: None,
        }
    }
}

/// An income that has not been written to the database yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIncome {
    pub owner_id: OwnerId,
    pub source: String,
    pub amount: Decimal,
    pub date: Date,
    pub description: Option<String>,
    /// At most one income may exist per recurring transaction and date.
    pub recurring_id: Option<RecurringTransactionId>,
}

impl NewIncome {
    /// Set the description for the income.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Link the income to the recurring transaction it was materialized from.
    pub fn recurring_id(mut self, recurring_id: Option<RecurringTransactionId>) -> Self {
        self.recurring_id = recurring_id;
        self
    }
}

const INCOME_COLUMNS: &str = "id, owner_id, source, amount, date, description, recurring_id";

/// Create a new income in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidArgument] if the source is blank or the amount is negative,
/// - [Error::ConcurrencyConflict] if the recurring transaction already has an income on that date,
/// - or [Error::PersistenceFailure] if there is some other SQL error.
pub fn create_income(income: NewIncome, connection: &Connection) -> Result<Income, Error> {
    let source = require_name(&income.source, "source")?;
    let amount = require_non_negative(income.amount, "amount")?;

    connection
        .prepare(&format!(
            "INSERT INTO income (owner_id, source, amount, date, description, recurring_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {INCOME_COLUMNS}"
        ))?
        .query_row(
            (
                income.owner_id.as_i64(),
                source,
                amount.to_string(),
                income.date,
                income.description,
                income.recurring_id,
            ),
            map_income_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::ConcurrencyConflict,
            error => error.into(),
        })
}

/// Retrieve all of `owner_id`'s income, oldest first, optionally limited to `date_range`.
///
/// # Errors
/// Returns an [Error::PersistenceFailure] if there is an SQL error.
pub fn get_incomes(
    owner_id: OwnerId,
    date_range: Option<RangeInclusive<Date>>,
    connection: &Connection,
) -> Result<Vec<Income>, Error> {
    let (start, end) = match date_range {
        Some(range) => (Some(*range.start()), Some(*range.end())),
        None => (None, None),
    };

    let mut statement = connection.prepare(&format!(
        "SELECT {INCOME_COLUMNS} FROM income
         WHERE owner_id = ?1
           AND (?2 IS NULL OR date >= ?2)
           AND (?3 IS NULL OR date <= ?3)
         ORDER BY date ASC, id ASC"
    ))?;

    statement
        .query_map((owner_id.as_i64(), start, end), map_income_row)?
        .map(|maybe_income| maybe_income.map_err(Error::from))
        .collect()
}

/// Delete one of `owner_id`'s income records.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an income owned by `owner_id`,
/// - or [Error::PersistenceFailure] if there is some other SQL error.
pub fn delete_income(owner_id: OwnerId, id: IncomeId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM income WHERE id = ?1 AND owner_id = ?2",
        (id, owner_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Create the income table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_income_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS income (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                source TEXT NOT NULL,
                amount TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT,
                recurring_id INTEGER,
                FOREIGN KEY(recurring_id) REFERENCES recurring_transaction(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_income_recurring_date ON income(recurring_id, date)
         WHERE recurring_id IS NOT NULL;",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_income_owner_date ON income(owner_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an Income.
pub fn map_income_row(row: &Row) -> Result<Income, rusqlite::Error> {
    Ok(Income {
        id: row.get(0)?,
        owner_id: OwnerId::new(row.get(1)?),
        source: row.get(2)?,
        amount: get_decimal(row, 3)?,
        date: row.get(4)?,
        description: row.get(5)?,
        recurring_id: row.get(6)?,
    })
}
