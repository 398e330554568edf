//! Defines the core data models and database queries for expenses.

use std::ops::RangeInclusive;

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{ExpenseId, RecurringTransactionId},
    money::{get_decimal, require_name, require_non_negative},
    owner::OwnerId,
};

// ============================================================================
// MODELS
// ============================================================================

/// Money that was spent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The owner the expense belongs to.
    pub owner_id: OwnerId,
    /// What the money was spent on, e.g. "Food", "Housing".
    pub category: String,
    /// How much was spent. Never negative.
    pub amount: Decimal,
    /// When the money was spent.
    pub date: Date,
    /// Optional free text about the expense.
    pub description: Option<String>,
    /// The recurring transaction this expense was materialized from, if any.
    pub recurring_id: Option<RecurringTransactionId>,
}

impl Expense {
    /// Start building a new expense.
    ///
    /// Shortcut for [NewExpense] for discoverability.
    pub fn build(owner_id: OwnerId, category: &str, amount: Decimal, date: Date) -> NewExpense {
        NewExpense {
            owner_id,
            category: category.to_owned(),
            amount,
            date,
            description: None,
            recurring_id: None,
        }
    }
}

/// An expense that has not been written to the database yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// The owner the expense belongs to.
    pub owner_id: OwnerId,
    /// The spending category. Leading and trailing whitespace is trimmed.
    pub category: String,
    /// How much was spent. Must not be negative.
    pub amount: Decimal,
    /// When the money was spent.
    pub date: Date,
    /// Optional free text about the expense.
    pub description: Option<String>,
    /// Set when the expense is materialized from a recurring transaction.
    ///
    /// The database allows at most one expense per recurring transaction and
    /// date.
    pub recurring_id: Option<RecurringTransactionId>,
}

impl NewExpense {
    /// Set the description for the expense.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Link the expense to the recurring transaction it was materialized from.
    pub fn recurring_id(mut self, recurring_id: Option<RecurringTransactionId>) -> Self {
        self.recurring_id = recurring_id;
        self
    }
}

/// The fields of an expense that an owner may change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    pub category: String,
    pub amount: Decimal,
    pub date: Date,
    #[serde(default)]
    pub description: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const EXPENSE_COLUMNS: &str = "id, owner_id, category, amount, date, description, recurring_id";

/// Create a new expense in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidArgument] if the category is blank or the amount is negative,
/// - [Error::ConcurrencyConflict] if the recurring transaction already has an expense on that date,
/// - or [Error::PersistenceFailure] if there is some other SQL error.
pub fn create_expense(expense: NewExpense, connection: &Connection) -> Result<Expense, Error> {
    let category = require_name(&expense.category, "category")?;
    let amount = require_non_negative(expense.amount, "amount")?;

    connection
        .prepare(&format!(
            "INSERT INTO expense (owner_id, category, amount, date, description, recurring_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                expense.owner_id.as_i64(),
                category,
                amount.to_string(),
                expense.date,
                expense.description,
                expense.recurring_id,
            ),
            map_expense_row,
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

/// Retrieve one of `owner_id`'s expenses by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `owner_id`,
/// - or [Error::PersistenceFailure] if there is some other SQL error.
pub fn get_expense(
    owner_id: OwnerId,
    id: ExpenseId,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE id = :id AND owner_id = :owner_id"
        ))?
        .query_one(
            &[(":id", &id), (":owner_id", &owner_id.as_i64())],
            map_expense_row,
        )?;

    Ok(expense)
}

/// Retrieve all of `owner_id`'s expenses, oldest first.
///
/// If `date_range` is given, only expenses dated within it (inclusive) are returned.
///
/// # Errors
/// Returns an [Error::PersistenceFailure] if there is an SQL error.
pub fn get_expenses(
    owner_id: OwnerId,
    date_range: Option<RangeInclusive<Date>>,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let (start, end) = match date_range {
        Some(range) => (Some(*range.start()), Some(*range.end())),
        None => (None, None),
    };

    let mut statement = connection.prepare(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expense
         WHERE owner_id = ?1
           AND (?2 IS NULL OR date >= ?2)
           AND (?3 IS NULL OR date <= ?3)
         ORDER BY date ASC, id ASC"
    ))?;

    statement
        .query_map((owner_id.as_i64(), start, end), map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Replace the editable fields of one of `owner_id`'s expenses.
///
/// Moving an expense materialized from a recurring transaction to another
/// date detaches it from that recurring transaction. The entry no longer
/// satisfies its original due date, and the recurring transaction's schedule
/// is left as it is.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidArgument] if the category is blank or the amount is negative,
/// - [Error::NotFound] if `id` does not refer to an expense owned by `owner_id`,
/// - or [Error::PersistenceFailure] if there is some other SQL error.
pub fn update_expense(
    owner_id: OwnerId,
    id: ExpenseId,
    update: ExpenseUpdate,
    connection: &Connection,
) -> Result<Expense, Error> {
    let category = require_name(&update.category, "category")?;
    let amount = require_non_negative(update.amount, "amount")?;

    let expense = connection
        .prepare(&format!(
            "UPDATE expense
             SET category = ?1, amount = ?2, date = ?3, description = ?4,
                 recurring_id = CASE WHEN date = ?3 THEN recurring_id ELSE NULL END
             WHERE id = ?5 AND owner_id = ?6
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_one(
            (
                category,
                amount.to_string(),
                update.date,
                update.description,
                id,
                owner_id.as_i64(),
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// Delete one of `owner_id`'s expenses.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `owner_id`,
/// - or [Error::PersistenceFailure] if there is some other SQL error.
pub fn delete_expense(
    owner_id: OwnerId,
    id: ExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND owner_id = ?2",
        (id, owner_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                category TEXT NOT NULL,
                amount TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT,
                recurring_id INTEGER,
                FOREIGN KEY(recurring_id) REFERENCES recurring_transaction(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // A recurring transaction materializes at most one expense per due date.
    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_expense_recurring_date ON expense(recurring_id, date)
         WHERE recurring_id IS NOT NULL;",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_owner_date ON expense(owner_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an Expense.
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let owner_id = OwnerId::new(row.get(1)?);
    let category = row.get(2)?;
    let amount = get_decimal(row, 3)?;
    let date = row.get(4)?;
    let description = row.get(5)?;
    let recurring_id = row.get(6)?;

    Ok(Expense {
        id,
        owner_id,
        category,
        amount,
        date,
        description,
        recurring_id,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        expense::{
            Expense, ExpenseUpdate, create_expense, delete_expense, get_expense, get_expenses,
            update_expense,
        },
        owner::OwnerId,
        recurring::{Frequency, NewRecurringTransaction, create_recurring_transaction},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let owner = OwnerId::new(1);

        let expense = create_expense(
            Expense::build(owner, " Food ", dec!(12.30), date!(2024 - 03 - 05))
                .description(Some("Lunch".to_owned())),
            &conn,
        )
        .expect("Could not create expense");

        assert_eq!(expense.owner_id, owner);
        assert_eq!(expense.category, "Food");
        assert_eq!(expense.amount, dec!(12.30));
        assert_eq!(expense.description.as_deref(), Some("Lunch"));
        assert_eq!(expense.recurring_id, None);
    }

    #[test]
    fn create_fails_on_negative_amount() {
        let conn = get_test_connection();

        let result = create_expense(
            Expense::build(OwnerId::new(1), "Food", dec!(-1), date!(2024 - 03 - 05)),
            &conn,
        );

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn get_is_scoped_to_owner() {
        let conn = get_test_connection();
        let expense = create_expense(
            Expense::build(OwnerId::new(1), "Food", dec!(5), date!(2024 - 03 - 05)),
            &conn,
        )
        .unwrap();

        assert_eq!(get_expense(OwnerId::new(1), expense.id, &conn), Ok(expense.clone()));
        assert_eq!(
            get_expense(OwnerId::new(2), expense.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn list_filters_by_date_range() {
        let conn = get_test_connection();
        let owner = OwnerId::new(1);
        for date in [
            date!(2024 - 01 - 31),
            date!(2024 - 02 - 01),
            date!(2024 - 02 - 29),
            date!(2024 - 03 - 01),
        ] {
            create_expense(Expense::build(owner, "Food", dec!(1), date), &conn).unwrap();
        }
        create_expense(
            Expense::build(OwnerId::new(2), "Food", dec!(1), date!(2024 - 02 - 10)),
            &conn,
        )
        .unwrap();

        let february = get_expenses(
            owner,
            Some(date!(2024 - 02 - 01)..=date!(2024 - 02 - 29)),
            &conn,
        )
        .unwrap();
        let everything = get_expenses(owner, None, &conn).unwrap();

        let dates: Vec<_> = february.iter().map(|expense| expense.date).collect();
        assert_eq!(dates, vec![date!(2024 - 02 - 01), date!(2024 - 02 - 29)]);
        assert_eq!(everything.len(), 4);
    }

    #[test]
    fn update_replaces_fields() {
        let conn = get_test_connection();
        let owner = OwnerId::new(1);
        let expense =
            create_expense(Expense::build(owner, "Food", dec!(5), date!(2024 - 03 - 05)), &conn)
                .unwrap();

        let updated = update_expense(
            owner,
            expense.id,
            ExpenseUpdate {
                category: "Dining".to_owned(),
                amount: dec!(7.50),
                date: date!(2024 - 03 - 06),
                description: None,
            },
            &conn,
        )
        .unwrap();

        assert_eq!(updated.category, "Dining");
        assert_eq!(updated.amount, dec!(7.50));
        assert_eq!(updated.date, date!(2024 - 03 - 06));
    }

    fn create_materialized_expense(conn: &Connection, owner: OwnerId) -> Expense {
        let rent = create_recurring_transaction(
            owner,
            NewRecurringTransaction {
                title: "Rent".to_owned(),
                category: "Housing".to_owned(),
                amount: dec!(800),
                description: None,
                frequency: Frequency::Monthly,
                start_date: date!(2024 - 01 - 01),
                end_date: None,
                is_expense: true,
            },
            conn,
        )
        .unwrap();

        create_expense(
            Expense::build(owner, "Housing", dec!(800), date!(2024 - 01 - 01))
                .recurring_id(Some(rent.id)),
            conn,
        )
        .unwrap()
    }

    fn rent_update(date: time::Date) -> ExpenseUpdate {
        ExpenseUpdate {
            category: "Housing".to_owned(),
            amount: dec!(850),
            date,
            description: None,
        }
    }

    #[test]
    fn update_on_same_date_keeps_recurring_link() {
        let conn = get_test_connection();
        let owner = OwnerId::new(1);
        let expense = create_materialized_expense(&conn, owner);

        let updated =
            update_expense(owner, expense.id, rent_update(date!(2024 - 01 - 01)), &conn).unwrap();

        assert_eq!(updated.amount, dec!(850));
        assert_eq!(updated.recurring_id, expense.recurring_id);
    }

    #[test]
    fn moving_materialized_expense_detaches_it() {
        let conn = get_test_connection();
        let owner = OwnerId::new(1);
        let expense = create_materialized_expense(&conn, owner);

        let updated =
            update_expense(owner, expense.id, rent_update(date!(2024 - 02 - 01)), &conn).unwrap();

        assert_eq!(updated.date, date!(2024 - 02 - 01));
        assert_eq!(updated.recurring_id, None);
    }

    #[test]
    fn moving_onto_another_materialized_date_is_not_a_conflict() {
        let conn = get_test_connection();
        let owner = OwnerId::new(1);
        let january = create_materialized_expense(&conn, owner);
        create_expense(
            Expense::build(owner, "Housing", dec!(800), date!(2024 - 02 - 01))
                .recurring_id(january.recurring_id),
            &conn,
        )
        .unwrap();

        let moved = update_expense(owner, january.id, rent_update(date!(2024 - 02 - 01)), &conn);

        assert!(matches!(moved, Ok(Expense { recurring_id: None, .. })));
        assert_eq!(get_expenses(owner, None, &conn).unwrap().len(), 2);
    }

    #[test]
    fn update_missing_expense_is_not_found() {
        let conn = get_test_connection();

        let result = update_expense(
            OwnerId::new(1),
            42,
            ExpenseUpdate {
                category: "Dining".to_owned(),
                amount: dec!(7.50),
                date: date!(2024 - 03 - 06),
                description: None,
            },
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_removes_expense() {
        let conn = get_test_connection();
        let owner = OwnerId::new(1);
        let expense =
            create_expense(Expense::build(owner, "Food", dec!(5), date!(2024 - 03 - 05)), &conn)
                .unwrap();

        assert_eq!(delete_expense(OwnerId::new(2), expense.id, &conn), Err(Error::NotFound));
        assert_eq!(delete_expense(owner, expense.id, &conn), Ok(()));
        assert_eq!(get_expense(owner, expense.id, &conn), Err(Error::NotFound));
    }
}
