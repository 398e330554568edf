//! Defines the budget model and its database queries.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::BudgetId,
    money::{get_decimal, require_name, require_non_negative},
    owner::OwnerId,
};

/// A spending limit for one category.
///
/// An owner has at most one budget per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The owner the budget belongs to.
    pub owner_id: OwnerId,
    /// The spending category the limit applies to.
    pub category: String,
    /// The most that should be spent in the category. Never negative.
    pub limit: Decimal,
}

/// Create a budget for `category`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidArgument] if the category is blank or `limit` is negative,
/// - [Error::DuplicateBudget] if the owner already has a budget for the category,
/// - or [Error::PersistenceFailure] if there is some other SQL error.
pub fn create_budget(
    owner_id: OwnerId,
    category: &str,
    limit: Decimal,
    connection: &Connection,
) -> Result<Budget, Error> {
    let category = require_name(category, "category")?;
    let limit = require_non_negative(limit, "limit")?;

    connection
        .prepare(
            "INSERT INTO budget (owner_id, category, \"limit\") VALUES (?1, ?2, ?3)
             RETURNING id, owner_id, category, \"limit\"",
        )?
        .query_row(
            (owner_id.as_i64(), &category, limit.to_string()),
            map_budget_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateBudget(category.clone()),
            error => error.into(),
        })
}

/// Retrieve all of `owner_id`'s budgets ordered by category.
///
/// # Errors
/// Returns an [Error::PersistenceFailure] if there is an SQL error.
pub fn get_budgets(owner_id: OwnerId, connection: &Connection) -> Result<Vec<Budget>, Error> {
    let mut statement = connection.prepare(
        "SELECT id, owner_id, category, \"limit\" FROM budget
         WHERE owner_id = ?1 ORDER BY category ASC",
    )?;

    statement
        .query_map((owner_id.as_i64(),), map_budget_row)?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Change the limit of one of `owner_id`'s budgets.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidArgument] if `limit` is negative,
/// - [Error::NotFound] if `id` does not refer to a budget owned by `owner_id`,
/// - or [Error::PersistenceFailure] if there is some other SQL error.
pub fn update_budget_limit(
    owner_id: OwnerId,
    id: BudgetId,
    limit: Decimal,
    connection: &Connection,
) -> Result<Budget, Error> {
    let limit = require_non_negative(limit, "limit")?;

    let budget = connection
        .prepare(
            "UPDATE budget SET \"limit\" = ?1 WHERE id = ?2 AND owner_id = ?3
             RETURNING id, owner_id, category, \"limit\"",
        )?
        .query_one((limit.to_string(), id, owner_id.as_i64()), map_budget_row)?;

    Ok(budget)
}

/// Delete one of `owner_id`'s budgets.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a budget owned by
/// `owner_id`, or [Error::PersistenceFailure] on other SQL errors.
pub fn delete_budget(owner_id: OwnerId, id: BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND owner_id = ?2",
        (id, owner_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL,
            category TEXT NOT NULL,
            \"limit\" TEXT NOT NULL,
            UNIQUE(owner_id, category)
        )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Budget.
pub fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        owner_id: OwnerId::new(row.get(1)?),
        category: row.get(2)?,
        limit: get_decimal(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;

    use super::{create_budget, create_budget_table, delete_budget, get_budgets, update_budget_limit};
    use crate::{Error, owner::OwnerId};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_budget_table(&conn).unwrap();
        conn
    }

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_budget_table(&connection));
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();

        let budget = create_budget(OwnerId::new(1), "Food", dec!(500), &conn).unwrap();

        assert_eq!(budget.category, "Food");
        assert_eq!(budget.limit, dec!(500));
    }

    #[test]
    fn create_rejects_negative_limit() {
        let conn = get_test_connection();

        let result = create_budget(OwnerId::new(1), "Food", dec!(-5), &conn);

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn one_budget_per_owner_and_category() {
        let conn = get_test_connection();
        create_budget(OwnerId::new(1), "Food", dec!(500), &conn).unwrap();

        let duplicate = create_budget(OwnerId::new(1), "Food", dec!(100), &conn);
        let other_owner = create_budget(OwnerId::new(2), "Food", dec!(100), &conn);

        assert_eq!(duplicate, Err(Error::DuplicateBudget("Food".to_owned())));
        assert!(other_owner.is_ok());
    }

    #[test]
    fn list_is_ordered_by_category() {
        let conn = get_test_connection();
        let owner = OwnerId::new(1);
        create_budget(owner, "Transport", dec!(100), &conn).unwrap();
        create_budget(owner, "Food", dec!(500), &conn).unwrap();

        let categories: Vec<_> = get_budgets(owner, &conn)
            .unwrap()
            .into_iter()
            .map(|budget| budget.category)
            .collect();

        assert_eq!(categories, vec!["Food", "Transport"]);
    }

    #[test]
    fn update_and_delete() {
        let conn = get_test_connection();
        let owner = OwnerId::new(1);
        let budget = create_budget(owner, "Food", dec!(500), &conn).unwrap();

        let updated = update_budget_limit(owner, budget.id, dec!(650), &conn).unwrap();
        assert_eq!(updated.limit, dec!(650));

        assert_eq!(
            update_budget_limit(OwnerId::new(9), budget.id, dec!(1), &conn),
            Err(Error::NotFound)
        );
        assert_eq!(delete_budget(owner, budget.id, &conn), Ok(()));
        assert_eq!(delete_budget(owner, budget.id, &conn), Err(Error::NotFound));
    }
}
