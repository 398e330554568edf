//! Defines the savings goal model and its database queries.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::SavingsGoalId,
    money::{checked_add, get_decimal, require_name, require_non_negative, require_positive},
    owner::OwnerId,
};

/// An amount of money an owner wants to set aside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: SavingsGoalId,
    pub owner_id: OwnerId,
    /// A short label for the goal, e.g. "Holiday".
    pub name: String,
    /// How much the owner wants to save. Never negative.
    pub target_amount: Decimal,
    /// How much has been saved so far. Never negative.
    pub current_amount: Decimal,
    /// When the owner would like to reach the goal.
    pub target_date: Option<Date>,
}

/// A savings goal that has not been written to the database yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSavingsGoal {
    pub name: String,
    pub target_amount: Decimal,
    #[serde(default)]
    pub current_amount: Decimal,
    #[serde(default)]
    pub target_date: Option<Date>,
}

const SAVINGS_GOAL_COLUMNS: &str =
    "id, owner_id, name, target_amount, current_amount, target_date";

/// Create a savings goal for `owner_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidArgument] if the name is blank or either amount is negative,
/// - or [Error::PersistenceFailure] if there is some other SQL error.
pub fn create_savings_goal(
    owner_id: OwnerId,
    goal: NewSavingsGoal,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    let name = require_name(&goal.name, "name")?;
    let target_amount = require_non_negative(goal.target_amount, "target_amount")?;
    let current_amount = require_non_negative(goal.current_amount, "current_amount")?;

    let goal = connection
        .prepare(&format!(
            "INSERT INTO savings_goal (owner_id, name, target_amount, current_amount, target_date)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {SAVINGS_GOAL_COLUMNS}"
        ))?
        .query_row(
            (
                owner_id.as_i64(),
                name,
                target_amount.to_string(),
                current_amount.to_string(),
                goal.target_date,
            ),
            map_savings_goal_row,
        )?;

    Ok(goal)
}

/// Retrieve one of `owner_id`'s savings goals.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a goal owned by
/// `owner_id`, or [Error::PersistenceFailure] on other SQL errors.
pub fn get_savings_goal(
    owner_id: OwnerId,
    id: SavingsGoalId,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    let goal = connection
        .prepare(&format!(
            "SELECT {SAVINGS_GOAL_COLUMNS} FROM savings_goal WHERE id = ?1 AND owner_id = ?2"
        ))?
        .query_one((id, owner_id.as_i64()), map_savings_goal_row)?;

    Ok(goal)
}

/// Retrieve all of `owner_id`'s savings goals in the order they were created.
///
/// # Errors
/// Returns an [Error::PersistenceFailure] if there is an SQL error.
pub fn get_savings_goals(
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<Vec<SavingsGoal>, Error> {
    let mut statement = connection.prepare(&format!(
        "SELECT {SAVINGS_GOAL_COLUMNS} FROM savings_goal WHERE owner_id = ?1 ORDER BY id ASC"
    ))?;

    statement
        .query_map((owner_id.as_i64(),), map_savings_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(Error::from))
        .collect()
}

/// Add `amount` to the current amount of one of `owner_id`'s savings goals.
///
/// The current amount is read, added to and written back.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidArgument] if `amount` is not greater than zero or the new
///   current amount would be more than [crate::money::MAX_AMOUNT],
/// - [Error::NotFound] if `id` does not refer to a goal owned by `owner_id`,
/// - or [Error::PersistenceFailure] if there is some other SQL error.
pub fn contribute_to_savings_goal(
    owner_id: OwnerId,
    id: SavingsGoalId,
    amount: Decimal,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    let amount = require_positive(amount, "amount")?;
    let goal = get_savings_goal(owner_id, id, connection)?;
    let current_amount =
        require_non_negative(checked_add(goal.current_amount, amount)?, "current_amount")?;

    let goal = connection
        .prepare(&format!(
            "UPDATE savings_goal SET current_amount = ?1 WHERE id = ?2 AND owner_id = ?3
             RETURNING {SAVINGS_GOAL_COLUMNS}"
        ))?
        .query_one(
            (current_amount.to_string(), id, owner_id.as_i64()),
            map_savings_goal_row,
        )?;

    Ok(goal)
}

/// Delete one of `owner_id`'s savings goals.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a goal owned by
/// `owner_id`, or [Error::PersistenceFailure] on other SQL errors.
pub fn delete_savings_goal(
    owner_id: OwnerId,
    id: SavingsGoalId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM savings_goal WHERE id = ?1 AND owner_id = ?2",
        (id, owner_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Create the savings goal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_savings_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            target_amount TEXT NOT NULL,
            current_amount TEXT NOT NULL,
            target_date TEXT
        )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a SavingsGoal.
pub fn map_savings_goal_row(row: &Row) -> Result<SavingsGoal, rusqlite::Error> {
    Ok(SavingsGoal {
        id: row.get(0)?,
        owner_id: OwnerId::new(row.get(1)?),
        name: row.get(2)?,
        target_amount: get_decimal(row, 3)?,
        current_amount: get_decimal(row, 4)?,
        target_date: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use super::{
        NewSavingsGoal, contribute_to_savings_goal, create_savings_goal,
        create_savings_goal_table, delete_savings_goal, get_savings_goal, get_savings_goals,
    };
    use crate::{Error, money::MAX_AMOUNT, owner::OwnerId};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_savings_goal_table(&conn).unwrap();
        conn
    }

    fn holiday() -> NewSavingsGoal {
        NewSavingsGoal {
            name: "Holiday".to_owned(),
            target_amount: dec!(1200),
            current_amount: dec!(0),
            target_date: Some(date!(2024 - 12 - 01)),
        }
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();

        let goal = create_savings_goal(OwnerId::new(1), holiday(), &conn).unwrap();

        assert_eq!(goal.name, "Holiday");
        assert_eq!(goal.target_amount, dec!(1200));
        assert_eq!(goal.target_date, Some(date!(2024 - 12 - 01)));
    }

    #[test]
    fn create_rejects_negative_target() {
        let conn = get_test_connection();
        let goal = NewSavingsGoal {
            target_amount: dec!(-1),
            ..holiday()
        };

        let result = create_savings_goal(OwnerId::new(1), goal, &conn);

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn contributions_accumulate() {
        let conn = get_test_connection();
        let owner = OwnerId::new(1);
        let goal = create_savings_goal(owner, holiday(), &conn).unwrap();

        contribute_to_savings_goal(owner, goal.id, dec!(100.50), &conn).unwrap();
        let goal = contribute_to_savings_goal(owner, goal.id, dec!(49.50), &conn).unwrap();

        assert_eq!(goal.current_amount, dec!(150));
        assert_eq!(get_savings_goal(owner, goal.id, &conn), Ok(goal));
    }

    #[test]
    fn contribution_must_be_positive() {
        let conn = get_test_connection();
        let owner = OwnerId::new(1);
        let goal = create_savings_goal(owner, holiday(), &conn).unwrap();

        let result = contribute_to_savings_goal(owner, goal.id, dec!(0), &conn);

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn goals_are_scoped_to_owner() {
        let conn = get_test_connection();
        let goal = create_savings_goal(OwnerId::new(1), holiday(), &conn).unwrap();

        assert_eq!(get_savings_goals(OwnerId::new(2), &conn), Ok(vec![]));
        assert_eq!(
            contribute_to_savings_goal(OwnerId::new(2), goal.id, dec!(1), &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_savings_goal(OwnerId::new(2), goal.id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(delete_savings_goal(OwnerId::new(1), goal.id, &conn), Ok(()));
    }

    #[test]
    fn contribution_past_the_maximum_is_rejected() {
        let conn = get_test_connection();
        let owner = OwnerId::new(1);
        let goal = create_savings_goal(
            owner,
            NewSavingsGoal {
                current_amount: MAX_AMOUNT,
                ..holiday()
            },
            &conn,
        )
        .unwrap();

        let result = contribute_to_savings_goal(owner, goal.id, dec!(1), &conn);

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(
            get_savings_goal(owner, goal.id, &conn).unwrap().current_amount,
            MAX_AMOUNT
        );
    }

    #[test]
    fn contribution_to_an_oversized_stored_goal_does_not_panic() {
        let conn = get_test_connection();
        conn.execute(
            "INSERT INTO savings_goal (owner_id, name, target_amount, current_amount)
             VALUES (1, 'Huge', '1', ?1)",
            (Decimal::MAX.to_string(),),
        )
        .unwrap();

        let result = contribute_to_savings_goal(OwnerId::new(1), 1, dec!(1), &conn);

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
