//! Defines the JSON endpoints for creating, listing, updating and deleting expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    database_id::ExpenseId,
    date_range::DateRangeQuery,
    db::lock_connection,
    expense::{
        Expense, ExpenseUpdate, create_expense, delete_expense, get_expenses, update_expense,
    },
    owner::OwnerId,
};

/// The state needed to manage expenses.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating an expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpenseForm {
    /// What the money was spent on.
    pub category: String,
    /// How much was spent.
    pub amount: Decimal,
    /// When the money was spent.
    pub date: Date,
    /// Optional free text about the expense.
    #[serde(default)]
    pub description: Option<String>,
}

/// A route handler for creating a new expense, responds with the created expense.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Path(owner_id): Path<OwnerId>,
    Json(form): Json<CreateExpenseForm>,
) -> Result<(StatusCode, Json<Expense>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let expense = create_expense(
        Expense::build(owner_id, &form.category, form.amount, form.date)
            .description(form.description),
        &connection,
    )?;

    tracing::debug!("Created expense {} for owner {owner_id}", expense.id);

    Ok((StatusCode::CREATED, Json(expense)))
}

/// A route handler for listing an owner's expenses, optionally within a date range.
pub async fn list_expenses_endpoint(
    State(state): State<ExpenseState>,
    Path(owner_id): Path<OwnerId>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<Expense>>, Error> {
    let date_range = query.into_range()?;
    let connection = lock_connection(&state.db_connection)?;

    get_expenses(owner_id, date_range, &connection).map(Json)
}

/// A route handler for replacing the editable fields of an expense.
pub async fn update_expense_endpoint(
    State(state): State<ExpenseState>,
    Path((owner_id, expense_id)): Path<(OwnerId, ExpenseId)>,
    Json(update): Json<ExpenseUpdate>,
) -> Result<Json<Expense>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_expense(owner_id, expense_id, update, &connection).map(Json)
}

/// A route handler for deleting an expense.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Path((owner_id, expense_id)): Path<(OwnerId, ExpenseId)>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_expense(owner_id, expense_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
