//! Defines the JSON endpoints for budgets and per-category budget status.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    budget::{Budget, create_budget, delete_budget, get_budgets, update_budget_limit},
    database_id::BudgetId,
    date_range::DateRangeQuery,
    db::lock_connection,
    expense::get_expenses,
    owner::OwnerId,
    report::{BudgetStatus, budget_statuses},
};

/// The state needed to manage budgets.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetForm {
    pub category: String,
    pub limit: Decimal,
}

/// The request body for changing a budget's limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetLimitForm {
    pub limit: Decimal,
}

/// A route handler for creating a budget, responds with the created budget.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Path(owner_id): Path<OwnerId>,
    Json(form): Json<BudgetForm>,
) -> Result<(StatusCode, Json<Budget>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let budget = create_budget(owner_id, &form.category, form.limit, &connection)?;

    Ok((StatusCode::CREATED, Json(budget)))
}

/// A route handler for listing an owner's budgets.
pub async fn list_budgets_endpoint(
    State(state): State<BudgetState>,
    Path(owner_id): Path<OwnerId>,
) -> Result<Json<Vec<Budget>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_budgets(owner_id, &connection).map(Json)
}

/// A route handler for changing a budget's limit.
pub async fn update_budget_endpoint(
    State(state): State<BudgetState>,
    Path((owner_id, budget_id)): Path<(OwnerId, BudgetId)>,
    Json(form): Json<BudgetLimitForm>,
) -> Result<Json<Budget>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_budget_limit(owner_id, budget_id, form.limit, &connection).map(Json)
}

/// A route handler for deleting a budget.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Path((owner_id, budget_id)): Path<(OwnerId, BudgetId)>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_budget(owner_id, budget_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// A route handler comparing each budget to the spending in its category,
/// optionally within a date range.
pub async fn budget_status_endpoint(
    State(state): State<BudgetState>,
    Path(owner_id): Path<OwnerId>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<BudgetStatus>>, Error> {
    let date_range = query.into_range()?;
    let connection = lock_connection(&state.db_connection)?;

    let budgets = get_budgets(owner_id, &connection)?;
    let expenses = get_expenses(owner_id, date_range, &connection)?;

    budget_statuses(&expenses, &budgets).map(Json)
}
