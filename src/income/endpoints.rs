//! Defines the JSON endpoints for recording and listing income.

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
    database_id::IncomeId,
    date_range::DateRangeQuery,
    db::lock_connection,
    income::{Income, create_income, delete_income, get_incomes},
    owner::OwnerId,
};

/// The state needed to manage income.
#[derive(Debug, Clone)]
pub struct IncomeState {
    /// The database connection for managing income.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for IncomeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for recording income.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIncomeForm {
    /// Where the money came from.
    pub source: String,
    /// How much was earned.
    pub amount: Decimal,
    /// When the money was received.
    pub date: Date,
    #[serde(default)]
    pub description: Option<String>,
}

/// A route handler for recording income, responds with the created record.
pub async fn create_income_endpoint(
    State(state): State<IncomeState>,
    Path(owner_id): Path<OwnerId>,
    Json(form): Json<CreateIncomeForm>,
) -> Result<(StatusCode, Json<Income>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let income = create_income(
        Income::build(owner_id, &form.source, form.amount, form.date)
            .description(form.description),
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(income)))
}

/// A route handler for listing an owner's income, optionally within a date range.
pub async fn list_incomes_endpoint(
    State(state): State<IncomeState>,
    Path(owner_id): Path<OwnerId>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<Income>>, Error> {
    let date_range = query.into_range()?;
    let connection = lock_connection(&state.db_connection)?;

    get_incomes(owner_id, date_range, &connection).map(Json)
}

/// A route handler for deleting an income record.
pub async fn delete_income_endpoint(
    State(state): State<IncomeState>,
    Path((owner_id, income_id)): Path<(OwnerId, IncomeId)>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_income(owner_id, income_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
