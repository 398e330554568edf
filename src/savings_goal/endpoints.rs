//! Defines the JSON endpoints for savings goals.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    database_id::SavingsGoalId,
    db::lock_connection,
    owner::OwnerId,
    report::{GoalProgress, goal_progress},
    savings_goal::{
        NewSavingsGoal, SavingsGoal, contribute_to_savings_goal, create_savings_goal,
        delete_savings_goal, get_savings_goal, get_savings_goals,
    },
};

/// The state needed to manage savings goals.
#[derive(Debug, Clone)]
pub struct SavingsGoalState {
    /// The database connection for managing savings goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SavingsGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for adding money to a savings goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionForm {
    /// The amount to add. Must be greater than zero.
    pub amount: Decimal,
}

/// A route handler for creating a savings goal, responds with the created goal.
pub async fn create_savings_goal_endpoint(
    State(state): State<SavingsGoalState>,
    Path(owner_id): Path<OwnerId>,
    Json(form): Json<NewSavingsGoal>,
) -> Result<(StatusCode, Json<SavingsGoal>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let goal = create_savings_goal(owner_id, form, &connection)?;

    Ok((StatusCode::CREATED, Json(goal)))
}

/// A route handler for listing an owner's savings goals.
pub async fn list_savings_goals_endpoint(
    State(state): State<SavingsGoalState>,
    Path(owner_id): Path<OwnerId>,
) -> Result<Json<Vec<SavingsGoal>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_savings_goals(owner_id, &connection).map(Json)
}

/// A route handler for adding money to a savings goal, responds with the updated goal.
pub async fn contribute_endpoint(
    State(state): State<SavingsGoalState>,
    Path((owner_id, goal_id)): Path<(OwnerId, SavingsGoalId)>,
    Json(form): Json<ContributionForm>,
) -> Result<Json<SavingsGoal>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    contribute_to_savings_goal(owner_id, goal_id, form.amount, &connection).map(Json)
}

/// A route handler for checking how close a savings goal is to its target.
pub async fn goal_progress_endpoint(
    State(state): State<SavingsGoalState>,
    Path((owner_id, goal_id)): Path<(OwnerId, SavingsGoalId)>,
) -> Result<Json<GoalProgress>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let goal = get_savings_goal(owner_id, goal_id, &connection)?;

    Ok(Json(goal_progress(&goal)))
}

/// A route handler for deleting a savings goal.
pub async fn delete_savings_goal_endpoint(
    State(state): State<SavingsGoalState>,
    Path((owner_id, goal_id)): Path<(OwnerId, SavingsGoalId)>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_savings_goal(owner_id, goal_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
