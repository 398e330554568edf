//! Defines the endpoint for the financial report.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    budget::get_budgets,
    date_range::DateRangeQuery,
    db::lock_connection,
    expense::get_expenses,
    income::get_incomes,
    money::checked_sum,
    owner::OwnerId,
    report::{Report, report, total_income},
    savings_goal::get_savings_goals,
};

/// The state needed to build reports.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for a report.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ReportQuery {
    pub from: Option<Date>,
    pub to: Option<Date>,
    /// The spending limit. Defaults to the sum of the owner's budgets.
    pub limit: Option<Decimal>,
    /// The savings goal. Defaults to what is left to save across the owner's
    /// savings goals.
    pub goal: Option<Decimal>,
}

/// A route handler for the report on an owner's income and spending.
pub async fn report_endpoint(
    State(state): State<ReportState>,
    Path(owner_id): Path<OwnerId>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, Error> {
    let date_range = DateRangeQuery {
        from: query.from,
        to: query.to,
    }
    .into_range()?;
    let connection = lock_connection(&state.db_connection)?;

    let expenses = get_expenses(owner_id, date_range.clone(), &connection)?;
    let incomes = get_incomes(owner_id, date_range, &connection)?;

    let limit = match query.limit {
        Some(limit) => limit,
        None => checked_sum(
            get_budgets(owner_id, &connection)?
                .iter()
                .map(|budget| budget.limit),
        )?,
    };
    let goal = match query.goal {
        Some(goal) => goal,
        None => checked_sum(
            get_savings_goals(owner_id, &connection)?
                .iter()
                .map(|goal| (goal.target_amount - goal.current_amount).max(Decimal::ZERO)),
        )?,
    };

    report(total_income(&incomes)?, &expenses, limit, goal).map(Json)
}
