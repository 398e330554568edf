//! Application router configuration.

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::{
    AppState, Error,
    budget::{
        budget_status_endpoint, create_budget_endpoint, delete_budget_endpoint,
        list_budgets_endpoint, update_budget_endpoint,
    },
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, list_expenses_endpoint,
        update_expense_endpoint,
    },
    income::{create_income_endpoint, delete_income_endpoint, list_incomes_endpoint},
    logging::logging_middleware,
    recurring::{
        create_recurring_endpoint, deactivate_recurring_endpoint, get_recurring_endpoint,
        list_recurring_endpoint, process_recurring_endpoint,
    },
    report::report_endpoint,
    savings_goal::{
        contribute_endpoint, create_savings_goal_endpoint, delete_savings_goal_endpoint,
        goal_progress_endpoint, list_savings_goals_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::EXPENSES,
            post(create_expense_endpoint).get(list_expenses_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            put(update_expense_endpoint).delete(delete_expense_endpoint),
        )
        .route(
            endpoints::INCOMES,
            post(create_income_endpoint).get(list_incomes_endpoint),
        )
        .route(endpoints::INCOME, delete(delete_income_endpoint))
        .route(
            endpoints::BUDGETS,
            post(create_budget_endpoint).get(list_budgets_endpoint),
        )
        .route(endpoints::BUDGET_STATUS, get(budget_status_endpoint))
        .route(
            endpoints::BUDGET,
            put(update_budget_endpoint).delete(delete_budget_endpoint),
        )
        .route(
            endpoints::SAVINGS_GOALS,
            post(create_savings_goal_endpoint).get(list_savings_goals_endpoint),
        )
        .route(endpoints::SAVINGS_GOAL, delete(delete_savings_goal_endpoint))
        .route(
            endpoints::SAVINGS_GOAL_CONTRIBUTIONS,
            post(contribute_endpoint),
        )
        .route(endpoints::SAVINGS_GOAL_PROGRESS, get(goal_progress_endpoint))
        .route(
            endpoints::RECURRING,
            post(create_recurring_endpoint).get(list_recurring_endpoint),
        )
        .route(endpoints::PROCESS_RECURRING, post(process_recurring_endpoint))
        .route(endpoints::RECURRING_TRANSACTION, get(get_recurring_endpoint))
        .route(
            endpoints::DEACTIVATE_RECURRING,
            post(deactivate_recurring_endpoint),
        )
        .route(endpoints::REPORT, get(report_endpoint))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
