//! Fintrack is a personal finance tracker.
//!
//! Owners record expenses, income, budgets and savings goals. Recurring
//! transactions are materialized into expenses and income on demand, and the
//! ledger is summarised into reports with spending and savings suggestions.
//!
//! This library provides a JSON REST API over a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod budget;
mod database_id;
mod date_range;
mod db;
mod endpoints;
mod error;
mod expense;
mod income;
mod logging;
mod money;
mod owner;
mod recurring;
mod report;
mod routing;
mod savings_goal;
mod timezone;

pub use app_state::AppState;
pub use budget::{Budget, create_budget};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use expense::{Expense, NewExpense, create_expense};
pub use income::{Income, NewIncome, create_income};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use owner::OwnerId;
pub use recurring::{
    Frequency, LedgerEntry, LedgerStore, NewRecurringTransaction, OwnerLocks,
    RecurringProcessor, RecurringTransaction, SQLiteLedgerStore, create_recurring_transaction,
    next_due_date,
};
pub use report::{
    BudgetStatus, GoalProgress, Report, SavingsStatus, budget_statuses, category_total,
    expenses_by_category, goal_progress, is_over_budget, report, savings_status, total_expenses,
    total_income,
};
pub use routing::build_router;
pub use savings_goal::{NewSavingsGoal, SavingsGoal, contribute_to_savings_goal, create_savings_goal};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
