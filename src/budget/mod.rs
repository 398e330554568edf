//! Budgets: per-category spending limits.

mod core;
mod endpoints;

pub use core::{
    Budget, create_budget, create_budget_table, delete_budget, get_budgets, map_budget_row,
    update_budget_limit,
};
pub use endpoints::{
    BudgetForm, BudgetLimitForm, budget_status_endpoint, create_budget_endpoint,
    delete_budget_endpoint, list_budgets_endpoint, update_budget_endpoint,
};
