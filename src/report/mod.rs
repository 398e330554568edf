//! Aggregates an owner's ledger into totals, budget checks and reports.

mod aggregation;
mod endpoints;

pub use aggregation::{
    BudgetStatus, GoalProgress, Report, SavingsStatus, budget_statuses, category_total,
    expenses_by_category, goal_progress, is_over_budget, report, savings_status, total_expenses,
    total_income,
};
pub use endpoints::{ReportQuery, report_endpoint};
