//! The API endpoints URIs.
//!
//! Every route is scoped to an owner. For endpoints that take parameters, e.g.
//! '/api/owners/{owner_id}/expenses/{expense_id}', use [format_endpoint].

/// The route to create and list an owner's expenses.
pub const EXPENSES: &str = "/api/owners/{owner_id}/expenses";
/// The route to update or delete a single expense.
pub const EXPENSE: &str = "/api/owners/{owner_id}/expenses/{expense_id}";
/// The route to create and list an owner's income.
pub const INCOMES: &str = "/api/owners/{owner_id}/incomes";
/// The route to delete a single income record.
pub const INCOME: &str = "/api/owners/{owner_id}/incomes/{income_id}";
/// The route to create and list an owner's budgets.
pub const BUDGETS: &str = "/api/owners/{owner_id}/budgets";
/// The route to update or delete a single budget.
pub const BUDGET: &str = "/api/owners/{owner_id}/budgets/{budget_id}";
/// The route to compare spending against each budget.
pub const BUDGET_STATUS: &str = "/api/owners/{owner_id}/budgets/status";
/// The route to create and list an owner's savings goals.
pub const SAVINGS_GOALS: &str = "/api/owners/{owner_id}/savings_goals";
/// The route to delete a single savings goal.
pub const SAVINGS_GOAL: &str = "/api/owners/{owner_id}/savings_goals/{goal_id}";
/// The route to add money to a savings goal.
pub const SAVINGS_GOAL_CONTRIBUTIONS: &str =
    "/api/owners/{owner_id}/savings_goals/{goal_id}/contributions";
/// The route to check how close a savings goal is to being reached.
pub const SAVINGS_GOAL_PROGRESS: &str = "/api/owners/{owner_id}/savings_goals/{goal_id}/progress";
/// The route to create and list an owner's recurring transactions.
pub const RECURRING: &str = "/api/owners/{owner_id}/recurring";
/// The route to fetch a single recurring transaction.
pub const RECURRING_TRANSACTION: &str = "/api/owners/{owner_id}/recurring/{recurring_id}";
/// The route to stop a recurring transaction from being processed.
pub const DEACTIVATE_RECURRING: &str =
    "/api/owners/{owner_id}/recurring/{recurring_id}/deactivate";
/// The route to materialize every recurring transaction that has fallen due.
pub const PROCESS_RECURRING: &str = "/api/owners/{owner_id}/recurring/process";
/// The route to the financial report.
pub const REPORT: &str = "/api/owners/{owner_id}/report";

/// Replace the parameters in `endpoint_path` with `ids`, in order.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/owners/{owner_id}', '{owner_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters.
/// Parameters without a matching ID are left as they are.
pub fn format_endpoint(endpoint_path: &str, ids: &[i64]) -> String {
    let mut formatted = String::with_capacity(endpoint_path.len());
    let mut ids = ids.iter();
    let mut rest = endpoint_path;

    while let Some(param_start) = rest.find('{') {
        let Some(param_length) = rest[param_start..].find('}') else {
            break;
        };
        let param_end = param_start + param_length + 1;

        formatted.push_str(&rest[..param_start]);
        match ids.next() {
            Some(id) => formatted.push_str(&id.to_string()),
            None => formatted.push_str(&rest[param_start..param_end]),
        }

        rest = &rest[param_end..];
    }

    formatted.push_str(rest);
    formatted
}
