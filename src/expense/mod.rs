//! Expenses: money spent in a category on a date.

mod core;
mod endpoints;

pub use core::{
    Expense, ExpenseUpdate, NewExpense, create_expense, create_expense_table, delete_expense,
    get_expense, get_expenses, map_expense_row, update_expense,
};
pub use endpoints::{
    CreateExpenseForm, create_expense_endpoint, delete_expense_endpoint, list_expenses_endpoint,
    update_expense_endpoint,
};
