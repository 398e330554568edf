//! Income: money earned from a source on a date.

mod core;
mod endpoints;

pub use core::{
    Income, NewIncome, create_income, create_income_table, delete_income, get_incomes,
    map_income_row,
};
pub use endpoints::{
    CreateIncomeForm, create_income_endpoint, delete_income_endpoint, list_incomes_endpoint,
};
