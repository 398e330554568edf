//! Pure aggregation over an owner's ledger snapshot.
//!
//! None of these functions touch the database. Callers fetch the expenses and
//! income they want summarised and pass them in, so the same snapshot always
//! produces the same figures.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    budget::Budget,
    expense::Expense,
    income::Income,
    money::{checked_add, checked_sub, checked_sum, require_non_negative},
    savings_goal::SavingsGoal,
};

/// How current savings compare to a savings goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsStatus {
    /// Income minus total expenses. May be negative.
    pub current_savings: Decimal,
    /// Whether `current_savings` is at least the goal.
    pub is_reached: bool,
    /// How much more needs to be saved. Zero once the goal is reached.
    pub remaining: Decimal,
}

/// A summary of an owner's finances for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub income: Decimal,
    pub expenses_by_category: BTreeMap<String, Decimal>,
    pub total_expenses: Decimal,
    pub savings_status: SavingsStatus,
    pub is_over_budget: bool,
    /// Advice derived from `is_over_budget` and `savings_status`.
    pub suggestions: Vec<String>,
}

/// Spending in one category compared to its budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub category: String,
    pub limit: Decimal,
    pub spent: Decimal,
    /// `limit - spent`, negative when over budget.
    pub remaining: Decimal,
    pub is_over_budget: bool,
}

/// How far a savings goal is from its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub remaining: Decimal,
    /// Between 0 and 100, rounded to two decimal places.
    pub percent_complete: Decimal,
    pub is_reached: bool,
}

/// The sum of all expense amounts.
///
/// # Errors
/// Returns [Error::InvalidArgument] if the total overflows.
pub fn total_expenses(expenses: &[Expense]) -> Result<Decimal, Error> {
    checked_sum(expenses.iter().map(|expense| expense.amount))
}

/// The sum of all income amounts.
///
/// # Errors
/// Returns [Error::InvalidArgument] if the total overflows.
pub fn total_income(incomes: &[Income]) -> Result<Decimal, Error> {
    checked_sum(incomes.iter().map(|income| income.amount))
}

/// The sum of the expenses in `category`, zero if there are none.
///
/// # Errors
/// Returns [Error::InvalidArgument] if the total overflows.
pub fn category_total(expenses: &[Expense], category: &str) -> Result<Decimal, Error> {
    checked_sum(
        expenses
            .iter()
            .filter(|expense| expense.category == category)
            .map(|expense| expense.amount),
    )
}

/// Total spending for every category that appears in `expenses`.
///
/// # Errors
/// Returns [Error::InvalidArgument] if a category total overflows.
pub fn expenses_by_category(expenses: &[Expense]) -> Result<BTreeMap<String, Decimal>, Error> {
    let mut totals = BTreeMap::new();

    for expense in expenses {
        let total = totals
            .entry(expense.category.clone())
            .or_insert(Decimal::ZERO);
        *total = checked_add(*total, expense.amount)?;
    }

    Ok(totals)
}

/// Whether `total_expenses` is strictly greater than `limit`.
///
/// # Errors
/// Returns [Error::InvalidArgument] if `limit` is negative.
pub fn is_over_budget(total_expenses: Decimal, limit: Decimal) -> Result<bool, Error> {
    let limit = require_non_negative(limit, "limit")?;

    Ok(total_expenses > limit)
}

/// Compare what is left of `income` after `total_expenses` to `goal`.
///
/// # Errors
/// Returns [Error::InvalidArgument] if `goal` is negative or the savings overflow.
pub fn savings_status(
    income: Decimal,
    total_expenses: Decimal,
    goal: Decimal,
) -> Result<SavingsStatus, Error> {
    let goal = require_non_negative(goal, "goal")?;
    let current_savings = checked_sub(income, total_expenses)?;

    Ok(SavingsStatus {
        current_savings,
        is_reached: current_savings >= goal,
        remaining: checked_sub(goal, current_savings)?.max(Decimal::ZERO),
    })
}

/// Summarise `expenses` against `income`, a spending `limit` and a savings `goal`.
///
/// # Errors
/// Returns [Error::InvalidArgument] if `limit` or `goal` is negative, or if
/// the totals overflow.
pub fn report(
    income: Decimal,
    expenses: &[Expense],
    limit: Decimal,
    goal: Decimal,
) -> Result<Report, Error> {
    let total_expenses = total_expenses(expenses)?;
    let is_over_budget = is_over_budget(total_expenses, limit)?;
    let savings_status = savings_status(income, total_expenses, goal)?;

    let mut suggestions = Vec::new();
    if is_over_budget {
        suggestions.push(format!(
            "You are over budget by {}. Consider reducing your spending.",
            checked_sub(total_expenses, limit)?
        ));
    }
    if !savings_status.is_reached {
        suggestions.push(format!(
            "You need to save {} more to reach your savings goal.",
            savings_status.remaining
        ));
    }

    Ok(Report {
        income,
        expenses_by_category: expenses_by_category(expenses)?,
        total_expenses,
        savings_status,
        is_over_budget,
        suggestions,
    })
}

/// Evaluate each budget against the spending in its category, ordered by category.
///
/// # Errors
/// Returns [Error::InvalidArgument] if a category total overflows.
pub fn budget_statuses(
    expenses: &[Expense],
    budgets: &[Budget],
) -> Result<Vec<BudgetStatus>, Error> {
    let spending = expenses_by_category(expenses)?;

    let mut statuses = budgets
        .iter()
        .map(|budget| {
            let spent = spending
                .get(&budget.category)
                .copied()
                .unwrap_or(Decimal::ZERO);

            Ok(BudgetStatus {
                category: budget.category.clone(),
                limit: budget.limit,
                spent,
                remaining: checked_sub(budget.limit, spent)?,
                is_over_budget: spent > budget.limit,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    statuses.sort_by(|a, b| a.category.cmp(&b.category));
    Ok(statuses)
}

/// Work out how close `goal` is to its target.
///
/// A goal whose current amount has reached its target, including a zero
/// target, is 100% complete. Otherwise the ratio is below one and the
/// division cannot overflow.
pub fn goal_progress(goal: &SavingsGoal) -> GoalProgress {
    let is_reached = goal.current_amount >= goal.target_amount;
    let percent_complete = if is_reached {
        Decimal::ONE_HUNDRED
    } else {
        (goal.current_amount / goal.target_amount * Decimal::ONE_HUNDRED).round_dp(2)
    };

    GoalProgress {
        name: goal.name.clone(),
        target_amount: goal.target_amount,
        current_amount: goal.current_amount,
        remaining: (goal.target_amount - goal.current_amount).max(Decimal::ZERO),
        percent_complete,
        is_reached,
    }
}
