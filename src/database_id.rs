//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of an expense row.
pub type ExpenseId = DatabaseId;
/// The ID of an income row.
pub type IncomeId = DatabaseId;
/// The ID of a budget row.
pub type BudgetId = DatabaseId;
/// The ID of a savings goal row.
pub type SavingsGoalId = DatabaseId;
/// The ID of a recurring transaction row.
pub type RecurringTransactionId = DatabaseId;
