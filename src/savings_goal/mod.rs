//! Savings goals and contributions towards them.

mod core;
mod endpoints;

pub use core::{
    NewSavingsGoal, SavingsGoal, contribute_to_savings_goal, create_savings_goal,
    create_savings_goal_table, delete_savings_goal, get_savings_goal, get_savings_goals,
    map_savings_goal_row,
};
pub use endpoints::{
    ContributionForm, contribute_endpoint, create_savings_goal_endpoint,
    delete_savings_goal_endpoint, goal_progress_endpoint, list_savings_goals_endpoint,
};
