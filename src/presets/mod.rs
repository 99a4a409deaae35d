//! Ready-made schemas for the budgeting product's forms.

mod budget;
mod goal;

pub use budget::{
    BudgetFormData, BudgetFormDataFields, BudgetPeriod, CATEGORIES, budget_defaults, budget_form,
    budget_schema,
};
pub use goal::{
    DEADLINE_MESSAGE, GoalFormData, GoalFormDataFields, goal_defaults, goal_form,
    goal_form_with_clock, goal_schema, goal_schema_with_clock,
};
