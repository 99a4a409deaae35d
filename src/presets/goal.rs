use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::form::{ConfigError, FormController, FormModel, FormOptions, FormResult, ValidationMode};
use crate::schema::{Clock, FieldSchema, FormValues, Schema, SystemClock};

/// Reported for an empty, malformed or non-future deadline alike.
pub const DEADLINE_MESSAGE: &str = "Deadline must be a future date";

/// Field keys are snake_case. Hosts posting the camelCase `targetAmount`
/// key must map it to `target_amount`; the camelCase name is not declared.
#[derive(Clone, Debug, PartialEq, FormModel)]
pub struct GoalFormData {
    pub title: String,
    pub target_amount: Decimal,
    pub deadline: NaiveDate,
}

pub fn goal_schema() -> Result<Schema, ConfigError> {
    goal_schema_with_clock(SystemClock)
}

pub fn goal_schema_with_clock(clock: impl Clock) -> Result<Schema, ConfigError> {
    Schema::builder()
        .field(
            FieldSchema::text("title")
                .required("Goal title is required")
                .max_length(100, "Title is too long"),
        )
        .field(
            FieldSchema::number("target_amount")
                .min(1, "Minimum target is 1 XLM")
                .positive("Target amount must be positive"),
        )
        .field(
            FieldSchema::date("deadline")
                .invalid_message(DEADLINE_MESSAGE)
                .after_today(clock, DEADLINE_MESSAGE),
        )
        .build()
}

pub fn goal_defaults() -> FormValues {
    FormValues::new()
        .with("title", "")
        .with("target_amount", 0)
        .with("deadline", "")
}

pub fn goal_form() -> FormResult<FormController> {
    goal_form_with_clock(SystemClock)
}

pub fn goal_form_with_clock(clock: impl Clock) -> FormResult<FormController> {
    FormController::for_model::<GoalFormData>(
        goal_schema_with_clock(clock)?,
        goal_defaults(),
        FormOptions::with_mode(ValidationMode::OnChange),
    )
}
