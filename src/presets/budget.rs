use rust_decimal::Decimal;

use crate::form::{
    ConfigError, FormController, FormModel, FormOptions, FormResult, FromValue, ValidationMode,
};
use crate::schema::{FieldSchema, FormValues, Schema, Value, ValueKind};

/// Options offered by the category picker. The schema only requires a choice.
pub const CATEGORIES: [&str; 5] = ["food", "transport", "housing", "utilities", "entertainment"];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BudgetPeriod {
    Daily,
    Monthly,
    Quarterly,
}

impl BudgetPeriod {
    pub const ALL: [BudgetPeriod; 3] = [
        BudgetPeriod::Daily,
        BudgetPeriod::Monthly,
        BudgetPeriod::Quarterly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BudgetPeriod::Daily => "daily",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Quarterly => "quarterly",
        }
    }
}

impl FromValue for BudgetPeriod {
    const KIND: ValueKind = ValueKind::Text;

    fn from_value(value: &Value) -> Option<Self> {
        let text = value.as_text()?;
        Self::ALL.into_iter().find(|period| period.as_str() == text)
    }
}

#[derive(Clone, Debug, PartialEq, FormModel)]
pub struct BudgetFormData {
    pub name: String,
    pub amount: Decimal,
    pub category: String,
    pub period: BudgetPeriod,
}

// The minimum is declared ahead of `positive` so a zero amount reports the
// minimum message.
pub fn budget_schema() -> Result<Schema, ConfigError> {
    Schema::builder()
        .field(
            FieldSchema::text("name")
                .required("Budget name is required")
                .max_length(50, "Name is too long"),
        )
        .field(
            FieldSchema::number("amount")
                .min(Decimal::new(1, 2), "Minimum amount is 0.01")
                .positive("Amount must be positive"),
        )
        .field(FieldSchema::text("category").required("Category is required"))
        .field(FieldSchema::text("period").one_of(
            BudgetPeriod::ALL.map(BudgetPeriod::as_str),
            "Please select a valid period",
        ))
        .build()
}

pub fn budget_defaults() -> FormValues {
    FormValues::new()
        .with("name", "")
        .with("amount", 0)
        .with("category", "")
        .with("period", BudgetPeriod::Monthly.as_str())
}

pub fn budget_form() -> FormResult<FormController> {
    FormController::for_model::<BudgetFormData>(
        budget_schema()?,
        budget_defaults(),
        FormOptions::with_mode(ValidationMode::OnChange),
    )
}
