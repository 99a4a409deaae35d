use super::*;
use chrono::NaiveDate;

fn signup_schema() -> Schema {
    Schema::builder()
        .field(
            FieldSchema::text("name")
                .required("required")
                .min_length(3, "too short")
                .max_length(8, "too long"),
        )
        .field(
            FieldSchema::number("amount")
                .positive("must be positive")
                .min(Decimal::new(1, 2), "minimum 0.01"),
        )
        .field(FieldSchema::text("period").one_of(["daily", "monthly"], "bad period"))
        .field(FieldSchema::text("password").required("password required"))
        .field(FieldSchema::text("confirm").required("confirm required"))
        .refine(
            "confirm",
            ["password"],
            |values| values.text("password") == values.text("confirm"),
            "passwords differ",
        )
        .build()
        .expect("valid schema")
}

fn valid_values() -> FormValues {
    FormValues::new()
        .with("name", "Alice")
        .with("amount", "12.5")
        .with("period", "daily")
        .with("password", "hunter2")
        .with("confirm", "hunter2")
}

#[test]
fn satisfied_constraints_produce_no_errors() {
    let outcome = signup_schema().validate(&valid_values());
    assert!(outcome.is_valid());
    assert_eq!(outcome.values.number("amount"), Some(Decimal::new(125, 1)));
    assert_eq!(outcome.values.text("name"), Some("Alice"));
}

#[test]
fn single_violation_reports_that_constraint() {
    let values = valid_values().with("name", "Al");
    let outcome = signup_schema().validate(&values);
    assert_eq!(outcome.errors.len(), 1);
    let error = outcome.errors.get("name").expect("name error");
    assert_eq!(error.message(), "too short");
    assert_eq!(error.code(), "min_length");
}

#[test]
fn first_declared_violation_wins() {
    let values = valid_values().with("amount", "-1");
    let outcome = signup_schema().validate(&values);
    assert_eq!(outcome.errors.message("amount"), Some("must be positive"));

    let values = valid_values().with("name", "");
    let outcome = signup_schema().validate(&values);
    assert_eq!(outcome.errors.message("name"), Some("required"));
}

#[test]
fn coercion_failure_does_not_stop_other_fields() {
    let values = valid_values()
        .with("amount", "abc")
        .with("period", "weekly");
    let outcome = signup_schema().validate(&values);
    let amount = outcome.errors.get("amount").expect("amount error");
    assert_eq!(amount.code(), FieldError::INVALID_TYPE);
    assert_eq!(amount.message(), "Expected a number");
    assert_eq!(outcome.errors.message("period"), Some("bad period"));
    assert!(!outcome.values.contains("amount"));
    assert_eq!(outcome.values.text("period"), Some("weekly"));
}

#[test]
fn validation_is_idempotent() {
    let schema = signup_schema();
    let values = valid_values().with("name", "").with("amount", "0");
    assert_eq!(schema.validate(&values), schema.validate(&values));
}

#[test]
fn cross_field_refinement_runs_after_field_checks() {
    let schema = signup_schema();
    let values = valid_values().with("confirm", "hunter3");
    let outcome = schema.validate(&values);
    let error = outcome.errors.get("confirm").expect("confirm error");
    assert_eq!(error.message(), "passwords differ");
    assert_eq!(error.code(), FieldError::FORM_REFINEMENT);
}

#[test]
fn cross_field_refinement_skips_failed_fields() {
    let schema = signup_schema();
    let values = valid_values().with("confirm", "");
    let outcome = schema.validate(&values);
    assert_eq!(outcome.errors.message("confirm"), Some("confirm required"));

    let values = valid_values().with("password", "").with("confirm", "other");
    let outcome = schema.validate(&values);
    assert_eq!(outcome.errors.message("password"), Some("password required"));
    assert!(!outcome.errors.contains("confirm"));
}

#[test]
fn missing_raw_value_is_treated_as_blank() {
    let values = FormValues::new().with("name", "Alice");
    let outcome = signup_schema().validate(&values);
    assert_eq!(outcome.values.number("amount"), Some(Decimal::ZERO));
    assert_eq!(outcome.errors.message("password"), Some("password required"));
}

#[test]
fn zero_amount_against_minimum() {
    let schema = Schema::builder()
        .field(FieldSchema::number("amount").min(Decimal::new(1, 2), "Minimum amount is 0.01"))
        .build()
        .expect("schema");
    let outcome = schema.validate(&FormValues::new().with("amount", "0"));
    assert_eq!(outcome.values.number("amount"), Some(Decimal::ZERO));
    assert_eq!(outcome.errors.message("amount"), Some("Minimum amount is 0.01"));
    assert!(!outcome.is_valid());
}

#[test]
fn future_date_refinement_uses_clock() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 17).expect("date");
    let schema = Schema::builder()
        .field(
            FieldSchema::date("deadline")
                .after_today(FixedClock(today), "Deadline must be a future date"),
        )
        .build()
        .expect("schema");

    let yesterday = FormValues::new().with("deadline", today.pred_opt().expect("yesterday"));
    let tomorrow = FormValues::new().with("deadline", today.succ_opt().expect("tomorrow"));
    assert_eq!(
        schema.validate(&yesterday).errors.message("deadline"),
        Some("Deadline must be a future date")
    );
    assert!(schema.validate(&tomorrow).is_valid());
}

#[test]
fn future_date_check_is_date_granular_for_timestamps() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 17).expect("date");
    let schema = Schema::builder()
        .field(FieldSchema::date("deadline").after_today(FixedClock(today), "future only"))
        .build()
        .expect("schema");

    let later_today = FormValues::new().with("deadline", "2026-10-17T23:00:00Z");
    let early_tomorrow = FormValues::new().with("deadline", "2026-10-18T00:30:00Z");
    assert_eq!(
        schema.validate(&later_today).errors.message("deadline"),
        Some("future only")
    );
    assert!(schema.validate(&early_tomorrow).is_valid());
}

#[test]
fn first_error_follows_declaration_order() {
    let schema = signup_schema();
    let values = valid_values().with("period", "weekly").with("name", "");
    let outcome = schema.validate(&values);
    assert_eq!(schema.first_error(&outcome.errors), Some(FieldKey::new("name")));
}

#[test]
fn field_lookup_exposes_coercion_and_constraints() {
    let schema = signup_schema();
    let amount = schema.field("amount").expect("amount field");
    assert_eq!(amount.coercion(), Coercion::Number);
    assert_eq!(
        amount
            .constraints()
            .iter()
            .map(Constraint::code)
            .collect::<Vec<_>>(),
        vec!["positive", "min"]
    );
    assert!(schema.field("missing").is_none());
}

#[test]
fn builder_rejects_duplicate_fields() {
    let error = Schema::builder()
        .field(FieldSchema::text("name"))
        .field(FieldSchema::number("name"))
        .build()
        .expect_err("duplicate");
    assert_eq!(error, ConfigError::DuplicateField("name".to_string()));
}

#[test]
fn builder_rejects_constraints_for_other_kinds() {
    let error = Schema::builder()
        .field(FieldSchema::number("amount").max_length(3, "too long"))
        .build()
        .expect_err("incompatible");
    assert_eq!(
        error,
        ConfigError::IncompatibleConstraint {
            field: "amount".to_string(),
            constraint: "max_length",
            kind: ValueKind::Number,
        }
    );
}

#[test]
fn builder_rejects_refinements_over_undeclared_fields() {
    let error = Schema::builder()
        .field(FieldSchema::text("confirm"))
        .refine("confirm", ["password"], |_| true, "never")
        .build()
        .expect_err("unknown dependency");
    assert_eq!(error, ConfigError::UnknownField("password".to_string()));
}
