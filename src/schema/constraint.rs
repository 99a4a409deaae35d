use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use regex::Regex;
use rust_decimal::Decimal;

use super::value::{Value, ValueKind};

pub type ValuePredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A single check over a coerced value. Every variant carries the message
/// reported when the check fails.
#[derive(Clone)]
pub enum Constraint {
    /// Non-empty text, or a `true` boolean.
    Required { message: String },
    MinLength { min: usize, message: String },
    MaxLength { max: usize, message: String },
    Pattern { pattern: Regex, message: String },
    /// Strictly greater than zero.
    Positive { message: String },
    Min { min: Decimal, message: String },
    Max { max: Decimal, message: String },
    OneOf { allowed: Vec<String>, message: String },
    Refine { predicate: ValuePredicate, message: String },
}

impl Constraint {
    pub fn code(&self) -> &'static str {
        match self {
            Constraint::Required { .. } => "required",
            Constraint::MinLength { .. } => "min_length",
            Constraint::MaxLength { .. } => "max_length",
            Constraint::Pattern { .. } => "pattern",
            Constraint::Positive { .. } => "positive",
            Constraint::Min { .. } => "min",
            Constraint::Max { .. } => "max",
            Constraint::OneOf { .. } => "one_of",
            Constraint::Refine { .. } => "refine",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Constraint::Required { message }
            | Constraint::MinLength { message, .. }
            | Constraint::MaxLength { message, .. }
            | Constraint::Pattern { message, .. }
            | Constraint::Positive { message }
            | Constraint::Min { message, .. }
            | Constraint::Max { message, .. }
            | Constraint::OneOf { message, .. }
            | Constraint::Refine { message, .. } => message,
        }
    }

    pub fn applies_to(&self, kind: ValueKind) -> bool {
        match self {
            Constraint::Required { .. } => matches!(kind, ValueKind::Text | ValueKind::Boolean),
            Constraint::MinLength { .. }
            | Constraint::MaxLength { .. }
            | Constraint::Pattern { .. }
            | Constraint::OneOf { .. } => kind == ValueKind::Text,
            Constraint::Positive { .. } | Constraint::Min { .. } | Constraint::Max { .. } => {
                kind == ValueKind::Number
            }
            Constraint::Refine { .. } => true,
        }
    }

    /// Schemas reject inapplicable constraints at build time, so a kind
    /// mismatch here is treated as satisfied.
    pub fn is_satisfied_by(&self, value: &Value) -> bool {
        match (self, value) {
            (Constraint::Required { .. }, Value::Text(text)) => !text.is_empty(),
            (Constraint::Required { .. }, Value::Bool(flag)) => *flag,
            (Constraint::MinLength { min, .. }, Value::Text(text)) => text.chars().count() >= *min,
            (Constraint::MaxLength { max, .. }, Value::Text(text)) => text.chars().count() <= *max,
            (Constraint::Pattern { pattern, .. }, Value::Text(text)) => pattern.is_match(text),
            (Constraint::OneOf { allowed, .. }, Value::Text(text)) => {
                allowed.iter().any(|candidate| candidate == text)
            }
            (Constraint::Positive { .. }, Value::Number(number)) => {
                number.is_sign_positive() && !number.is_zero()
            }
            (Constraint::Min { min, .. }, Value::Number(number)) => number >= min,
            (Constraint::Max { max, .. }, Value::Number(number)) => number <= max,
            (Constraint::Refine { predicate, .. }, value) => predicate(value),
            _ => true,
        }
    }
}

impl Debug for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::MinLength { min, .. } => write!(f, "MinLength({min})"),
            Constraint::MaxLength { max, .. } => write!(f, "MaxLength({max})"),
            Constraint::Pattern { pattern, .. } => write!(f, "Pattern({})", pattern.as_str()),
            Constraint::Min { min, .. } => write!(f, "Min({min})"),
            Constraint::Max { max, .. } => write!(f, "Max({max})"),
            Constraint::OneOf { allowed, .. } => write!(f, "OneOf({allowed:?})"),
            other => f.write_str(other.code()),
        }
    }
}
