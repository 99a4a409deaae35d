use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::value::{RawValue, Value, ValueKind};

/// Conversion applied to a raw value before any constraint runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Coercion {
    Text,
    Number,
    Date,
    Boolean,
}

impl Coercion {
    pub fn target(self) -> ValueKind {
        match self {
            Coercion::Text => ValueKind::Text,
            Coercion::Number => ValueKind::Number,
            Coercion::Date => ValueKind::Date,
            Coercion::Boolean => ValueKind::Boolean,
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            Coercion::Text => "Expected text",
            Coercion::Number => "Expected a number",
            Coercion::Date => "Invalid date",
            Coercion::Boolean => "Expected a boolean",
        }
    }

    /// Returns `None` when the raw value cannot be represented as the target kind.
    pub fn apply(self, raw: &RawValue) -> Option<Value> {
        match self {
            Coercion::Text => Some(Value::Text(coerce_text(raw))),
            Coercion::Number => coerce_number(raw).map(Value::Number),
            Coercion::Date => coerce_date(raw).map(Value::Date),
            Coercion::Boolean => Some(Value::Bool(coerce_bool(raw))),
        }
    }
}

fn coerce_text(raw: &RawValue) -> String {
    match raw {
        RawValue::Text(text) => text.clone(),
        RawValue::Number(number) => number.normalize().to_string(),
        RawValue::Bool(flag) => flag.to_string(),
    }
}

// Blank input reads as zero, matching the browser's numeric coercion. Digit
// separators are not numeric input there, though the decimal parser takes them.
fn coerce_number(raw: &RawValue) -> Option<Decimal> {
    match raw {
        RawValue::Number(number) => Some(*number),
        RawValue::Bool(flag) => Some(Decimal::from(u8::from(*flag))),
        RawValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Some(Decimal::ZERO);
            }
            if trimmed.contains('_') {
                return None;
            }
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .ok()
        }
    }
}

fn coerce_date(raw: &RawValue) -> Option<NaiveDate> {
    let RawValue::Text(text) = raw else {
        return None;
    };
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(trimmed)
            .ok()
            .map(|timestamp| timestamp.with_timezone(&Utc).date_naive())
    })
}

fn coerce_bool(raw: &RawValue) -> bool {
    match raw {
        RawValue::Text(text) => !text.is_empty(),
        RawValue::Number(number) => !number.is_zero(),
        RawValue::Bool(flag) => *flag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(raw: impl Into<RawValue>) -> Option<Decimal> {
        Coercion::Number
            .apply(&raw.into())
            .and_then(|value| value.as_number())
    }

    #[test]
    fn number_coercion_parses_trimmed_text() {
        assert_eq!(number(" 12.50 "), Some(Decimal::new(1250, 2)));
        assert_eq!(number("1e3"), Some(Decimal::from(1000)));
        assert_eq!(number("-4"), Some(Decimal::from(-4)));
    }

    #[test]
    fn blank_text_coerces_to_zero() {
        assert_eq!(number(""), Some(Decimal::ZERO));
        assert_eq!(number("   "), Some(Decimal::ZERO));
    }

    #[test]
    fn non_numeric_text_fails_number_coercion() {
        assert_eq!(number("twelve"), None);
        assert_eq!(number("12abc"), None);
    }

    #[test]
    fn digit_separators_fail_number_coercion() {
        assert_eq!(number("1_000"), None);
        assert_eq!(number("1_0e3"), None);
        assert_eq!(number("1000"), Some(Decimal::from(1000)));
    }

    #[test]
    fn booleans_coerce_to_one_or_zero() {
        assert_eq!(number(true), Some(Decimal::ONE));
        assert_eq!(number(false), Some(Decimal::ZERO));
    }

    #[test]
    fn date_coercion_accepts_calendar_dates_and_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2031, 4, 9);
        assert_eq!(
            Coercion::Date.apply(&"2031-04-09".into()).and_then(|v| v.as_date()),
            expected
        );
        assert_eq!(
            Coercion::Date
                .apply(&"2031-04-09T23:30:00-02:00".into())
                .and_then(|v| v.as_date()),
            NaiveDate::from_ymd_opt(2031, 4, 10)
        );
        assert_eq!(Coercion::Date.apply(&"".into()), None);
        assert_eq!(Coercion::Date.apply(&"not a date".into()), None);
        assert_eq!(Coercion::Date.apply(&RawValue::from(5)), None);
    }

    #[test]
    fn text_coercion_renders_scalars() {
        assert_eq!(
            Coercion::Text.apply(&RawValue::Number(Decimal::new(1010, 2))),
            Some(Value::Text("10.1".to_string()))
        );
        assert_eq!(
            Coercion::Text.apply(&RawValue::Bool(false)),
            Some(Value::Text("false".to_string()))
        );
    }

    #[test]
    fn boolean_coercion_is_truthiness() {
        assert_eq!(Coercion::Boolean.apply(&"".into()), Some(Value::Bool(false)));
        assert_eq!(Coercion::Boolean.apply(&"off".into()), Some(Value::Bool(true)));
        assert_eq!(
            Coercion::Boolean.apply(&RawValue::Number(Decimal::ZERO)),
            Some(Value::Bool(false))
        );
    }
}
