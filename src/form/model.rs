use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::error::ConfigError;
use crate::schema::{CoercedValues, FieldKey, Value, ValueKind};

/// A typed view of a validated form, usually produced by
/// `#[derive(FormModel)]`.
pub trait FormModel: Sized + 'static {
    type Fields;

    fn fields() -> Self::Fields;

    fn field_keys() -> &'static [FieldKey];

    fn from_values(values: &CoercedValues) -> Result<Self, ConfigError>;
}

pub trait FromValue: Sized {
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

impl FromValue for Decimal {
    const KIND: ValueKind = ValueKind::Number;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_number()
    }
}

impl FromValue for NaiveDate {
    const KIND: ValueKind = ValueKind::Date;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_date()
    }
}

impl FromValue for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl CoercedValues {
    pub fn extract<T: FromValue>(&self, key: FieldKey) -> Result<T, ConfigError> {
        self.get(key.as_str())
            .and_then(T::from_value)
            .ok_or_else(|| ConfigError::ModelMismatch {
                field: key.to_string(),
                expected: T::KIND,
            })
    }
}
