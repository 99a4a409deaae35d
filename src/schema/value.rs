use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        self.0
    }
}

/// Input exactly as an input control reports it. Empty input is `Text("")`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(Decimal),
    Bool(bool),
}

impl Default for RawValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for RawValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(value: NaiveDate) -> Self {
        Self::Text(value.format("%Y-%m-%d").to_string())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ValueKind {
    Text,
    Number,
    Date,
    Boolean,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ValueKind::Text => "text",
            ValueKind::Number => "number",
            ValueKind::Date => "date",
            ValueKind::Boolean => "boolean",
        })
    }
}

/// A raw value after its field's coercion succeeded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
    Bool(bool),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Text(_) => ValueKind::Text,
            Value::Number(_) => ValueKind::Number,
            Value::Date(_) => ValueKind::Date,
            Value::Bool(_) => ValueKind::Boolean,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }
}

/// Current raw value of every declared field.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormValues(BTreeMap<FieldKey, RawValue>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl Into<RawValue>) -> Self {
        self.0.insert(FieldKey::new(key), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &RawValue)> {
        self.0.iter().map(|(key, value)| (*key, value))
    }

    pub(crate) fn insert(&mut self, key: FieldKey, value: RawValue) -> Option<RawValue> {
        self.0.insert(key, value)
    }
}

/// Coerced values of every field whose coercion succeeded in a pass.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CoercedValues(BTreeMap<FieldKey, Value>);

impl CoercedValues {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    pub fn number(&self, name: &str) -> Option<Decimal> {
        self.get(name).and_then(Value::as_number)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(Value::as_date)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &Value)> {
        self.0.iter().map(|(key, value)| (*key, value))
    }

    pub(crate) fn insert(&mut self, key: FieldKey, value: Value) {
        self.0.insert(key, value);
    }
}
