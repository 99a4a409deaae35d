use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use super::Schema;
use super::value::{CoercedValues, FieldKey, FormValues, RawValue};

/// Why a field failed, as shown next to its input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    code: &'static str,
    message: String,
}

impl FieldError {
    pub const INVALID_TYPE: &'static str = "invalid_type";
    pub const FORM_REFINEMENT: &'static str = "form_refinement";

    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// At most one error per field, keyed by field name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormErrors(BTreeMap<FieldKey, FieldError>);

impl FormErrors {
    pub fn get(&self, name: &str) -> Option<&FieldError> {
        self.0.get(name)
    }

    pub fn message(&self, name: &str) -> Option<&str> {
        self.get(name).map(FieldError::message)
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

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &FieldError)> {
        self.0.iter().map(|(key, error)| (*key, error))
    }

    pub(crate) fn insert_first(&mut self, key: FieldKey, error: FieldError) {
        self.0.entry(key).or_insert(error);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<FieldError> {
        self.0.remove(name)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ValidationOutcome {
    /// Every field whose coercion succeeded, including fields that then
    /// failed a constraint.
    pub values: CoercedValues,
    pub errors: FormErrors,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Schema {
    /// Runs every field independently in declaration order, then the
    /// cross-field refinements. Never fails: problems land in `errors`.
    pub fn validate(&self, values: &FormValues) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();
        let missing = RawValue::default();

        for field in self.fields() {
            let raw = values.get(field.key().as_str()).unwrap_or(&missing);
            let check = field.check(raw);
            if let Some(value) = check.value {
                outcome.values.insert(field.key(), value);
            }
            if let Some(error) = check.error {
                outcome.errors.insert_first(field.key(), error);
            }
        }

        for refinement in self.refinements() {
            let blocked = std::iter::once(refinement.target())
                .chain(refinement.depends_on().iter().copied())
                .any(|key| outcome.errors.contains(key.as_str()));
            if blocked {
                continue;
            }
            if !refinement.holds(&outcome.values) {
                outcome.errors.insert_first(
                    refinement.target(),
                    FieldError::new(FieldError::FORM_REFINEMENT, refinement.message()),
                );
            }
        }

        tracing::trace!(
            fields = self.fields().len(),
            errors = outcome.errors.len(),
            "schema validation pass"
        );
        outcome
    }

    /// First failing field in declaration order.
    pub fn first_error(&self, errors: &FormErrors) -> Option<FieldKey> {
        self.fields()
            .iter()
            .map(|field| field.key())
            .find(|key| errors.contains(key.as_str()))
    }
}
