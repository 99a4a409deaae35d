mod clock;
mod coercion;
mod constraint;
mod engine;
mod value;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use regex::Regex;
use rust_decimal::Decimal;

use crate::form::ConfigError;

pub use clock::{Clock, FixedClock, SystemClock};
pub use coercion::Coercion;
pub use constraint::{Constraint, ValuePredicate};
pub use engine::{FieldError, FormErrors, ValidationOutcome};
pub use value::{CoercedValues, FieldKey, FormValues, RawValue, Value, ValueKind};

pub type FormPredicate = Arc<dyn Fn(&CoercedValues) -> bool + Send + Sync>;

/// Coercion plus ordered constraints for one field.
#[derive(Clone, Debug)]
pub struct FieldSchema {
    key: FieldKey,
    coercion: Coercion,
    invalid_message: Option<String>,
    constraints: Vec<Constraint>,
}

pub(crate) struct FieldCheck {
    pub(crate) value: Option<Value>,
    pub(crate) error: Option<FieldError>,
}

impl FieldSchema {
    pub fn new(key: &'static str, coercion: Coercion) -> Self {
        Self {
            key: FieldKey::new(key),
            coercion,
            invalid_message: None,
            constraints: Vec::new(),
        }
    }

    pub fn text(key: &'static str) -> Self {
        Self::new(key, Coercion::Text)
    }

    pub fn number(key: &'static str) -> Self {
        Self::new(key, Coercion::Number)
    }

    pub fn date(key: &'static str) -> Self {
        Self::new(key, Coercion::Date)
    }

    pub fn boolean(key: &'static str) -> Self {
        Self::new(key, Coercion::Boolean)
    }

    /// Message reported when the raw value cannot be coerced.
    pub fn invalid_message(mut self, message: impl Into<String>) -> Self {
        self.invalid_message = Some(message.into());
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn required(self, message: impl Into<String>) -> Self {
        self.constraint(Constraint::Required {
            message: message.into(),
        })
    }

    pub fn min_length(self, min: usize, message: impl Into<String>) -> Self {
        self.constraint(Constraint::MinLength {
            min,
            message: message.into(),
        })
    }

    pub fn max_length(self, max: usize, message: impl Into<String>) -> Self {
        self.constraint(Constraint::MaxLength {
            max,
            message: message.into(),
        })
    }

    pub fn pattern(self, pattern: Regex, message: impl Into<String>) -> Self {
        self.constraint(Constraint::Pattern {
            pattern,
            message: message.into(),
        })
    }

    pub fn positive(self, message: impl Into<String>) -> Self {
        self.constraint(Constraint::Positive {
            message: message.into(),
        })
    }

    pub fn min(self, min: impl Into<Decimal>, message: impl Into<String>) -> Self {
        self.constraint(Constraint::Min {
            min: min.into(),
            message: message.into(),
        })
    }

    pub fn max(self, max: impl Into<Decimal>, message: impl Into<String>) -> Self {
        self.constraint(Constraint::Max {
            max: max.into(),
            message: message.into(),
        })
    }

    pub fn one_of<I, S>(self, allowed: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraint(Constraint::OneOf {
            allowed: allowed.into_iter().map(Into::into).collect(),
            message: message.into(),
        })
    }

    pub fn refine(
        self,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        self.constraint(Constraint::Refine {
            predicate: Arc::new(predicate),
            message: message.into(),
        })
    }

    /// Date strictly after `clock.today()`. The check is date-granular:
    /// timestamps are reduced to their UTC calendar date first, so any
    /// instant later today is rejected along with today itself.
    pub fn after_today(self, clock: impl Clock, message: impl Into<String>) -> Self {
        self.refine(
            move |value| value.as_date().is_some_and(|date| date > clock.today()),
            message,
        )
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn coercion(&self) -> Coercion {
        self.coercion
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn coercion_message(&self) -> &str {
        self.invalid_message
            .as_deref()
            .unwrap_or_else(|| self.coercion.default_message())
    }

    pub(crate) fn check(&self, raw: &RawValue) -> FieldCheck {
        let Some(value) = self.coercion.apply(raw) else {
            return FieldCheck {
                value: None,
                error: Some(FieldError::new(
                    FieldError::INVALID_TYPE,
                    self.coercion_message(),
                )),
            };
        };
        let error = self
            .constraints
            .iter()
            .find(|constraint| !constraint.is_satisfied_by(&value))
            .map(|constraint| FieldError::new(constraint.code(), constraint.message()));
        FieldCheck {
            value: Some(value),
            error,
        }
    }
}

/// Check over several coerced fields, reported against `target`.
#[derive(Clone)]
pub struct FormRefinement {
    target: FieldKey,
    depends_on: Vec<FieldKey>,
    predicate: FormPredicate,
    message: String,
}

impl FormRefinement {
    pub fn target(&self) -> FieldKey {
        self.target
    }

    pub fn depends_on(&self) -> &[FieldKey] {
        &self.depends_on
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn holds(&self, values: &CoercedValues) -> bool {
        (self.predicate)(values)
    }
}

impl Debug for FormRefinement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormRefinement")
            .field("target", &self.target)
            .field("depends_on", &self.depends_on)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct Schema {
    fields: Vec<FieldSchema>,
    refinements: Vec<FormRefinement>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|field| field.key().as_str() == name)
    }

    pub fn key(&self, name: &str) -> Option<FieldKey> {
        self.field(name).map(FieldSchema::key)
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.fields.iter().map(FieldSchema::key)
    }

    pub fn refinements(&self) -> &[FormRefinement] {
        &self.refinements
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<FieldKey, ConfigError> {
        self.key(name)
            .ok_or_else(|| ConfigError::UnknownField(name.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldSchema>,
    refinements: Vec<FormRefinement>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    pub fn refine<I>(
        mut self,
        target: &'static str,
        depends_on: I,
        predicate: impl Fn(&CoercedValues) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        self.refinements.push(FormRefinement {
            target: FieldKey::new(target),
            depends_on: depends_on.into_iter().map(FieldKey::new).collect(),
            predicate: Arc::new(predicate),
            message: message.into(),
        });
        self
    }

    pub fn build(self) -> Result<Schema, ConfigError> {
        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if !seen.insert(field.key()) {
                return Err(ConfigError::DuplicateField(field.key().to_string()));
            }
            let kind = field.coercion().target();
            if let Some(constraint) = field
                .constraints()
                .iter()
                .find(|constraint| !constraint.applies_to(kind))
            {
                return Err(ConfigError::IncompatibleConstraint {
                    field: field.key().to_string(),
                    constraint: constraint.code(),
                    kind,
                });
            }
        }
        for refinement in &self.refinements {
            if let Some(unknown) = std::iter::once(refinement.target())
                .chain(refinement.depends_on().iter().copied())
                .find(|key| !seen.contains(key))
            {
                return Err(ConfigError::UnknownField(unknown.to_string()));
            }
        }
        Ok(Schema {
            fields: self.fields,
            refinements: self.refinements,
        })
    }
}
