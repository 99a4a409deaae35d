use std::str::FromStr;

use rust_decimal::Decimal;

use super::controller::{FieldMeta, FormController, read_lock};
use super::error::FormResult;
use crate::schema::{FieldError, FieldKey, RawValue};

/// Connection between one input control and its form field.
#[derive(Clone)]
pub struct FieldHandle {
    key: FieldKey,
    controller: FormController,
}

impl FieldHandle {
    pub fn name(&self) -> &'static str {
        self.key.as_str()
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn on_change(&self, value: impl Into<RawValue>) -> FormResult<()> {
        self.controller.set_value(self.name(), value)
    }

    /// For controls that report numbers as floats. Non-finite input is kept
    /// as text so it fails coercion like any other garbage.
    pub fn on_number_change(&self, value: f64) -> FormResult<()> {
        let raw = match decimal_from_f64(value) {
            Some(number) => RawValue::Number(number),
            None => RawValue::Text(value.to_string()),
        };
        self.on_change(raw)
    }

    pub fn on_blur(&self) -> FormResult<()> {
        self.controller.touch(self.name())
    }

    pub fn current_value(&self) -> FormResult<RawValue> {
        Ok(read_lock(&self.controller.state, "reading bound field value")?
            .values
            .get(self.name())
            .cloned()
            .unwrap_or_default())
    }

    pub fn error(&self) -> FormResult<Option<FieldError>> {
        Ok(read_lock(&self.controller.state, "reading bound field error")?
            .errors
            .get(self.name())
            .cloned())
    }

    pub fn display_error(&self) -> FormResult<Option<String>> {
        self.controller.field_error_for_display(self.name())
    }

    pub fn meta(&self) -> FormResult<FieldMeta> {
        self.controller.field_meta(self.name())
    }
}

impl FormController {
    /// Fails with [`super::ConfigError::UnknownField`] for undeclared names.
    pub fn bind(&self, name: &str) -> FormResult<FieldHandle> {
        let key = self.schema.resolve(name)?;
        Ok(FieldHandle {
            key,
            controller: self.clone(),
        })
    }

    pub fn bind_key(&self, key: FieldKey) -> FormResult<FieldHandle> {
        self.bind(key.as_str())
    }

    /// Errors are shown once the field was touched or edited, or the form
    /// was submitted.
    pub fn field_error_for_display(&self, name: &str) -> FormResult<Option<String>> {
        let key = self.schema.resolve(name)?;
        let state = read_lock(&self.state, "reading display error message")?;
        let Some(error) = state.errors.get(name) else {
            return Ok(None);
        };
        let visible = self.options.show_errors_before_touch
            || state.touched_fields.contains(&key)
            || state.dirty_fields.contains(&key)
            || state.submit_count > 0;
        Ok(visible.then(|| error.message().to_string()))
    }
}

fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}
