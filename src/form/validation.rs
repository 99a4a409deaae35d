use super::controller::{FormController, RevalidateMode, ValidationMode, live_state, read_lock};
use super::error::FormResult;
use crate::schema::{CoercedValues, RawValue, ValidationOutcome};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Trigger {
    Change,
    Blur,
}

impl FormController {
    /// Replaces one field's raw value and recomputes its dirty flag.
    pub fn set_value(&self, name: &str, value: impl Into<RawValue>) -> FormResult<()> {
        let key = self.schema.resolve(name)?;
        let value = value.into();
        let submitted = {
            let mut state = live_state(&self.state, "writing field value")?;
            let is_dirty = state.defaults.get(name) != Some(&value);
            state.values.insert(key, value);
            if is_dirty {
                state.dirty_fields.insert(key);
            } else {
                state.dirty_fields.remove(&key);
            }
            tracing::debug!(form = %state.id, field = %key, dirty = is_dirty, "field changed");
            state.submit_count > 0
        };
        self.after_interaction(Trigger::Change, submitted)
    }

    pub fn on_field_change(&self, name: &str, value: impl Into<RawValue>) -> FormResult<()> {
        self.set_value(name, value)
    }

    /// Marks a field touched, as a blur event does.
    pub fn touch(&self, name: &str) -> FormResult<()> {
        let key = self.schema.resolve(name)?;
        let submitted = {
            let mut state = live_state(&self.state, "touching field")?;
            state.touched_fields.insert(key);
            tracing::debug!(form = %state.id, field = %key, "field touched");
            state.submit_count > 0
        };
        self.after_interaction(Trigger::Blur, submitted)
    }

    /// Runs a full pass and publishes its errors. Returns the new validity.
    pub fn validate_form(&self) -> FormResult<bool> {
        let values = read_lock(&self.state, "reading values for form validation")?
            .values
            .clone();
        let outcome = self.schema.validate(&values);
        let is_valid = {
            let mut state = live_state(&self.state, "applying form validation result")?;
            state.apply_outcome(&self.schema, outcome);
            tracing::debug!(
                form = %state.id,
                errors = state.errors.len(),
                valid = state.is_valid,
                "form validated"
            );
            state.is_valid
        };
        self.notify()?;
        Ok(is_valid)
    }

    /// Validates the current values without touching published state.
    pub fn validate(&self) -> FormResult<ValidationOutcome> {
        let values = read_lock(&self.state, "reading values for dry validation")?
            .values
            .clone();
        Ok(self.schema.validate(&values))
    }

    /// Coerced values from the most recent pass.
    pub fn coerced_values(&self) -> FormResult<CoercedValues> {
        Ok(read_lock(&self.state, "reading coerced values")?
            .coerced
            .clone())
    }

    fn after_interaction(&self, trigger: Trigger, submitted: bool) -> FormResult<()> {
        let validates = matches!(
            (trigger, self.options.validate_mode),
            (Trigger::Change, ValidationMode::OnChange) | (Trigger::Blur, ValidationMode::OnBlur)
        );
        let revalidates = submitted
            && matches!(
                (trigger, self.options.revalidate_mode),
                (Trigger::Change, RevalidateMode::OnChange) | (Trigger::Blur, RevalidateMode::OnBlur)
            );
        if validates || revalidates {
            self.validate_form().map(|_| ())
        } else {
            self.notify()
        }
    }
}
