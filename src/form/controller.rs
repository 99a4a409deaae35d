use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Deserialize;

use super::error::{ConfigError, FormError, FormResult, SubmitError};
use super::model::FormModel;
use crate::schema::{
    CoercedValues, FieldError, FieldKey, FormErrors, FormValues, Schema, ValidationOutcome,
};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for FormId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "form-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    /// The handler ran and succeeded.
    Submitted,
    /// Validation failed; the handler was not called.
    Rejected,
    /// Another submission was in flight; nothing happened.
    Dropped,
    /// The form was torn down before the handler settled.
    Discarded,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationMode {
    #[serde(alias = "on-every-change")]
    OnChange,
    OnBlur,
    #[serde(alias = "on-submit-only")]
    OnSubmit,
}

/// Validation timing once the form has been submitted at least once.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevalidateMode {
    OnChange,
    OnBlur,
    OnSubmit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FormOptions {
    pub validate_mode: ValidationMode,
    pub revalidate_mode: RevalidateMode,
    pub show_errors_before_touch: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_mode: ValidationMode::OnSubmit,
            revalidate_mode: RevalidateMode::OnSubmit,
            show_errors_before_touch: false,
        }
    }
}

impl FormOptions {
    pub fn with_mode(validate_mode: ValidationMode) -> Self {
        Self {
            validate_mode,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldMeta {
    pub dirty: bool,
    pub touched: bool,
    pub error: Option<FieldError>,
}

#[derive(Clone, Debug)]
pub struct FormSnapshot {
    pub id: FormId,
    pub values: FormValues,
    pub errors: FormErrors,
    pub is_valid: bool,
    pub submit_state: SubmitState,
    pub submit_count: u32,
    pub dirty_fields: BTreeSet<FieldKey>,
    pub touched_fields: BTreeSet<FieldKey>,
    pub first_error: Option<FieldKey>,
}

impl FormSnapshot {
    pub fn is_submitting(&self) -> bool {
        self.submit_state == SubmitState::Submitting
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty_fields.is_empty()
    }

    pub fn can_submit(&self) -> bool {
        self.is_valid && self.submit_state == SubmitState::Idle
    }
}

pub(super) type Observer = Arc<dyn Fn(&FormSnapshot) + Send + Sync>;

#[derive(Default)]
pub(super) struct Observers {
    next: u64,
    entries: BTreeMap<SubscriptionId, Observer>,
}

pub(super) struct FormState {
    pub(super) id: FormId,
    pub(super) defaults: FormValues,
    pub(super) values: FormValues,
    pub(super) coerced: CoercedValues,
    pub(super) errors: FormErrors,
    pub(super) is_valid: bool,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) dirty_fields: BTreeSet<FieldKey>,
    pub(super) touched_fields: BTreeSet<FieldKey>,
    pub(super) first_error: Option<FieldKey>,
    pub(super) torn_down: bool,
}

impl FormState {
    pub(super) fn apply_outcome(&mut self, schema: &Schema, outcome: ValidationOutcome) {
        self.is_valid = outcome.is_valid();
        self.first_error = schema.first_error(&outcome.errors);
        self.errors = outcome.errors;
        self.coerced = outcome.values;
    }

    /// Updates validity without surfacing any messages.
    pub(super) fn apply_silent(&mut self, outcome: ValidationOutcome) {
        self.is_valid = outcome.is_valid();
        self.coerced = outcome.values;
    }

    pub(super) fn meta(&self, key: FieldKey) -> FieldMeta {
        FieldMeta {
            dirty: self.dirty_fields.contains(&key),
            touched: self.touched_fields.contains(&key),
            error: self.errors.get(key.as_str()).cloned(),
        }
    }
}

enum SubmitGate {
    Ready(CoercedValues, InFlight),
    Closed(SubmitOutcome),
}

/// Holds a submission in `Submitting` until its handler settles. Dropping it
/// unsettled (a cancelled future or a panicking handler) releases the form
/// back to `Idle`.
struct InFlight {
    controller: FormController,
    settled: bool,
}

impl InFlight {
    fn settle<E>(mut self, result: Result<(), E>) -> Result<SubmitOutcome, SubmitError<E>> {
        self.settled = true;
        self.controller.settle_submit(result)
    }

    fn release(mut self) -> FormResult<bool> {
        self.settled = true;
        self.controller.finish_submit()
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!("submission abandoned before its handler settled");
        if let Err(error) = self.controller.finish_submit() {
            tracing::error!(%error, "failed to release abandoned submission");
        }
    }
}

/// Binds a [`Schema`] to one live form: values, errors, touched/dirty
/// tracking and the submit lifecycle. Cloning yields another handle to the
/// same form.
#[derive(Clone)]
pub struct FormController {
    pub(super) options: FormOptions,
    pub(super) schema: Arc<Schema>,
    pub(super) state: Arc<RwLock<FormState>>,
    pub(super) observers: Arc<RwLock<Observers>>,
}

impl FormController {
    /// Every schema field needs a default and every default must name a
    /// schema field. Validity starts as the result of one silent pass.
    pub fn new(
        schema: impl Into<Arc<Schema>>,
        defaults: FormValues,
        options: FormOptions,
    ) -> FormResult<Self> {
        let schema = schema.into();
        if let Some(missing) = schema.keys().find(|key| !defaults.contains(key.as_str())) {
            return Err(ConfigError::MissingDefault(missing.to_string()).into());
        }
        if let Some((unknown, _)) = defaults
            .iter()
            .find(|(key, _)| schema.field(key.as_str()).is_none())
        {
            return Err(ConfigError::UnknownField(unknown.to_string()).into());
        }

        let initial = schema.validate(&defaults);
        let id = FormId::next();
        tracing::debug!(
            form = %id,
            fields = defaults.len(),
            valid = initial.is_valid(),
            ?options,
            "form initialized"
        );
        let mut state = FormState {
            id,
            defaults: defaults.clone(),
            values: defaults,
            coerced: CoercedValues::default(),
            errors: FormErrors::default(),
            is_valid: false,
            submit_state: SubmitState::Idle,
            submit_count: 0,
            dirty_fields: BTreeSet::new(),
            touched_fields: BTreeSet::new(),
            first_error: None,
            torn_down: false,
        };
        state.apply_silent(initial);

        Ok(Self {
            options,
            schema,
            state: Arc::new(RwLock::new(state)),
            observers: Arc::new(RwLock::new(Observers::default())),
        })
    }

    pub fn initialize(
        schema: impl Into<Arc<Schema>>,
        defaults: FormValues,
        options: FormOptions,
    ) -> FormResult<Self> {
        Self::new(schema, defaults, options)
    }

    /// Like [`FormController::new`], additionally checking that every field
    /// of `M` is declared so typed submits cannot miss a value.
    pub fn for_model<M: FormModel>(
        schema: impl Into<Arc<Schema>>,
        defaults: FormValues,
        options: FormOptions,
    ) -> FormResult<Self> {
        let controller = Self::new(schema, defaults, options)?;
        for key in M::field_keys() {
            controller.bind_key(*key)?;
        }
        Ok(controller)
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            id: state.id,
            values: state.values.clone(),
            errors: state.errors.clone(),
            is_valid: state.is_valid,
            submit_state: state.submit_state,
            submit_count: state.submit_count,
            dirty_fields: state.dirty_fields.clone(),
            touched_fields: state.touched_fields.clone(),
            first_error: state.first_error,
        })
    }

    pub fn field_meta(&self, name: &str) -> FormResult<FieldMeta> {
        let key = self.schema.resolve(name)?;
        Ok(read_lock(&self.state, "reading field meta")?.meta(key))
    }

    pub fn errors(&self) -> FormResult<FormErrors> {
        Ok(read_lock(&self.state, "reading form errors")?.errors.clone())
    }

    pub fn is_valid(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading form validity")?.is_valid)
    }

    pub fn is_submitting(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading submit state")?.submit_state == SubmitState::Submitting)
    }

    /// Valid and not already submitting.
    pub fn can_submit(&self) -> FormResult<bool> {
        let state = read_lock(&self.state, "reading submit availability")?;
        Ok(state.is_valid && state.submit_state == SubmitState::Idle)
    }

    /// Restores defaults and clears touched/dirty/errors. An in-flight
    /// submission keeps its state.
    pub fn reset(&self) -> FormResult<()> {
        let defaults = {
            let mut state = live_state(&self.state, "resetting form")?;
            state.values = state.defaults.clone();
            state.errors = FormErrors::default();
            state.first_error = None;
            state.submit_count = 0;
            state.dirty_fields.clear();
            state.touched_fields.clear();
            tracing::debug!(form = %state.id, "form reset");
            state.defaults.clone()
        };
        let outcome = self.schema.validate(&defaults);
        live_state(&self.state, "applying reset validity")?.apply_silent(outcome);
        self.notify()
    }

    pub fn reset_field(&self, name: &str) -> FormResult<()> {
        let key = self.schema.resolve(name)?;
        let values = {
            let mut state = live_state(&self.state, "resetting field")?;
            let default = state.defaults.get(name).cloned().unwrap_or_default();
            state.values.insert(key, default);
            state.dirty_fields.remove(&key);
            state.touched_fields.remove(&key);
            state.errors.remove(name);
            state.first_error = self.schema.first_error(&state.errors);
            state.values.clone()
        };
        let outcome = self.schema.validate(&values);
        live_state(&self.state, "applying field reset validity")?.apply_silent(outcome);
        self.notify()
    }

    pub fn clear_errors(&self) -> FormResult<()> {
        {
            let mut state = live_state(&self.state, "clearing all field errors")?;
            state.errors = FormErrors::default();
            state.first_error = None;
        }
        self.notify()
    }

    pub fn subscribe(
        &self,
        observer: impl Fn(&FormSnapshot) + Send + Sync + 'static,
    ) -> FormResult<SubscriptionId> {
        if read_lock(&self.state, "checking teardown before subscribe")?.torn_down {
            return Err(FormError::TornDown);
        }
        let mut observers = write_lock(&self.observers, "registering observer")?;
        observers.next += 1;
        let id = SubscriptionId(observers.next);
        observers.entries.insert(id, Arc::new(observer));
        Ok(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> FormResult<bool> {
        Ok(write_lock(&self.observers, "removing observer")?
            .entries
            .remove(&id)
            .is_some())
    }

    /// Detaches the form from its observers. A handler still running keeps
    /// running, but its result is discarded.
    pub fn teardown(&self) -> FormResult<()> {
        {
            let mut state = write_lock(&self.state, "tearing down form")?;
            state.torn_down = true;
            tracing::debug!(form = %state.id, "form torn down");
        }
        write_lock(&self.observers, "clearing observers")?
            .entries
            .clear();
        Ok(())
    }

    pub fn is_torn_down(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading teardown flag")?.torn_down)
    }

    pub fn submit<F, E>(&self, handler: F) -> Result<SubmitOutcome, SubmitError<E>>
    where
        F: FnOnce(CoercedValues) -> Result<(), E>,
    {
        let (values, in_flight) = match self.begin_submit()? {
            SubmitGate::Ready(values, in_flight) => (values, in_flight),
            SubmitGate::Closed(outcome) => return Ok(outcome),
        };
        in_flight.settle(handler(values))
    }

    pub async fn submit_async<F, Fut, E>(&self, handler: F) -> Result<SubmitOutcome, SubmitError<E>>
    where
        F: FnOnce(CoercedValues) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let (values, in_flight) = match self.begin_submit()? {
            SubmitGate::Ready(values, in_flight) => (values, in_flight),
            SubmitGate::Closed(outcome) => return Ok(outcome),
        };
        let result = handler(values).await;
        in_flight.settle(result)
    }

    pub fn submit_model<M, F, E>(&self, handler: F) -> Result<SubmitOutcome, SubmitError<E>>
    where
        M: FormModel,
        F: FnOnce(M) -> Result<(), E>,
    {
        let (model, in_flight) = match self.begin_model_submit::<M>()? {
            Ok(ready) => ready,
            Err(outcome) => return Ok(outcome),
        };
        in_flight.settle(handler(model))
    }

    pub async fn submit_model_async<M, F, Fut, E>(
        &self,
        handler: F,
    ) -> Result<SubmitOutcome, SubmitError<E>>
    where
        M: FormModel,
        F: FnOnce(M) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let (model, in_flight) = match self.begin_model_submit::<M>()? {
            Ok(ready) => ready,
            Err(outcome) => return Ok(outcome),
        };
        let result = handler(model).await;
        in_flight.settle(result)
    }

    fn begin_model_submit<M: FormModel>(
        &self,
    ) -> FormResult<Result<(M, InFlight), SubmitOutcome>> {
        let (values, in_flight) = match self.begin_submit()? {
            SubmitGate::Ready(values, in_flight) => (values, in_flight),
            SubmitGate::Closed(outcome) => return Ok(Err(outcome)),
        };
        match M::from_values(&values) {
            Ok(model) => Ok(Ok((model, in_flight))),
            Err(error) => {
                in_flight.release()?;
                Err(error.into())
            }
        }
    }

    fn begin_submit(&self) -> FormResult<SubmitGate> {
        let values = {
            let mut state = live_state(&self.state, "preparing submit")?;
            if state.submit_state != SubmitState::Idle {
                tracing::warn!(form = %state.id, "submit dropped, a submission is already in flight");
                return Ok(SubmitGate::Closed(SubmitOutcome::Dropped));
            }
            transition_submit_state(&mut state, SubmitState::Validating)?;
            state.submit_count = state.submit_count.saturating_add(1);
            state.values.clone()
        };

        let outcome = self.schema.validate(&values);
        let gate = {
            let mut state = write_lock(&self.state, "applying submit validation")?;
            if state.torn_down {
                transition_submit_state(&mut state, SubmitState::Idle)?;
                tracing::debug!(form = %state.id, "form torn down during submit validation");
                return Ok(SubmitGate::Closed(SubmitOutcome::Discarded));
            }
            state.apply_outcome(&self.schema, outcome);
            if state.is_valid {
                transition_submit_state(&mut state, SubmitState::Submitting)?;
                tracing::info!(form = %state.id, attempt = state.submit_count, "submitting form");
                SubmitGate::Ready(
                    state.coerced.clone(),
                    InFlight {
                        controller: self.clone(),
                        settled: false,
                    },
                )
            } else {
                transition_submit_state(&mut state, SubmitState::Idle)?;
                tracing::info!(
                    form = %state.id,
                    errors = state.errors.len(),
                    first_error = ?state.first_error,
                    "submit rejected by validation"
                );
                SubmitGate::Closed(SubmitOutcome::Rejected)
            }
        };
        self.notify()?;
        Ok(gate)
    }

    /// Returns `false` when the form was torn down while the handler ran.
    fn finish_submit(&self) -> FormResult<bool> {
        let live = {
            let mut state = write_lock(&self.state, "completing submit")?;
            transition_submit_state(&mut state, SubmitState::Idle)?;
            !state.torn_down
        };
        if live {
            self.notify()?;
        }
        Ok(live)
    }

    fn settle_submit<E>(&self, result: Result<(), E>) -> Result<SubmitOutcome, SubmitError<E>> {
        if !self.finish_submit()? {
            tracing::debug!("submit settled after teardown, result discarded");
            return Ok(SubmitOutcome::Discarded);
        }
        match result {
            Ok(()) => Ok(SubmitOutcome::Submitted),
            Err(error) => {
                tracing::warn!("submit handler failed");
                Err(SubmitError::Handler(error))
            }
        }
    }

    pub(super) fn notify(&self) -> FormResult<()> {
        let observers = read_lock(&self.observers, "reading observers")?
            .entries
            .values()
            .cloned()
            .collect::<Vec<_>>();
        if observers.is_empty() {
            return Ok(());
        }
        let snapshot = self.snapshot()?;
        tracing::trace!(form = %snapshot.id, observers = observers.len(), "notifying observers");
        for observer in observers {
            observer(&snapshot);
        }
        Ok(())
    }
}

pub(super) fn transition_submit_state(state: &mut FormState, next: SubmitState) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Validating, SubmitState::Idle)
            | (SubmitState::Submitting, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    state.submit_state = next;
    Ok(())
}

pub(super) fn live_state<'a>(
    lock: &'a RwLock<FormState>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, FormState>> {
    let state = write_lock(lock, context)?;
    if state.torn_down {
        return Err(FormError::TornDown);
    }
    Ok(state)
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
