use thiserror::Error;

use super::controller::SubmitState;
use crate::schema::ValueKind;

/// Integrator mistakes: the schema, the defaults and the bound fields disagree.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),
    #[error("field `{0}` is not declared in the schema")]
    UnknownField(String),
    #[error("no default value supplied for field `{0}`")]
    MissingDefault(String),
    #[error("constraint `{constraint}` cannot apply to {kind} field `{field}`")]
    IncompatibleConstraint {
        field: String,
        constraint: &'static str,
        kind: ValueKind,
    },
    #[error("model field `{field}` expects a {expected} value")]
    ModelMismatch { field: String, expected: ValueKind },
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid submit state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    #[error("form has been torn down")]
    TornDown,
}

pub type FormResult<T> = Result<T, FormError>;

/// Failure of a submission that passed validation.
#[derive(Debug, Error)]
pub enum SubmitError<E> {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("submit handler failed: {0}")]
    Handler(E),
}

impl<E> SubmitError<E> {
    pub fn handler_error(&self) -> Option<&E> {
        match self {
            SubmitError::Handler(error) => Some(error),
            SubmitError::Form(_) => None,
        }
    }
}
