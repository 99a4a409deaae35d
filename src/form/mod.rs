mod binding;
mod controller;
mod error;
mod model;
mod validation;


pub use binding::FieldHandle;
pub use calmform_derive::FormModel;
pub use controller::{
    FieldMeta, FormController, FormId, FormOptions, FormSnapshot, RevalidateMode, SubmitOutcome,
    SubmitState, SubscriptionId, ValidationMode,
};
pub use error::{ConfigError, FormError, FormResult, SubmitError};
pub use model::{FormModel, FromValue};
