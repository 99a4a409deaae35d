pub use crate::form::{
    ConfigError, FieldHandle, FieldMeta, FormController, FormError, FormModel, FormOptions,
    FormResult, FormSnapshot, RevalidateMode, SubmitError, SubmitOutcome, SubmitState,
    ValidationMode,
};
pub use crate::schema::{
    CoercedValues, FieldError, FieldKey, FieldSchema, FormErrors, FormValues, RawValue, Schema,
    Value,
};
