//! Schema-driven form validation.
//!
//! A [`schema::Schema`] declares how each field's raw input is coerced and
//! which constraints it must meet. A [`form::FormController`] binds that
//! schema to one live form: it tracks values, touched and dirty fields,
//! publishes errors according to its validation mode, and only hands values
//! to a submit handler once they validate.

pub mod form;
pub mod prelude;
pub mod presets;
pub mod schema;
