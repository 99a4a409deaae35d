use calmform::form::FormModel;
use calmform::schema::{FieldSchema, FormValues, Schema};
use rust_decimal::Decimal;

#[derive(Debug, calmform::form::FormModel)]
struct DemoForm {
    email: String,
    amount: Decimal,
}

fn main() {
    let fields = DemoForm::fields();
    assert_eq!(fields.email().as_str(), "email");
    assert_eq!(DemoForm::field_keys().len(), 2);

    let schema = Schema::builder()
        .field(FieldSchema::text("email").required("Email is required"))
        .field(FieldSchema::number("amount"))
        .build()
        .expect("schema");
    let outcome = schema.validate(
        &FormValues::new()
            .with("email", "a@calm.form")
            .with("amount", "2.5"),
    );
    let model = DemoForm::from_values(&outcome.values).expect("model");
    assert_eq!(model.email, "a@calm.form");
    assert_eq!(model.amount, Decimal::new(25, 1));
}
