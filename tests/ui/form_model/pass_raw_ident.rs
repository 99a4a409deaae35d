use calmform::form::FormModel;

#[derive(calmform::form::FormModel)]
struct TypedForm {
    r#type: String,
}

fn main() {
    assert_eq!(TypedForm::fields().r#type().as_str(), "type");
    assert_eq!(TypedForm::field_keys()[0].as_str(), "type");
}
