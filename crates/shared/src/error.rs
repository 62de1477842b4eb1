use thiserror::Error;

use crate::domain::FormField;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please fill in all vital signs fields")]
    MissingVitalSigns { missing: Vec<FormField> },
    #[error("invalid clinical test details: missing {}", join_fields(.missing))]
    IncompleteRecord { missing: Vec<FormField> },
    #[error("{field} must be numeric, got {value:?}")]
    NonNumericVitalSign { field: FormField, value: String },
    #[error("unknown form field: {0}")]
    UnknownField(String),
}

fn join_fields(fields: &[FormField]) -> String {
    fields
        .iter()
        .map(|field| field.form_key())
        .collect::<Vec<_>>()
        .join(", ")
}
