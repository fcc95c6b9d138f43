//! User-facing messages for gateway outcomes.

use crate::models::Patient;
use crate::store::{StoreError, StoreErrorKind};

/// Shown alongside per-field errors when a form fails validation.
pub const FORM_ERRORS_MESSAGE: &str = "Please correct the errors in the form";

/// Conflict message naming the patient that already holds the DNI.
pub fn duplicate_dni_message(existing: &Patient) -> String {
    format!(
        "A patient with DNI {} already exists, identified as {}",
        existing.display_dni(),
        existing.full_name
    )
}

/// Translate a classified store failure into a user-facing message.
pub fn describe_store_error(
    kind: StoreErrorKind,
    message: &str,
    constraint: Option<&str>,
) -> String {
    match kind {
        StoreErrorKind::UniqueViolation => {
            if mentions_dni(message, constraint) {
                "A patient with this DNI already exists".to_string()
            } else {
                "A record with these values already exists".to_string()
            }
        }
        StoreErrorKind::ForeignKeyViolation => {
            "The record references data that does not exist".to_string()
        }
        StoreErrorKind::CheckViolation => "The data violates database constraints".to_string(),
        StoreErrorKind::NotFound => "Patient not found".to_string(),
        StoreErrorKind::Other => format!("Database error: {}", message),
    }
}

/// [`describe_store_error`] over a [`StoreError`].
pub fn describe(error: &StoreError) -> String {
    describe_store_error(error.kind, &error.message, error.constraint.as_deref())
}

fn mentions_dni(message: &str, constraint: Option<&str>) -> bool {
    constraint.is_some_and(|c| c.contains("dni")) || message.contains("dni")
}
