//! Record schemas built from the field validators.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    field, today, validate_birth_date_on, validate_dni, validate_full_name, FieldErrors,
    ValidationError,
};
use crate::models::{NewPatient, PatientInput, PatientPatch};

/// Length of a hyphenated UUID.
const HYPHENATED_UUID_LEN: usize = 36;

/// Validate a registration form. Every field is checked and all failures are
/// reported together.
pub fn validate_new_patient(input: &PatientInput) -> Result<NewPatient, FieldErrors> {
    validate_new_patient_on(input, today())
}

pub fn validate_new_patient_on(
    input: &PatientInput,
    today: NaiveDate,
) -> Result<NewPatient, FieldErrors> {
    let mut errors = FieldErrors::new();

    let full_name = errors.check(field::FULL_NAME, validate_full_name(&input.full_name));
    let dni = errors.check(field::DNI, validate_dni(&input.dni));
    let birth_date = errors.check(
        field::BIRTH_DATE,
        validate_birth_date_on(&input.birth_date, today),
    );

    match (full_name, dni, birth_date) {
        (Some(full_name), Some(dni), Some(birth_date)) => Ok(NewPatient {
            full_name,
            dni,
            birth_date,
        }),
        _ => Err(errors),
    }
}

/// Validate the fields present in a patch and return the normalized patch.
pub fn validate_patch(patch: &PatientPatch) -> Result<PatientPatch, FieldErrors> {
    validate_patch_on(patch, today())
}

pub fn validate_patch_on(
    patch: &PatientPatch,
    today: NaiveDate,
) -> Result<PatientPatch, FieldErrors> {
    let mut errors = FieldErrors::new();

    let full_name = patch
        .full_name
        .as_deref()
        .and_then(|name| errors.check(field::FULL_NAME, validate_full_name(name)));
    let dni = patch
        .dni
        .as_deref()
        .and_then(|dni| errors.check(field::DNI, validate_dni(dni)));
    let birth_date = patch
        .birth_date
        .as_deref()
        .and_then(|date| errors.check(field::BIRTH_DATE, validate_birth_date_on(date, today)));

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(PatientPatch {
        full_name,
        dni,
        birth_date,
        is_active: patch.is_active,
    })
}

/// Raw search request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchInput {
    #[serde(default)]
    pub search_term: String,
    #[serde(default = "default_active_only")]
    pub active_only: bool,
}

fn default_active_only() -> bool {
    true
}

impl SearchInput {
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            active_only: default_active_only(),
        }
    }

    pub fn including_inactive(mut self) -> Self {
        self.active_only = false;
        self
    }
}

/// Validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Trimmed, non-empty term
    pub term: String,
    pub active_only: bool,
}

pub fn validate_search(input: &SearchInput) -> Result<SearchQuery, FieldErrors> {
    let term = input.search_term.trim();
    if term.is_empty() {
        return Err(FieldErrors::single(
            field::SEARCH_TERM,
            ValidationError::new("Search term is required"),
        ));
    }
    Ok(SearchQuery {
        term: term.to_string(),
        active_only: input.active_only,
    })
}

/// Validate a patient identifier (hyphenated UUID).
pub fn validate_patient_id(id: &str) -> Result<Uuid, ValidationError> {
    if id.len() != HYPHENATED_UUID_LEN {
        return Err(invalid_id());
    }
    Uuid::parse_str(id).map_err(|_| invalid_id())
}

fn invalid_id() -> ValidationError {
    ValidationError::new("Patient ID must be a valid UUID")
}
