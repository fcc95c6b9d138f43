//! Patient models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::validation::{calculate_age, format_dni, today, DATE_FORMAT};

/// A stored patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// UUID assigned by the store on insert
    pub id: String,
    /// Capitalized full name
    pub full_name: String,
    /// National ID, digits only
    pub dni: String,
    /// ISO date (YYYY-MM-DD)
    pub birth_date: String,
    /// Insertion timestamp (RFC 3339, UTC)
    pub created_at: String,
    /// Soft-delete flag
    pub is_active: bool,
}

impl Patient {
    /// DNI with thousands separators, e.g. "12.345.678".
    pub fn display_dni(&self) -> String {
        format_dni(&self.dni)
    }

    /// Parsed birth date, if the stored value is a valid ISO date.
    pub fn birth_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.birth_date, DATE_FORMAT).ok()
    }

    /// Age in whole years as of `today`.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.birth_date().map(|birth| calculate_age(birth, today))
    }

    /// Age in whole years as of the current local date.
    pub fn age(&self) -> Option<u32> {
        self.age_on(today())
    }
}

/// Raw form submission for registering a patient.
///
/// Missing keys deserialize to empty strings so they surface as
/// "required" validation messages rather than parse failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatientInput {
    pub full_name: String,
    pub dni: String,
    pub birth_date: String,
}

impl PatientInput {
    pub fn new(
        full_name: impl Into<String>,
        dni: impl Into<String>,
        birth_date: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            dni: dni.into(),
            birth_date: birth_date.into(),
        }
    }
}

/// A validated, normalized patient ready to be inserted.
///
/// Produced by [`crate::validation::validate_new_patient`]; the store
/// assigns `id`, `created_at` and `is_active` on insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub full_name: String,
    pub dni: String,
    pub birth_date: String,
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatientPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dni: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl PatientPatch {
    /// Patch that only toggles the active flag.
    pub fn status(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.dni.is_none()
            && self.birth_date.is_none()
            && self.is_active.is_none()
    }
}

/// Listing filter on the active flag.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    /// Every filter, in display order.
    pub const ALL: [StatusFilter; 3] = [
        StatusFilter::All,
        StatusFilter::Active,
        StatusFilter::Inactive,
    ];

    /// Required value of `is_active`, if any.
    pub fn is_active(self) -> Option<bool> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Active => Some(true),
            StatusFilter::Inactive => Some(false),
        }
    }

    /// Human-readable label for filter controls.
    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Active => "Active",
            StatusFilter::Inactive => "Inactive",
        }
    }
}
