//! Record store contract.
//!
//! The gateway and query facade talk to storage only through [`PatientStore`].
//! [`crate::db::Database`] is the SQLite implementation; tests may supply
//! their own.

use thiserror::Error;

use crate::models::{NewPatient, Patient, PatientPatch};

/// Classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    UniqueViolation,
    ForeignKeyViolation,
    CheckViolation,
    NotFound,
    Other,
}

impl StoreErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreErrorKind::UniqueViolation => "unique_violation",
            StoreErrorKind::ForeignKeyViolation => "foreign_key_violation",
            StoreErrorKind::CheckViolation => "check_violation",
            StoreErrorKind::NotFound => "not_found",
            StoreErrorKind::Other => "other",
        }
    }
}

/// A classified store failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
    /// Constraint (or constrained column) reported by the store
    pub constraint: Option<String>,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            constraint: None,
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Other, message)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Selection over the patients collection.
///
/// Results are ordered newest first. Set filters are combined with AND. `text` is itself an OR: a
/// case-insensitive substring of `full_name`, or of `dni` with separators
/// removed from the term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientQuery {
    pub id: Option<String>,
    pub dni: Option<String>,
    pub exclude_id: Option<String>,
    pub is_active: Option<bool>,
    pub text: Option<String>,
    pub limit: Option<usize>,
}

impl PatientQuery {
    /// Every patient, newest first.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            limit: Some(1),
            ..Self::default()
        }
    }

    pub fn by_dni(dni: impl Into<String>) -> Self {
        Self {
            dni: Some(dni.into()),
            ..Self::default()
        }
    }

    pub fn excluding(mut self, id: impl Into<String>) -> Self {
        self.exclude_id = Some(id.into());
        self
    }

    pub fn active(mut self, is_active: Option<bool>) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn matching(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Storage operations over the patients collection.
pub trait PatientStore {
    /// Insert a validated patient. The store assigns `id`, `created_at` and
    /// `is_active = true`, and returns the stored row.
    fn insert_one(&self, patient: &NewPatient) -> StoreResult<Patient>;

    /// Select patients matching `query`.
    fn select(&self, query: &PatientQuery) -> StoreResult<Vec<Patient>>;

    /// Apply the present fields of `changes` to the patient `id`.
    ///
    /// Fails with [`StoreErrorKind::NotFound`] when no row has that id.
    fn update_by_id(&self, id: &str, changes: &PatientPatch) -> StoreResult<()>;
}
