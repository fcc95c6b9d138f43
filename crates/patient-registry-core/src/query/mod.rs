//! Read-side operations over the patient store.
//!
//! Unlike the gateway, reads surface store failures as [`QueryError`] so a
//! failed load is never mistaken for an empty registry.

use thiserror::Error;
use tracing::{debug, warn};

use crate::gateway::describe;
use crate::models::{Patient, StatusFilter};
use crate::store::{PatientQuery, PatientStore, StoreError};
use crate::validation::{
    validate_patient_id, validate_search, FieldErrors, SearchInput, ValidationError,
};

/// Query errors.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("{0}")]
    InvalidId(#[from] ValidationError),

    #[error("Invalid search: {0}")]
    InvalidSearch(#[from] FieldErrors),

    #[error("Failed to load patients: {}", describe(.0))]
    Store(#[from] StoreError),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Query facade over a [`PatientStore`].
pub struct PatientQueries<'a, S: PatientStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: PatientStore + ?Sized> PatientQueries<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Patients matching `filter`, newest first.
    pub fn list(&self, filter: StatusFilter) -> QueryResult<Vec<Patient>> {
        let query = PatientQuery::all().active(filter.is_active());
        let patients = self.run(&query)?;
        debug!(filter = filter.label(), count = patients.len(), "patients listed");
        Ok(patients)
    }

    pub fn get_all(&self) -> QueryResult<Vec<Patient>> {
        self.list(StatusFilter::All)
    }

    pub fn get_active(&self) -> QueryResult<Vec<Patient>> {
        self.list(StatusFilter::Active)
    }

    pub fn get_inactive(&self) -> QueryResult<Vec<Patient>> {
        self.list(StatusFilter::Inactive)
    }

    /// Get a patient by id. Unknown ids yield `None`.
    pub fn get_by_id(&self, id: &str) -> QueryResult<Option<Patient>> {
        let id = validate_patient_id(id)?;
        let patient = self
            .run(&PatientQuery::by_id(id.to_string()))?
            .into_iter()
            .next();
        Ok(patient)
    }

    /// Case-insensitive partial match on name or DNI.
    pub fn search(&self, input: &SearchInput) -> QueryResult<Vec<Patient>> {
        let search = validate_search(input)?;
        let active = search.active_only.then_some(true);
        let query = PatientQuery::all().matching(search.term).active(active);

        let patients = self.run(&query)?;
        debug!(active_only = search.active_only, count = patients.len(), "patients searched");
        Ok(patients)
    }

    fn run(&self, query: &PatientQuery) -> QueryResult<Vec<Patient>> {
        self.store.select(query).map_err(|e| {
            warn!(kind = e.kind.as_str(), error = %e, "patient query failed");
            QueryError::Store(e)
        })
    }
}
