//! Patient Registry Core Library
//!
//! Validation and persistence layer for a home-care patient registry.
//!
//! # Architecture
//!
//! ```text
//! Form input ──► Validation ──► DNI pre-check ──► Store write ──► List marked stale
//!                    │               │                 │
//!                    ▼               ▼                 ▼
//!               field errors    conflict message   classified store error
//!                    └───────────────┴─────────────────┘
//!                                    │
//!                                    ▼
//!                              ActionResult
//!
//! Listing / search ──► PatientQueries ──► Store read ──► Vec<Patient> | QueryError
//! ```
//!
//! # Core Principle
//!
//! **Mutations never fail with `Err`.** Every outcome, including storage
//! failures, is reported as an [`ActionResult`] with a user-facing message.
//!
//! # Modules
//!
//! - [`validation`]: Field rules, normalization and form schemas
//! - [`models`]: Domain types (Patient, PatientInput, PatientPatch, etc.)
//! - [`store`]: Storage trait, query description and error classification
//! - [`db`]: SQLite implementation of the store
//! - [`gateway`]: Mutations returning [`ActionResult`]
//! - [`query`]: Listing, lookup and search
//! - [`config`]: JSON configuration
//! - [`logging`]: `tracing` subscriber setup

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod query;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use config::{ConfigError, RegistryConfig};
pub use db::Database;
pub use gateway::{ActionResult, ChangeNotifier, PatientGateway, StaleFlag};
pub use models::{NewPatient, Patient, PatientInput, PatientPatch, StatusFilter};
pub use query::{PatientQueries, QueryError};
pub use store::{PatientQuery, PatientStore, StoreError, StoreErrorKind};
pub use validation::{FieldErrors, SearchInput, ValidationError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RegistryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        match e.kind {
            StoreErrorKind::NotFound => RegistryError::NotFound(e.message),
            _ => RegistryError::DatabaseError(gateway::describe(&e)),
        }
    }
}

impl From<QueryError> for RegistryError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::InvalidId(_) | QueryError::InvalidSearch(_) => {
                RegistryError::InvalidInput(e.to_string())
            }
            QueryError::Store(inner) => inner.into(),
        }
    }
}

impl From<ConfigError> for RegistryError {
    fn from(e: ConfigError) -> Self {
        RegistryError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for RegistryError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        RegistryError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a registry database at the given path.
#[uniffi::export]
pub fn open_registry(path: String) -> Result<Arc<RegistryCore>, RegistryError> {
    let db = Database::open(&path)?;
    Ok(RegistryCore::wrap(db))
}

/// Create an in-memory registry (for testing).
#[uniffi::export]
pub fn open_registry_in_memory() -> Result<Arc<RegistryCore>, RegistryError> {
    let db = Database::open_in_memory()?;
    Ok(RegistryCore::wrap(db))
}

/// Open a registry from a JSON config file, installing logging first.
#[uniffi::export]
pub fn open_registry_with_config(config_path: String) -> Result<Arc<RegistryCore>, RegistryError> {
    let config = RegistryConfig::from_file(&config_path)?;
    logging::init_logging(&config.log_filter);

    let db = Database::open_with_config(&config)?;
    info!(path = %config.database_path, "registry opened");
    Ok(RegistryCore::wrap(db))
}

/// Install the global log subscriber. Returns `false` if one already exists.
#[uniffi::export]
pub fn init_logging(filter: String) -> bool {
    logging::init_logging(&filter)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe registry handle for FFI.
#[derive(uniffi::Object)]
pub struct RegistryCore {
    db: Arc<Mutex<Database>>,
    list_stale: Arc<StaleFlag>,
}

impl RegistryCore {
    fn wrap(db: Database) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            list_stale: Arc::new(StaleFlag::new()),
        })
    }
}

#[uniffi::export]
impl RegistryCore {
    // =========================================================================
    // Mutations
    // =========================================================================

    /// Register a new patient.
    pub fn add_patient(&self, input: FfiPatientInput) -> Result<FfiActionResult, RegistryError> {
        let db = self.db.lock()?;
        let gateway = PatientGateway::new(&*db).with_notifier(&*self.list_stale);
        Ok(gateway.add(&input.into()).into())
    }

    /// Apply a partial update.
    pub fn update_patient(
        &self,
        id: String,
        patch: FfiPatientPatch,
    ) -> Result<FfiActionResult, RegistryError> {
        let db = self.db.lock()?;
        let gateway = PatientGateway::new(&*db).with_notifier(&*self.list_stale);
        Ok(gateway.update(&id, &patch.into()).into())
    }

    pub fn set_active_status(
        &self,
        id: String,
        is_active: bool,
    ) -> Result<FfiActionResult, RegistryError> {
        let db = self.db.lock()?;
        let gateway = PatientGateway::new(&*db).with_notifier(&*self.list_stale);
        Ok(gateway.set_active_status(&id, is_active).into())
    }

    /// Soft-delete a patient.
    pub fn deactivate_patient(&self, id: String) -> Result<FfiActionResult, RegistryError> {
        self.set_active_status(id, false)
    }

    pub fn reactivate_patient(&self, id: String) -> Result<FfiActionResult, RegistryError> {
        self.set_active_status(id, true)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get_all_patients(&self) -> Result<Vec<FfiPatient>, RegistryError> {
        self.list(StatusFilter::All)
    }

    pub fn get_active_patients(&self) -> Result<Vec<FfiPatient>, RegistryError> {
        self.list(StatusFilter::Active)
    }

    pub fn get_inactive_patients(&self) -> Result<Vec<FfiPatient>, RegistryError> {
        self.list(StatusFilter::Inactive)
    }

    /// Get a patient by id. Unknown ids yield `None`.
    pub fn get_patient_by_id(&self, id: String) -> Result<Option<FfiPatient>, RegistryError> {
        let db = self.db.lock()?;
        let patient = PatientQueries::new(&*db).get_by_id(&id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Search by partial name or DNI.
    pub fn search_patients(
        &self,
        term: String,
        active_only: bool,
    ) -> Result<Vec<FfiPatient>, RegistryError> {
        let db = self.db.lock()?;
        let input = SearchInput {
            search_term: term,
            active_only,
        };
        let patients = PatientQueries::new(&*db).search(&input)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Whether a mutation happened since the last call. Clears the flag.
    pub fn take_list_stale(&self) -> bool {
        self.list_stale.take()
    }
}

impl RegistryCore {
    fn list(&self, filter: StatusFilter) -> Result<Vec<FfiPatient>, RegistryError> {
        let db = self.db.lock()?;
        let patients = PatientQueries::new(&*db).list(filter)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }
}

// =========================================================================
// FFI-Safe Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub full_name: String,
    pub dni: String,
    pub dni_display: String,
    pub birth_date: String,
    pub age: Option<u32>,
    pub created_at: String,
    pub is_active: bool,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            dni_display: patient.display_dni(),
            age: patient.age(),
            id: patient.id,
            full_name: patient.full_name,
            dni: patient.dni,
            birth_date: patient.birth_date,
            created_at: patient.created_at,
            is_active: patient.is_active,
        }
    }
}

/// FFI-safe registration form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientInput {
    pub full_name: String,
    pub dni: String,
    pub birth_date: String,
}

impl From<FfiPatientInput> for PatientInput {
    fn from(input: FfiPatientInput) -> Self {
        PatientInput {
            full_name: input.full_name,
            dni: input.dni,
            birth_date: input.birth_date,
        }
    }
}

/// FFI-safe partial update.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiPatientPatch {
    pub full_name: Option<String>,
    pub dni: Option<String>,
    pub birth_date: Option<String>,
    pub is_active: Option<bool>,
}

impl From<FfiPatientPatch> for PatientPatch {
    fn from(patch: FfiPatientPatch) -> Self {
        PatientPatch {
            full_name: patch.full_name,
            dni: patch.dni,
            birth_date: patch.birth_date,
            is_active: patch.is_active,
        }
    }
}

/// FFI-safe action result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiActionResult {
    pub success: bool,
    pub message: String,
    /// Field name to messages
    pub errors: Option<HashMap<String, Vec<String>>>,
    pub patient_id: Option<String>,
}

impl From<ActionResult> for FfiActionResult {
    fn from(result: ActionResult) -> Self {
        Self {
            success: result.success,
            message: result.message,
            errors: result
                .errors
                .map(|errors| errors.into_map().into_iter().collect()),
            patient_id: result.patient_id,
        }
    }
}
