//! Persistence gateway for patient mutations.
//!
//! Pipeline: Validate → DNI pre-check → Store write → Notify list stale
//!
//! Every operation returns an [`ActionResult`]; validation failures,
//! conflicts and store errors never escape as `Err`. The DNI pre-check is
//! best effort; the store's unique constraint is the authoritative guard and
//! its violation maps to the same class of message.

mod messages;
mod notify;

pub use messages::*;
pub use notify::*;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{PatientInput, PatientPatch};
use crate::store::{PatientQuery, PatientStore, StoreError};
use crate::validation::{
    field, validate_new_patient, validate_patch, validate_patient_id, FieldErrors,
};

/// Outcome of a mutating operation, shaped for form handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    /// Id of the created or updated patient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: None,
            patient_id: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors: None,
            patient_id: None,
        }
    }

    pub fn invalid(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self {
            errors: Some(errors),
            ..Self::failure(message)
        }
    }

    pub fn with_patient_id(mut self, id: impl Into<String>) -> Self {
        self.patient_id = Some(id.into());
        self
    }
}

static NOOP_NOTIFIER: NoopNotifier = NoopNotifier;

/// Patient mutations over a [`PatientStore`].
pub struct PatientGateway<'a, S: PatientStore + ?Sized> {
    store: &'a S,
    notifier: &'a dyn ChangeNotifier,
}

impl<'a, S: PatientStore + ?Sized> PatientGateway<'a, S> {
    /// Create a gateway that does not signal list changes.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            notifier: &NOOP_NOTIFIER,
        }
    }

    /// Signal `notifier` after every successful mutation.
    pub fn with_notifier(mut self, notifier: &'a dyn ChangeNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Register a new patient.
    pub fn add(&self, input: &PatientInput) -> ActionResult {
        let patient = match validate_new_patient(input) {
            Ok(patient) => patient,
            Err(errors) => {
                debug!(fields = %field_list(&errors), "registration rejected");
                return ActionResult::invalid(FORM_ERRORS_MESSAGE, errors);
            }
        };

        if let Err(conflict) = self.ensure_dni_available(&patient.dni, None) {
            return conflict;
        }

        match self.store.insert_one(&patient) {
            Ok(stored) => {
                info!(patient_id = %stored.id, "patient registered");
                self.notifier.patients_changed();
                ActionResult::ok(format!("Patient {} registered successfully", stored.full_name))
                    .with_patient_id(stored.id)
            }
            Err(e) => store_failure("insert", &e),
        }
    }

    /// Apply a partial update to patient `id`.
    pub fn update(&self, id: &str, patch: &PatientPatch) -> ActionResult {
        let id = match parse_id(id) {
            Ok(id) => id,
            Err(result) => return result,
        };

        if patch.is_empty() {
            return ActionResult::failure("No changes were provided");
        }

        let changes = match validate_patch(patch) {
            Ok(changes) => changes,
            Err(errors) => {
                debug!(patient_id = %id, fields = %field_list(&errors), "update rejected");
                return ActionResult::invalid(FORM_ERRORS_MESSAGE, errors);
            }
        };

        if let Some(dni) = &changes.dni {
            if let Err(conflict) = self.ensure_dni_available(dni, Some(&id)) {
                return conflict;
            }
        }

        match self.store.update_by_id(&id, &changes) {
            Ok(()) => {
                info!(patient_id = %id, "patient updated");
                self.notifier.patients_changed();
                ActionResult::ok("Patient updated successfully").with_patient_id(id)
            }
            Err(e) => store_failure("update", &e),
        }
    }

    /// Set the active flag of patient `id`.
    pub fn set_active_status(&self, id: &str, is_active: bool) -> ActionResult {
        let id = match parse_id(id) {
            Ok(id) => id,
            Err(result) => return result,
        };

        match self.store.update_by_id(&id, &PatientPatch::status(is_active)) {
            Ok(()) => {
                info!(patient_id = %id, is_active, "patient status changed");
                self.notifier.patients_changed();
                let message = if is_active {
                    "Patient reactivated successfully"
                } else {
                    "Patient deactivated successfully"
                };
                ActionResult::ok(message).with_patient_id(id)
            }
            Err(e) => store_failure("set_active_status", &e),
        }
    }

    /// Soft-delete patient `id`.
    pub fn deactivate(&self, id: &str) -> ActionResult {
        self.set_active_status(id, false)
    }

    pub fn reactivate(&self, id: &str) -> ActionResult {
        self.set_active_status(id, true)
    }

    /// Reject `dni` if another patient (other than `exclude_id`) holds it.
    fn ensure_dni_available(
        &self,
        dni: &str,
        exclude_id: Option<&str>,
    ) -> Result<(), ActionResult> {
        let mut query = PatientQuery::by_dni(dni).limit(1);
        if let Some(id) = exclude_id {
            query = query.excluding(id);
        }

        match self.store.select(&query) {
            Ok(existing) => match existing.first() {
                Some(holder) => {
                    warn!(existing_id = %holder.id, "duplicate dni rejected");
                    Err(ActionResult::failure(duplicate_dni_message(holder)))
                }
                None => Ok(()),
            },
            Err(e) => Err(store_failure("dni_check", &e)),
        }
    }
}

fn parse_id(id: &str) -> Result<String, ActionResult> {
    validate_patient_id(id)
        .map(|uuid| uuid.to_string())
        .map_err(|e| {
            debug!("malformed patient id rejected");
            ActionResult::invalid("Invalid patient ID", FieldErrors::single(field::ID, e))
        })
}

fn field_list(errors: &FieldErrors) -> String {
    errors.fields().collect::<Vec<_>>().join(",")
}

fn store_failure(operation: &str, error: &StoreError) -> ActionResult {
    warn!(operation, kind = error.kind.as_str(), error = %error, "store operation failed");
    ActionResult::failure(describe(error))
}
