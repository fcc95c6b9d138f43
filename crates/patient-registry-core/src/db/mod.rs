//! SQLite database layer for the patient registry.

mod patients;
mod schema;

pub use schema::*;

use std::path::Path;
use std::time::Duration;

use rusqlite::functions::FunctionFlags;
use rusqlite::{ffi, Connection, ErrorCode};

use crate::config::{RegistryConfig, IN_MEMORY_PATH};
use crate::store::{StoreError, StoreErrorKind, StoreResult};

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Open the database described by `config`.
    pub fn open_with_config(config: &RegistryConfig) -> StoreResult<Self> {
        let db = if config.database_path == IN_MEMORY_PATH {
            Self::open_in_memory()?
        } else {
            Self::open(&config.database_path)?
        };
        db.conn
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        tracing::debug!(
            path = %config.database_path,
            busy_timeout_ms = config.busy_timeout_ms,
            "database opened"
        );
        Ok(db)
    }

    /// Initialize schema and SQL helper functions.
    fn initialize(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        // Unicode-aware lower-casing; SQLite's lower() only folds ASCII.
        self.conn.create_scalar_function(
            "casefold",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let value: Option<String> = ctx.get(0)?;
                Ok(value.map(|s| s.to_lowercase()))
            },
        )?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("Record not found"),
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                let message = message.clone().unwrap_or_else(|| err.to_string());
                let kind = match failure.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        StoreErrorKind::UniqueViolation
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => StoreErrorKind::ForeignKeyViolation,
                    ffi::SQLITE_CONSTRAINT_CHECK => StoreErrorKind::CheckViolation,
                    _ => StoreErrorKind::Other,
                };
                let constraint = constraint_from_message(&message);
                let error = StoreError::new(kind, message);
                match constraint {
                    Some(constraint) => error.with_constraint(constraint),
                    None => error,
                }
            }
            _ => StoreError::other(err.to_string()),
        }
    }
}

/// Extract the constraint from "UNIQUE constraint failed: patients.dni".
fn constraint_from_message(message: &str) -> Option<String> {
    message
        .split_once("constraint failed: ")
        .map(|(_, rest)| rest.trim().to_string())
        .filter(|rest| !rest.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"patients".to_string()));
    }

    #[test]
    fn test_casefold_function() {
        let db = Database::open_in_memory().unwrap();
        let folded: String = db
            .conn()
            .query_row("SELECT casefold('PÉREZ Ñandú')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, "pérez ñandú");
    }

    #[test]
    fn test_open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.db");

        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .execute(
                    "INSERT INTO patients (id, full_name, dni, birth_date) VALUES (?, ?, ?, ?)",
                    ["p1", "Ana Gómez", "12345678", "1990-05-04"],
                )
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_unique_violation_classified() {
        let db = Database::open_in_memory().unwrap();
        let insert = "INSERT INTO patients (id, full_name, dni, birth_date) VALUES (?, ?, ?, ?)";
        db.conn()
            .execute(insert, ["p1", "Ana Gómez", "12345678", "1990-05-04"])
            .unwrap();

        let err: StoreError = db
            .conn()
            .execute(insert, ["p2", "Luis Díaz", "12345678", "1985-01-01"])
            .unwrap_err()
            .into();

        assert_eq!(err.kind, StoreErrorKind::UniqueViolation);
        assert_eq!(err.constraint.as_deref(), Some("patients.dni"));
    }

    #[test]
    fn test_check_violation_classified() {
        let db = Database::open_in_memory().unwrap();
        let err: StoreError = db
            .conn()
            .execute(
                "INSERT INTO patients (id, full_name, dni, birth_date) VALUES (?, ?, ?, ?)",
                ["p1", "Ana Gómez", "abc", "1990-05-04"],
            )
            .unwrap_err()
            .into();

        assert_eq!(err.kind, StoreErrorKind::CheckViolation);
        assert_eq!(err.constraint.as_deref(), Some("patients_dni_digits"));
    }

    #[test]
    fn test_no_rows_classified_as_not_found() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.kind, StoreErrorKind::NotFound);
    }

    #[test]
    fn test_constraint_from_message() {
        assert_eq!(
            constraint_from_message("UNIQUE constraint failed: patients.dni").as_deref(),
            Some("patients.dni")
        );
        assert_eq!(constraint_from_message("disk I/O error"), None);
    }
}
