//! Patient database operations.

use chrono::{SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use super::Database;
use crate::models::{NewPatient, Patient, PatientPatch};
use crate::store::{PatientQuery, PatientStore, StoreError, StoreResult};
use crate::validation::strip_dni_separators;

const PATIENT_COLUMNS: &str = "id, full_name, dni, birth_date, created_at, is_active";

fn row_to_patient(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        full_name: row.get(1)?,
        dni: row.get(2)?,
        birth_date: row.get(3)?,
        created_at: row.get(4)?,
        is_active: row.get(5)?,
    })
}

impl PatientStore for Database {
    fn insert_one(&self, patient: &NewPatient) -> StoreResult<Patient> {
        let id = uuid::Uuid::new_v4().to_string();
        // Same fixed-width millisecond format as the schema default, so lexical
        // and chronological order agree for every row.
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, full_name, dni, birth_date, created_at, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, 1)
            "#,
            params![
                id,
                patient.full_name,
                patient.dni,
                patient.birth_date,
                created_at,
            ],
        )?;

        Ok(Patient {
            id,
            full_name: patient.full_name.clone(),
            dni: patient.dni.clone(),
            birth_date: patient.birth_date.clone(),
            created_at,
            is_active: true,
        })
    }

    fn select(&self, query: &PatientQuery) -> StoreResult<Vec<Patient>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(id) = &query.id {
            clauses.push("id = ?");
            values.push(Value::Text(id.clone()));
        }
        if let Some(dni) = &query.dni {
            clauses.push("dni = ?");
            values.push(Value::Text(dni.clone()));
        }
        if let Some(exclude_id) = &query.exclude_id {
            clauses.push("id <> ?");
            values.push(Value::Text(exclude_id.clone()));
        }
        if let Some(is_active) = query.is_active {
            clauses.push("is_active = ?");
            values.push(Value::Integer(i64::from(is_active)));
        }
        if let Some(text) = &query.text {
            let folded = text.trim().to_lowercase();
            let compact = strip_dni_separators(text);
            if compact.is_empty() {
                clauses.push("instr(casefold(full_name), ?) > 0");
                values.push(Value::Text(folded));
            } else {
                clauses.push("(instr(casefold(full_name), ?) > 0 OR instr(dni, ?) > 0)");
                values.push(Value::Text(folded));
                values.push(Value::Text(compact));
            }
        }

        let mut sql = format!("SELECT {} FROM patients", PATIENT_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC");
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), row_to_patient)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn update_by_id(&self, id: &str, changes: &PatientPatch) -> StoreResult<()> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(full_name) = &changes.full_name {
            assignments.push("full_name = ?");
            values.push(Value::Text(full_name.clone()));
        }
        if let Some(dni) = &changes.dni {
            assignments.push("dni = ?");
            values.push(Value::Text(dni.clone()));
        }
        if let Some(birth_date) = &changes.birth_date {
            assignments.push("birth_date = ?");
            values.push(Value::Text(birth_date.clone()));
        }
        if let Some(is_active) = changes.is_active {
            assignments.push("is_active = ?");
            values.push(Value::Integer(i64::from(is_active)));
        }

        if assignments.is_empty() {
            return self
                .conn
                .query_row("SELECT 1 FROM patients WHERE id = ?", [id], |_| Ok(()))
                .optional()?
                .ok_or_else(|| not_found(id));
        }

        let sql = format!(
            "UPDATE patients SET {} WHERE id = ?",
            assignments.join(", ")
        );
        values.push(Value::Text(id.to_string()));

        let rows_affected = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        if rows_affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}

fn not_found(id: &str) -> StoreError {
    StoreError::not_found(format!("No patient with id {}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreErrorKind;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn new_patient(full_name: &str, dni: &str) -> NewPatient {
        NewPatient {
            full_name: full_name.into(),
            dni: dni.into(),
            birth_date: "1980-03-12".into(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let inserted = db.insert_one(&new_patient("Ana Gómez", "12345678")).unwrap();
        assert_eq!(inserted.id.len(), 36); // UUID format
        assert!(inserted.is_active);

        let found = db.select(&PatientQuery::by_id(&inserted.id)).unwrap();
        assert_eq!(found, vec![inserted]);
    }

    #[test]
    fn test_duplicate_dni_rejected() {
        let db = setup_db();
        db.insert_one(&new_patient("Ana Gómez", "12345678")).unwrap();

        let err = db.insert_one(&new_patient("Luis Díaz", "12345678")).unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::UniqueViolation);

        assert_eq!(db.select(&PatientQuery::all()).unwrap().len(), 1);
    }

    #[test]
    fn test_select_newest_first() {
        let db = setup_db();
        let first = db.insert_one(&new_patient("Ana Gómez", "11111111")).unwrap();
        let second = db.insert_one(&new_patient("Luis Díaz", "22222222")).unwrap();
        let third = db.insert_one(&new_patient("Eva Ruiz", "3333333")).unwrap();

        let ids: Vec<_> = db
            .select(&PatientQuery::all())
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![third.id.clone(), second.id, first.id]);

        let newest = db.select(&PatientQuery::all().limit(1)).unwrap();
        assert_eq!(newest[0].id, third.id);
    }

    #[test]
    fn test_created_at_matches_schema_default() {
        let db = setup_db();
        db.conn()
            .execute(
                "INSERT INTO patients (id, full_name, dni, birth_date) VALUES (?, ?, ?, ?)",
                ["p-default", "Eva Ruiz", "3333333", "1975-08-20"],
            )
            .unwrap();
        let inserted = db.insert_one(&new_patient("Ana Gómez", "12345678")).unwrap();

        let all = db.select(&PatientQuery::all()).unwrap();
        assert_eq!(all[0].id, inserted.id);
        assert_eq!(all[1].id, "p-default");

        // 2024-05-01T10:00:00.123Z
        for patient in &all {
            assert_eq!(patient.created_at.len(), 24, "{}", patient.created_at);
            assert!(patient.created_at.ends_with('Z'));
        }
    }

    #[test]
    fn test_select_by_dni_excluding() {
        let db = setup_db();
        let ana = db.insert_one(&new_patient("Ana Gómez", "12345678")).unwrap();

        assert_eq!(db.select(&PatientQuery::by_dni("12345678")).unwrap().len(), 1);
        assert!(db
            .select(&PatientQuery::by_dni("12345678").excluding(&ana.id))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_select_text_matches_name_or_dni() {
        let db = setup_db();
        db.insert_one(&new_patient("José Pérez", "12345678")).unwrap();
        db.insert_one(&new_patient("Ana Gómez", "7654321")).unwrap();

        let by_name = db.select(&PatientQuery::all().matching("PÉREZ")).unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].full_name, "José Pérez");

        let by_dni = db.select(&PatientQuery::all().matching("12.345")).unwrap();
        assert_eq!(by_dni.len(), 1);
        assert_eq!(by_dni[0].dni, "12345678");

        let none = db.select(&PatientQuery::all().matching("zzz")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_update_fields() {
        let db = setup_db();
        let ana = db.insert_one(&new_patient("Ana Gómez", "12345678")).unwrap();

        let changes = PatientPatch {
            full_name: Some("Ana María Gómez".into()),
            ..PatientPatch::default()
        };
        db.update_by_id(&ana.id, &changes).unwrap();

        let updated = db.select(&PatientQuery::by_id(&ana.id)).unwrap().remove(0);
        assert_eq!(updated.full_name, "Ana María Gómez");
        assert_eq!(updated.dni, ana.dni);
        assert_eq!(updated.created_at, ana.created_at);
    }

    #[test]
    fn test_update_status_and_filter() {
        let db = setup_db();
        let ana = db.insert_one(&new_patient("Ana Gómez", "12345678")).unwrap();
        db.insert_one(&new_patient("Luis Díaz", "7654321")).unwrap();

        db.update_by_id(&ana.id, &PatientPatch::status(false)).unwrap();

        let inactive = db.select(&PatientQuery::all().active(Some(false))).unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].id, ana.id);
        assert!(!inactive[0].is_active);

        let active = db.select(&PatientQuery::all().active(Some(true))).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].full_name, "Luis Díaz");
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let db = setup_db();
        let id = uuid::Uuid::new_v4().to_string();

        let err = db.update_by_id(&id, &PatientPatch::status(false)).unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::NotFound);

        let err = db.update_by_id(&id, &PatientPatch::default()).unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::NotFound);
    }

    #[test]
    fn test_update_to_taken_dni() {
        let db = setup_db();
        db.insert_one(&new_patient("Ana Gómez", "12345678")).unwrap();
        let luis = db.insert_one(&new_patient("Luis Díaz", "7654321")).unwrap();

        let changes = PatientPatch {
            dni: Some("12345678".into()),
            ..PatientPatch::default()
        };
        let err = db.update_by_id(&luis.id, &changes).unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::UniqueViolation);
    }
}
