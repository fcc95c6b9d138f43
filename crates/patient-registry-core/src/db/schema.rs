//! SQLite schema definition.

/// Complete database schema for the patient registry.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,                         -- hyphenated UUID
    full_name TEXT NOT NULL,
    dni TEXT NOT NULL,                           -- digits only
    birth_date TEXT NOT NULL,                    -- YYYY-MM-DD
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    is_active INTEGER NOT NULL DEFAULT 1,
    CONSTRAINT patients_dni_key UNIQUE (dni),
    CONSTRAINT patients_full_name_length CHECK (length(full_name) BETWEEN 2 AND 100),
    CONSTRAINT patients_dni_digits CHECK (length(dni) BETWEEN 7 AND 8 AND dni NOT GLOB '*[^0-9]*'),
    CONSTRAINT patients_is_active_flag CHECK (is_active IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_patients_created_at ON patients(created_at);
CREATE INDEX IF NOT EXISTS idx_patients_is_active ON patients(is_active);
"#;
