use rusqlite::{Connection, OptionalExtension, params};

use super::error::StoreError;

pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS db_info (
    version INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS general_provenance (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS software_provenance (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS molecules (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    structural_key   TEXT NOT NULL UNIQUE,
    mapped_structure TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS qm_conformers (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    molecule_id INTEGER NOT NULL REFERENCES molecules(id),
    source_id   INTEGER NOT NULL UNIQUE,
    coordinates BLOB NOT NULL,
    energy      REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS mm_conformers (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    molecule_id INTEGER NOT NULL REFERENCES molecules(id),
    source_id   INTEGER NOT NULL,
    force_field TEXT NOT NULL,
    coordinates BLOB NOT NULL,
    energy      REAL NOT NULL,
    UNIQUE(source_id, force_field)
);

CREATE INDEX IF NOT EXISTS idx_qm_conformers_molecule ON qm_conformers(molecule_id);
CREATE INDEX IF NOT EXISTS idx_mm_conformers_molecule ON mm_conformers(molecule_id);
CREATE INDEX IF NOT EXISTS idx_mm_conformers_force_field ON mm_conformers(force_field);
";

/// Creates any missing tables and seeds the schema version marker.
pub fn initialize(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO db_info (version) VALUES (?1)",
        params![SCHEMA_VERSION],
    )?;
    Ok(())
}

/// Reads the version marker and rejects stores this build cannot read.
pub fn check_version(conn: &Connection) -> Result<i64, StoreError> {
    let found: Option<i64> = conn
        .query_row("SELECT version FROM db_info", [], |row| row.get(0))
        .optional()?;
    match found {
        Some(found) if found == SCHEMA_VERSION => Ok(found),
        Some(found) => Err(StoreError::SchemaVersionMismatch {
            found,
            expected: SCHEMA_VERSION,
        }),
        None => Err(StoreError::SchemaVersionMismatch {
            found: 0,
            expected: SCHEMA_VERSION,
        }),
    }
}
