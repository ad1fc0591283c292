use std::path::PathBuf;
use thiserror::Error;

use crate::core::chem::ChemError;
use crate::core::models::coordinates::CoordinateError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(
        "Only paths to SQLite databases ending in '.sqlite' are supported. Given: {}", path.display()
    )]
    UnsupportedFiletype { path: PathBuf },

    #[error("Database '{}' already exists.", path.display())]
    DatabaseExists { path: PathBuf },

    #[error("Store schema version {found} is not supported (expected {expected})")]
    SchemaVersionMismatch { found: i64, expected: i64 },

    #[error("No conformer with source id {source_id}")]
    SourceNotFound { source_id: i64 },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Chem(#[from] ChemError),

    #[error(transparent)]
    Coordinates(#[from] CoordinateError),
}
