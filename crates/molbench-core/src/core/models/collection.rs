//! The externally supplied QM result collection.
//!
//! A collection is a JSON document of finished QM optimizations: one entry
//! per conformer, carrying the externally assigned source id, the mapped
//! structural string, and the final geometry/energy in QM-native units
//! (Bohr / Hartree). Conversion to stored units happens at ingestion time.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON parsing error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QmResultEntry {
    /// Externally assigned, unique per conformer; the join key between QM
    /// and derived MM records.
    pub source_id: i64,
    pub mapped_structure: String,
    /// Final potential energy in Hartree.
    pub final_energy: f64,
    /// Flat `[x0, y0, z0, x1, ...]` geometry in Bohr.
    pub geometry: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QmResultCollection {
    pub entries: Vec<QmResultEntry>,
}

impl QmResultCollection {
    pub fn from_file(path: &Path) -> Result<Self, CollectionError> {
        let content = std::fs::read_to_string(path).map_err(|e| CollectionError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| CollectionError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
