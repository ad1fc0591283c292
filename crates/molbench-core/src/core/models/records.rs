//! Record types owned by the molecule store.
//!
//! Stored records carry the surrogate molecule id assigned by the store; the
//! `New*` forms are what callers hand in before that id exists, each carrying
//! the structural key the store deduplicates on.

use super::coordinates::Coordinates;
use crate::core::chem::identity::StructuralKey;

/// A deduplicated chemical structure, one row per distinct structural key.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeRecord {
    pub id: i64,
    pub structural_key: StructuralKey,
    pub mapped_structure: String,
}

/// One QM reference geometry for a molecule. Coordinates Å, energy kcal/mol.
#[derive(Debug, Clone, PartialEq)]
pub struct QmConformerRecord {
    pub molecule_id: i64,
    pub source_id: i64,
    pub coordinates: Coordinates,
    pub energy: f64,
}

/// One MM-minimized geometry for a (molecule, force field) pair, derived from
/// the QM conformer with the same source id.
#[derive(Debug, Clone, PartialEq)]
pub struct MmConformerRecord {
    pub molecule_id: i64,
    pub source_id: i64,
    pub force_field: String,
    pub coordinates: Coordinates,
    pub energy: f64,
}

/// A QM conformer before molecule-id resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQmConformer {
    pub structural_key: StructuralKey,
    pub mapped_structure: String,
    pub source_id: i64,
    pub coordinates: Coordinates,
    pub energy: f64,
}

/// An MM conformer before molecule-id resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMmConformer {
    pub structural_key: StructuralKey,
    pub mapped_structure: String,
    pub source_id: i64,
    pub force_field: String,
    pub coordinates: Coordinates,
    pub energy: f64,
}

/// Either kind of appendable conformer record; the store resolves (or
/// creates) the owning molecule row from the structural key.
#[derive(Debug, Clone, PartialEq)]
pub enum NewRecord {
    Qm(NewQmConformer),
    Mm(NewMmConformer),
}

impl NewRecord {
    pub fn structural_key(&self) -> &StructuralKey {
        match self {
            NewRecord::Qm(record) => &record.structural_key,
            NewRecord::Mm(record) => &record.structural_key,
        }
    }

    pub fn mapped_structure(&self) -> &str {
        match self {
            NewRecord::Qm(record) => &record.mapped_structure,
            NewRecord::Mm(record) => &record.mapped_structure,
        }
    }
}
