//! The cheminformatics capability seam.
//!
//! The minimization pipeline and the store never call the parser or the
//! canonicalization functions directly; they go through [`StructureToolkit`]
//! so an external toolkit (or a test stub) can be injected. [`GraphToolkit`]
//! is the built-in implementation backed by this crate's own graph machinery.

use super::ChemError;
use super::identity::{self, AtomMap, StructuralKey};
use super::parse;
use super::structure::Structure;

pub trait StructureToolkit: Send + Sync {
    /// Parses a mapped structural string into a structure graph whose atom
    /// order is the map-index order.
    fn parse_mapped(&self, mapped: &str) -> Result<Structure, ChemError>;

    /// Canonical, atom-order-insensitive key for a structure graph.
    fn canonical_key(&self, structure: &Structure) -> StructuralKey;

    /// Permutation from a structure's native atom order into canonical order.
    fn canonical_order(&self, structure: &Structure) -> AtomMap;

    /// Verifies two descriptions denote the same graph and returns the
    /// permutation taking `other`'s atom order onto `reference`'s.
    fn atom_map(&self, reference: &Structure, other: &Structure)
    -> Result<AtomMap, ChemError>;

    /// Convenience: parse and canonicalize in one step.
    fn key_for(&self, mapped: &str) -> Result<StructuralKey, ChemError> {
        Ok(self.canonical_key(&self.parse_mapped(mapped)?))
    }
}

/// Built-in toolkit over the crate's own structure graph.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphToolkit;

impl StructureToolkit for GraphToolkit {
    fn parse_mapped(&self, mapped: &str) -> Result<Structure, ChemError> {
        parse::parse_mapped(mapped)
    }

    fn canonical_key(&self, structure: &Structure) -> StructuralKey {
        identity::canonical_key(structure)
    }

    fn canonical_order(&self, structure: &Structure) -> AtomMap {
        identity::canonical_order(structure)
    }

    fn atom_map(
        &self,
        reference: &Structure,
        other: &Structure,
    ) -> Result<AtomMap, ChemError> {
        identity::atom_map(reference, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_for_combines_parse_and_canonicalize() {
        let toolkit = GraphToolkit;
        let key = toolkit.key_for("[O:1]([H:2])[H:3]").unwrap();
        assert_eq!(key, toolkit.key_for("[H:3][O:1][H:2]").unwrap());
    }

    #[test]
    fn key_for_propagates_parse_errors() {
        let toolkit = GraphToolkit;
        assert!(matches!(
            toolkit.key_for("not a structure"),
            Err(ChemError::MalformedStructure { .. })
        ));
    }
}
