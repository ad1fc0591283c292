//! Chemical identity and canonicalization.
//!
//! This module owns the structure graph, the mapped structural string parser,
//! and the canonical identity machinery (structural keys, canonical atom
//! orders, atom-map permutations). The cheminformatics capability is exposed
//! behind the [`StructureToolkit`](toolkit::StructureToolkit) trait so the
//! pipeline can be driven by an external toolkit or by the built-in
//! [`GraphToolkit`](toolkit::GraphToolkit).

pub mod identity;
pub mod parse;
pub mod structure;
pub mod toolkit;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChemError {
    #[error("Malformed structure '{input}': {message}")]
    MalformedStructure { input: String, message: String },

    #[error(
        "Structures are not isomorphic (canonical key {reference_key} vs {other_key})"
    )]
    StructureMismatch {
        reference_key: String,
        other_key: String,
    },
}
