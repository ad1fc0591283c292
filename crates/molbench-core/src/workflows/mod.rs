//! # Workflows Module
//!
//! The highest-level, user-facing layer: complete procedures that tie the
//! engine and storage layers together. Currently one workflow,
//! [`minimize`], which minimizes every stored QM conformer under a named
//! force field and writes the MM records back to the store.

pub mod minimize;
