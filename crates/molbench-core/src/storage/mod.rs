//! # Storage Module
//!
//! The molecule store: a single-file SQLite database of deduplicated
//! molecules, their QM reference conformers, and MM-minimized conformers per
//! force field.
//!
//! ## Architecture
//!
//! - **Schema** ([`schema`]) - table definitions, indexes, and the schema
//!   version marker checked on open
//! - **Session** ([`session`]) - the transaction scope every mutating call
//!   runs inside (rollback on any error, commit exactly once on success)
//! - **Store** ([`store`]) - ingestion with structural deduplication and the
//!   read-only query surface
//! - **Error Handling** ([`error`]) - store-specific error types
//!
//! The store is single-threaded by design: it assumes exclusive access to
//! the backing file and relies on SQLite's own transaction guarantees only.

pub mod error;
pub mod schema;
pub mod session;
pub mod store;
