//! # Molbench Core Library
//!
//! A library for benchmarking molecular-mechanics force fields against
//! quantum-mechanical reference data: it minimizes stored QM conformers under
//! classical force fields and keeps both sides in a queryable, deduplicated
//! single-file store.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict layered architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless building blocks: the
//!   structure graph and its canonical identity ([`core::chem`]), conformer
//!   record models and ingestion collections ([`core::models`]), unit
//!   conversion constants, and force-field parameter sets.
//!
//! - **[`engine`]: The Logic Core.** This layer runs the minimization
//!   pipeline: force-field resolution with process-wide caching, the
//!   per-conformer minimization worker, and the batch orchestrator that fans
//!   work out across a bounded thread pool and aggregates results
//!   deterministically.
//!
//! - **[`storage`]: The Persistence Layer.** A SQLite-backed molecule store
//!   with structural deduplication, transactional mutation, and the full
//!   conformer/energy query surface.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It ties the `engine` and `storage` layers together to execute complete
//!   procedures, such as minimizing every stored QM conformer under a named
//!   force field.

pub mod core;
pub mod engine;
pub mod storage;
pub mod workflows;
