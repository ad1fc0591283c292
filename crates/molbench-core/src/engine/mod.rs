//! # Engine Module
//!
//! The minimization pipeline: force-field resolution with a process-wide
//! cache, the per-conformer minimization worker, and the batch orchestrator
//! that fans work out across a bounded thread pool and aggregates results
//! deterministically.
//!
//! ## Architecture
//!
//! - **Force-field Resolution** ([`forcefield`]) - identifier resolution
//!   (path, plugin directory, bundled registry) and the lazy per-process cache
//! - **Energy Backend** ([`backend`]) - the physics-engine seam and the
//!   built-in steepest-descent reference backend
//! - **Worker** ([`minimize`]) - canonical-order remapping, system build,
//!   bounded minimization, unit normalization
//! - **Orchestrator** ([`batch`]) - bounded-pool fan-out, completion-order
//!   tolerant aggregation, per-item failure isolation
//! - **Progress Monitoring** ([`progress`]) - progress reporting callbacks
//! - **Error Handling** ([`error`]) - engine-specific error types

pub mod backend;
pub mod batch;
pub mod error;
pub mod forcefield;
pub mod minimize;
pub mod progress;
