//! Data models for conformer records and ingestion collections.
//!
//! - [`coordinates`] - N×3 coordinate arrays with exact binary round-trip
//! - [`records`] - molecule / QM conformer / MM conformer records and the
//!   input forms accepted by the store
//! - [`collection`] - the externally supplied QM optimization-result
//!   collection format (QM-native units)

pub mod collection;
pub mod coordinates;
pub mod records;
