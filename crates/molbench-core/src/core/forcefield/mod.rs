//! Force-field parameter sets and potential functions.
//!
//! A force field is a TOML document of per-element van der Waals parameters
//! and per-element-pair bond-stretch parameters, in Ångström and kcal/mol.
//! Resolution of force-field identifiers (path, plugin directory, bundled
//! name) lives in the engine layer; this module only knows how to load and
//! evaluate a parameter set.

pub mod params;
pub mod potentials;
