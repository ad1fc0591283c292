use thiserror::Error;

use crate::core::chem::ChemError;
use crate::core::forcefield::params::ParamLoadError;
use crate::core::models::coordinates::CoordinateError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error(transparent)]
    Chem(#[from] ChemError),

    #[error(transparent)]
    Coordinates(#[from] CoordinateError),

    #[error("Unknown force field '{name}': not a file, not in any plugin directory, not bundled")]
    UnknownForcefield { name: String },

    #[error("Failed to load force field '{name}': {source}")]
    ForcefieldLoad {
        name: String,
        #[source]
        source: ParamLoadError,
    },

    #[error("Force field '{force_field}' has no {kind} parameters for '{key}'")]
    MissingParameter {
        force_field: String,
        kind: &'static str,
        key: String,
    },
}
