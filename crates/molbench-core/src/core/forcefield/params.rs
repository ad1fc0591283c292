use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Van der Waals parameters for one element, r-min convention.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct VdwParam {
    /// Half the minimum-energy separation of a like pair, Å; pair radii add.
    pub radius: f64,
    /// Depth of the well, kcal/mol.
    pub well_depth: f64,
}

/// Harmonic bond-stretch parameters for one element pair.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BondParam {
    /// Equilibrium bond length, Å.
    pub length: f64,
    /// Force constant, kcal/(mol·Å²).
    pub force_constant: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Forcefield {
    pub vdw: HashMap<String, VdwParam>,
    /// Keyed by `"A-B"` element pairs; lookups try both orientations.
    pub bonds: HashMap<String, BondParam>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

impl Forcefield {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content, &path.to_string_lossy())
    }

    /// Parses a parameter document; `origin` only labels error messages.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ParamLoadError> {
        toml::from_str(content).map_err(|e| ParamLoadError::Toml {
            path: origin.to_string(),
            source: e,
        })
    }

    pub fn vdw_param(&self, element: &str) -> Option<&VdwParam> {
        self.vdw.get(element)
    }

    pub fn bond_param(&self, element_a: &str, element_b: &str) -> Option<&BondParam> {
        self.bonds
            .get(&format!("{element_a}-{element_b}"))
            .or_else(|| self.bonds.get(&format!("{element_b}-{element_a}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
[vdw.C]
radius = 1.908
well_depth = 0.1094

[vdw.H]
radius = 1.487
well_depth = 0.0157

[bonds."C-C"]
length = 1.526
force_constant = 310.0

[bonds."C-H"]
length = 1.090
force_constant = 340.0
"#;

    #[test]
    fn load_succeeds_with_valid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ff.toml");
        fs::write(&path, SAMPLE).unwrap();

        let ff = Forcefield::load(&path).unwrap();
        assert_eq!(
            ff.vdw_param("C"),
            Some(&VdwParam {
                radius: 1.908,
                well_depth: 0.1094
            })
        );
        assert!(ff.vdw_param("Xx").is_none());
    }

    #[test]
    fn bond_lookup_is_orientation_insensitive() {
        let ff = Forcefield::from_toml_str(SAMPLE, "inline").unwrap();
        assert_eq!(ff.bond_param("C", "H"), ff.bond_param("H", "C"));
        assert!(ff.bond_param("C", "H").is_some());
        assert!(ff.bond_param("N", "O").is_none());
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = Forcefield::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ParamLoadError::Io { .. })));
    }

    #[test]
    fn load_fails_for_malformed_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "this is not toml").unwrap();
        let result = Forcefield::load(&path);
        assert!(matches!(result, Err(ParamLoadError::Toml { .. })));
    }
}
