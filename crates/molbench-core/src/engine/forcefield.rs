//! Force-field identifier resolution and the process-wide cache.
//!
//! An identifier resolves in a fixed order: an existing filesystem path wins,
//! then plugin directories are searched for `<id>.toml`, then the bundled
//! registry. Parsing is expensive relative to minimization, so resolved
//! force fields are cached per resolver for the life of the process; cache
//! hits are sub-millisecond and never invalidated.

use phf::phf_map;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::debug;

use super::error::EngineError;
use crate::core::forcefield::params::Forcefield;

static BUNDLED_FORCEFIELDS: phf::Map<&'static str, &'static str> = phf_map! {
    "mbff-1.0" => include_str!("../../assets/mbff-1.0.toml"),
    "mbff-2.0" => include_str!("../../assets/mbff-2.0.toml"),
};

/// A parameter set together with the identifier it resolved from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedForcefield {
    pub name: String,
    pub params: Forcefield,
}

pub struct ForcefieldResolver {
    plugin_dirs: Vec<PathBuf>,
    cache: RwLock<HashMap<String, Arc<ResolvedForcefield>>>,
}

impl ForcefieldResolver {
    pub fn new() -> Self {
        Self {
            plugin_dirs: Vec::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_plugin_dirs(plugin_dirs: Vec<PathBuf>) -> Self {
        Self {
            plugin_dirs,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn bundled_names() -> impl Iterator<Item = &'static str> {
        BUNDLED_FORCEFIELDS.keys().copied()
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<ResolvedForcefield>, EngineError> {
        if let Some(forcefield) = self
            .cache
            .read()
            .expect("force-field cache lock poisoned")
            .get(name)
        {
            return Ok(forcefield.clone());
        }

        let params = self.load_uncached(name)?;
        let forcefield = Arc::new(ResolvedForcefield {
            name: name.to_string(),
            params,
        });
        self.cache
            .write()
            .expect("force-field cache lock poisoned")
            .insert(name.to_string(), forcefield.clone());
        Ok(forcefield)
    }

    fn load_uncached(&self, name: &str) -> Result<Forcefield, EngineError> {
        let as_path = Path::new(name);
        if as_path.is_file() {
            debug!(name, "Loading force field from filesystem path.");
            return Forcefield::load(as_path).map_err(|e| EngineError::ForcefieldLoad {
                name: name.to_string(),
                source: e,
            });
        }

        for dir in &self.plugin_dirs {
            let candidate = dir.join(format!("{name}.toml"));
            if candidate.is_file() {
                debug!(name, dir = %dir.display(), "Loading force field from plugin directory.");
                return Forcefield::load(&candidate).map_err(|e| EngineError::ForcefieldLoad {
                    name: name.to_string(),
                    source: e,
                });
            }
        }

        if let Some(content) = BUNDLED_FORCEFIELDS.get(name) {
            debug!(name, "Loading bundled force field.");
            return Forcefield::from_toml_str(content, name).map_err(|e| {
                EngineError::ForcefieldLoad {
                    name: name.to_string(),
                    source: e,
                }
            });
        }

        Err(EngineError::UnknownForcefield {
            name: name.to_string(),
        })
    }
}

impl Default for ForcefieldResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Instant;
    use tempfile::tempdir;

    #[test]
    fn bundled_force_fields_parse() {
        let resolver = ForcefieldResolver::new();
        for name in ForcefieldResolver::bundled_names() {
            let forcefield = resolver.resolve(name).unwrap();
            assert!(!forcefield.params.vdw.is_empty());
            assert!(!forcefield.params.bonds.is_empty());
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let resolver = ForcefieldResolver::new();
        assert!(matches!(
            resolver.resolve("mbff-99.0"),
            Err(EngineError::UnknownForcefield { .. })
        ));
    }

    #[test]
    fn filesystem_path_takes_precedence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            "[vdw.H]\nradius = 1.0\nwell_depth = 0.5\n[bonds.\"H-H\"]\nlength = 0.74\nforce_constant = 100.0\n",
        )
        .unwrap();

        let resolver = ForcefieldResolver::new();
        let forcefield = resolver.resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(forcefield.params.vdw.len(), 1);
    }

    #[test]
    fn plugin_directory_is_searched_by_name() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("plugin-ff.toml"),
            "[vdw.H]\nradius = 1.0\nwell_depth = 0.5\n[bonds]\n",
        )
        .unwrap();

        let resolver = ForcefieldResolver::with_plugin_dirs(vec![dir.path().to_path_buf()]);
        assert!(resolver.resolve("plugin-ff").is_ok());
        assert!(matches!(
            ForcefieldResolver::new().resolve("plugin-ff"),
            Err(EngineError::UnknownForcefield { .. })
        ));
    }

    #[test]
    fn repeated_resolution_hits_the_cache() {
        let resolver = ForcefieldResolver::new();
        let first = resolver.resolve("mbff-1.0").unwrap();

        let start = Instant::now();
        for _ in 0..1000 {
            let hit = resolver.resolve("mbff-1.0").unwrap();
            assert!(Arc::ptr_eq(&first, &hit));
        }
        // 1000 cache hits must complete in well under a second.
        assert!(start.elapsed().as_secs_f64() < 1.0);
    }
}
