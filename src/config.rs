use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use terrane_map::MapConfig;
use terrane_mapgen::MapgenConfig;
use terrane_runtime::RuntimeConfig;

pub const CONFIG_FILE: &str = "terrane.toml";

/// Contents of `terrane.toml`; every table is optional.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub mapgen: MapgenConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Content definitions; the builtin set when absent. Relative to the config file.
    #[serde(default)]
    pub nodes: Option<PathBuf>,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("read error for {}: {}", path.display(), e))?;
        let mut cfg = Self::from_toml_str(&text)
            .map_err(|e| format!("parse error in {}: {}", path.display(), e))?;
        if let (Some(nodes), Some(dir)) = (cfg.nodes.as_mut(), path.parent()) {
            if nodes.is_relative() {
                *nodes = dir.join(&*nodes);
            }
        }
        Ok(cfg)
    }

    /// `explicit` if given, else `<world>/terrane.toml` when it exists, else defaults.
    pub fn resolve(explicit: Option<&Path>, world: &Path) -> Result<Self, Box<dyn Error>> {
        match explicit {
            Some(p) => Self::load(p),
            None => {
                let p = world.join(CONFIG_FILE);
                if p.exists() { Self::load(&p) } else { Ok(Self::default()) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrane_content::{ContentDefs, ContentRegistry};
    use terrane_mapgen::MapgenKind;

    #[test]
    fn sample_config_parses() {
        let cfg = Config::from_toml_str(include_str!("../terrane.toml")).unwrap();
        assert_eq!(cfg.map.unload_timeout_secs, 29.0);
        assert_eq!(cfg.mapgen.kind, MapgenKind::Noise);
        assert_eq!(cfg.runtime.tick_ms, 100);
        assert_eq!(cfg.nodes.as_deref(), Some(Path::new("nodes.toml")));
    }

    #[test]
    fn missing_tables_default() {
        let cfg = Config::from_toml_str("[mapgen]\nkind = \"flat\"\n").unwrap();
        assert_eq!(cfg.mapgen.kind, MapgenKind::Flat);
        assert!(cfg.map.save_before_unloading);
        assert!(cfg.nodes.is_none());
    }

    #[test]
    fn sample_nodes_load() {
        let reg = ContentRegistry::from_toml_str(include_str!("../nodes.toml")).unwrap();
        assert!(reg.id_by_name("mese_lamp").is_some());
        assert!(reg.id_by_name("stone").is_some());
    }

    #[test]
    fn nodes_path_is_relative_to_the_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "nodes = \"defs/nodes.toml\"\n").unwrap();
        let cfg = Config::resolve(None, dir.path()).unwrap();
        assert_eq!(cfg.nodes, Some(dir.path().join("defs/nodes.toml")));
    }
}
