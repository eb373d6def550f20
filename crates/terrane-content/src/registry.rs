use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::builtin;
use crate::config::{NodeDef, NodesConfig};
use crate::features::{ContentDefs, ContentFeatures};
use crate::node::{CONTENT_AIR, CONTENT_IGNORE, ContentId, LIGHT_MAX};

/// Content id -> features table.
#[derive(Clone, Debug)]
pub struct ContentRegistry {
    features: Vec<Option<ContentFeatures>>,
    by_name: HashMap<String, ContentId>,
    unknown: ContentFeatures,
}

impl Default for ContentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRegistry {
    /// Registry holding only the reserved air/ignore entries.
    pub fn new() -> Self {
        let mut reg = Self {
            features: Vec::new(),
            by_name: HashMap::new(),
            unknown: ContentFeatures {
                name: "unknown".into(),
                ..ContentFeatures::default()
            },
        };
        for (id, f) in builtin::reserved() {
            reg.insert(id, f);
        }
        reg
    }

    /// Reserved entries plus the default node set.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        for (id, f) in builtin::features() {
            reg.insert(id, f);
        }
        reg
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: NodesConfig = toml::from_str(text)?;
        Self::from_configs(cfg)
    }

    pub fn from_configs(cfg: NodesConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = if cfg.extend_builtin.unwrap_or(false) {
            Self::builtin()
        } else {
            Self::new()
        };
        let mut seen = HashSet::new();
        for def in &cfg.nodes {
            if def.id == CONTENT_AIR || def.id == CONTENT_IGNORE {
                return Err(format!("content id {} is reserved ({})", def.id, def.name).into());
            }
            if !seen.insert(def.id) {
                return Err(format!("content id {} defined twice", def.id).into());
            }
            if let Some(f) = reg.features.get(def.id as usize).and_then(|f| f.as_ref()) {
                if f.name != def.name {
                    return Err(format!(
                        "content id {} assigned to both '{}' and '{}'",
                        def.id, f.name, def.name
                    )
                    .into());
                }
            }
            if let Some(&other) = reg.by_name.get(&def.name) {
                if other != def.id {
                    return Err(format!("content name '{}' registered twice", def.name).into());
                }
            }
            if def.light_source.unwrap_or(0) > LIGHT_MAX {
                return Err(format!(
                    "light_source {} of '{}' exceeds {}",
                    def.light_source.unwrap_or(0),
                    def.name,
                    LIGHT_MAX
                )
                .into());
            }
            // Names first so alternatives can refer forward
            reg.by_name.insert(def.name.clone(), def.id);
        }
        for def in &cfg.nodes {
            let f = reg.compile(def)?;
            reg.insert(def.id, f);
        }
        Ok(reg)
    }

    fn compile(&self, def: &NodeDef) -> Result<ContentFeatures, Box<dyn Error>> {
        let resolve = |name: &Option<String>| -> Result<ContentId, Box<dyn Error>> {
            match name {
                None => Ok(CONTENT_IGNORE),
                Some(n) => self.by_name.get(n).copied().ok_or_else(|| {
                    format!("'{}' refers to unknown liquid alternative '{}'", def.name, n).into()
                }),
            }
        };
        let base = ContentFeatures::default();
        Ok(ContentFeatures {
            name: def.name.clone(),
            param_type: def.param_type.unwrap_or(base.param_type),
            light_propagates: def.light_propagates.unwrap_or(base.light_propagates),
            sunlight_propagates: def.sunlight_propagates.unwrap_or(base.sunlight_propagates),
            light_source: def.light_source.unwrap_or(base.light_source),
            walkable: def.walkable.unwrap_or(base.walkable),
            liquid_type: def.liquid_type.unwrap_or(base.liquid_type),
            liquid_alternative_flowing: resolve(&def.liquid_alternative_flowing)?,
            liquid_alternative_source: resolve(&def.liquid_alternative_source)?,
            liquid_viscosity: def.liquid_viscosity.unwrap_or(base.liquid_viscosity),
            metadata_name: def.metadata_name.clone().filter(|s| !s.is_empty()),
        })
    }

    fn insert(&mut self, id: ContentId, f: ContentFeatures) {
        let idx = id as usize;
        if self.features.len() <= idx {
            self.features.resize(idx + 1, None);
        }
        self.by_name.insert(f.name.clone(), id);
        self.features[idx] = Some(f);
    }

    pub fn is_registered(&self, id: ContentId) -> bool {
        matches!(self.features.get(id as usize), Some(Some(_)))
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ContentId> + '_ {
        self.features
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_some())
            .map(|(i, _)| i as ContentId)
    }
}

impl ContentDefs for ContentRegistry {
    #[inline]
    fn get(&self, id: ContentId) -> &ContentFeatures {
        match self.features.get(id as usize) {
            Some(Some(f)) => f,
            _ => &self.unknown,
        }
    }

    fn id_by_name(&self, name: &str) -> Option<ContentId> {
        self.by_name.get(name).copied()
    }
}
