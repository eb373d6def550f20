use serde::Deserialize;

/// `[map]` table.
#[derive(Clone, Debug, Deserialize)]
pub struct MapConfig {
    /// Idle seconds after which a block is unloaded.
    #[serde(default = "default_unload_timeout")]
    pub unload_timeout_secs: f32,
    #[serde(default = "default_true")]
    pub save_before_unloading: bool,
    /// Used for new worlds; a random seed is drawn otherwise.
    #[serde(default)]
    pub fixed_map_seed: Option<u64>,
    #[serde(default = "default_liquid_loop_factor")]
    pub liquid_loop_factor: u32,
    #[serde(default)]
    pub mapgen_debug_info: bool,
}

fn default_unload_timeout() -> f32 {
    29.0
}
fn default_true() -> bool {
    true
}
fn default_liquid_loop_factor() -> u32 {
    terrane_liquid::DEFAULT_LOOP_FACTOR
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            unload_timeout_secs: default_unload_timeout(),
            save_before_unloading: true,
            fixed_map_seed: None,
            liquid_loop_factor: default_liquid_loop_factor(),
            mapgen_debug_info: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_keys() {
        let cfg: MapConfig = toml::from_str("fixed_map_seed = 42\n").unwrap();
        assert_eq!(cfg.fixed_map_seed, Some(42));
        assert_eq!(cfg.unload_timeout_secs, 29.0);
        assert!(cfg.save_before_unloading);
        assert_eq!(cfg.liquid_loop_factor, 3);
    }
}
