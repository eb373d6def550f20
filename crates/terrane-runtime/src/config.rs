use serde::Deserialize;

/// `[runtime]` table.
#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    /// Interval between liquid/unload passes.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Generation threads; 0 lets rayon pick.
    #[serde(default)]
    pub gen_workers: usize,
}

fn default_tick_ms() -> u64 {
    100
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            gen_workers: 0,
        }
    }
}
