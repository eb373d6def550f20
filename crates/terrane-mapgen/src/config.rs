use serde::Deserialize;

use crate::{FlatGenerator, MapGenerator, NoiseGenerator};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapgenKind {
    #[default]
    Noise,
    Flat,
}

/// `[mapgen]` table.
#[derive(Clone, Debug, Deserialize)]
pub struct MapgenConfig {
    #[serde(default)]
    pub kind: MapgenKind,
    #[serde(default = "default_water_level")]
    pub water_level: i32,
    #[serde(default = "default_base_height")]
    pub base_height: i32,
    #[serde(default = "default_height_amplitude")]
    pub height_amplitude: f32,
    #[serde(default = "default_frequency")]
    pub frequency: f32,
}

fn default_water_level() -> i32 {
    1
}
fn default_base_height() -> i32 {
    2
}
fn default_height_amplitude() -> f32 {
    20.0
}
fn default_frequency() -> f32 {
    0.008
}

impl Default for MapgenConfig {
    fn default() -> Self {
        Self {
            kind: MapgenKind::Noise,
            water_level: default_water_level(),
            base_height: default_base_height(),
            height_amplitude: default_height_amplitude(),
            frequency: default_frequency(),
        }
    }
}

impl MapgenConfig {
    pub fn build(&self) -> Box<dyn MapGenerator> {
        match self.kind {
            MapgenKind::Noise => Box::new(NoiseGenerator::new(self.clone())),
            MapgenKind::Flat => Box::new(FlatGenerator::new(self.base_height, self.water_level)),
        }
    }
}
