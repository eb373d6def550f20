use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use terrane_block::{MAP_BLOCKSIZE, block_origin};
use terrane_content::ContentDefs;
use terrane_geom::{V2, V3};

use crate::{BlockMakeData, MapGenerator, MapgenConfig, Palette};

/// Heightmap terrain from fractal OpenSimplex noise, with water up to `water_level`.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    cfg: MapgenConfig,
}

#[inline]
fn noise_seed(seed: u64) -> i32 {
    (seed ^ (seed >> 32)) as i32
}

impl NoiseGenerator {
    pub fn new(cfg: MapgenConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &MapgenConfig {
        &self.cfg
    }

    fn height_noise(&self, seed: u64) -> FastNoiseLite {
        let mut n = FastNoiseLite::with_seed(noise_seed(seed));
        n.set_noise_type(Some(NoiseType::OpenSimplex2));
        n.set_fractal_type(Some(FractalType::FBm));
        n.set_fractal_octaves(Some(4));
        n.set_frequency(Some(self.cfg.frequency));
        n
    }

    fn ground_with(&self, noise: &FastNoiseLite, x: i32, z: i32) -> i32 {
        let h = noise.get_noise_2d(x as f32, z as f32);
        self.cfg.base_height + (h * self.cfg.height_amplitude).round() as i32
    }
}

impl MapGenerator for NoiseGenerator {
    fn make_block(&self, data: &mut BlockMakeData, defs: &dyn ContentDefs) {
        if data.no_op {
            return;
        }
        let palette = Palette::resolve(defs);
        let noise = self.height_noise(data.seed);
        let o = block_origin(data.blockpos);
        let water = self.cfg.water_level;
        let mut heights = [0i32; (MAP_BLOCKSIZE * MAP_BLOCKSIZE) as usize];
        for z in 0..MAP_BLOCKSIZE {
            for x in 0..MAP_BLOCKSIZE {
                heights[(z * MAP_BLOCKSIZE + x) as usize] = self.ground_with(&noise, o.x + x, o.z + z);
            }
        }
        let height_at = |x: i32, z: i32| -> i32 {
            if (0..MAP_BLOCKSIZE).contains(&x) && (0..MAP_BLOCKSIZE).contains(&z) {
                heights[(z * MAP_BLOCKSIZE + x) as usize]
            } else {
                self.ground_with(&noise, o.x + x, o.z + z)
            }
        };
        let mut queued = 0usize;
        for z in 0..MAP_BLOCKSIZE {
            for x in 0..MAP_BLOCKSIZE {
                let ground = height_at(x, z);
                for y in 0..MAP_BLOCKSIZE {
                    let p = o + V3::new(x, y, z);
                    let n = palette.column_node(p.y, ground, water);
                    data.vmanip.set_node(p, n);
                    // surface water on the shoreline
                    if n.content == palette.water && p.y == water {
                        let shore = [(1, 0), (-1, 0), (0, 1), (0, -1)]
                            .into_iter()
                            .any(|(dx, dz)| height_at(x + dx, z + dz) >= water);
                        if shore && data.transforming_liquid.push_back(p) {
                            queued += 1;
                        }
                    }
                }
            }
        }
        log::trace!(target: "mapgen", "made {} ({} liquid queued)", data.blockpos, queued);
    }

    fn find_ground_level(&self, seed: u64, p2d: V2) -> i32 {
        let noise = self.height_noise(seed);
        self.ground_with(&noise, p2d.x, p2d.z)
    }
}
