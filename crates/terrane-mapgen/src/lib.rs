//! Block generation: make-data handed to generators, and the generators themselves.
#![forbid(unsafe_code)]

mod config;
mod flat;
mod noise;
mod palette;

pub use config::{MapgenConfig, MapgenKind};
pub use flat::FlatGenerator;
pub use noise::NoiseGenerator;
pub use palette::Palette;

use terrane_block::MAP_BLOCKSIZE;
use terrane_content::ContentDefs;
use terrane_geom::{V2, V3};
use terrane_liquid::UniqueQueue;
use terrane_voxel::ManualVoxelBuffer;

/// Everything a generator needs to fill one block, detached from the map.
///
/// `vmanip` covers the target block and its 26 neighbours. Generators write
/// through it and queue liquid positions that need settling.
#[derive(Clone, Debug, Default)]
pub struct BlockMakeData {
    /// Set when the halo crosses the generation limit; nothing is generated.
    pub no_op: bool,
    pub seed: u64,
    pub blockpos: V3,
    pub vmanip: ManualVoxelBuffer,
    pub transforming_liquid: UniqueQueue<V3>,
}

impl BlockMakeData {
    pub fn no_op(blockpos: V3) -> Self {
        Self { no_op: true, blockpos, ..Self::default() }
    }
}

pub trait MapGenerator: Send + Sync {
    /// Fill `data.blockpos` inside `data.vmanip`.
    fn make_block(&self, data: &mut BlockMakeData, defs: &dyn ContentDefs);

    /// Estimated surface height of the node column at `p2d`.
    fn find_ground_level(&self, seed: u64, p2d: V2) -> i32;

    /// Blocks entirely below the lowest ground level of their sector get no sunlight.
    fn block_is_underground(&self, seed: u64, bp: V3) -> bool {
        let top = bp.y * MAP_BLOCKSIZE + MAP_BLOCKSIZE;
        top <= sector_minimum_ground_level(self, seed, V2::new(bp.x, bp.z))
    }
}

/// Lowest sampled ground level over a sector's corners and centre.
pub fn sector_minimum_ground_level<G: MapGenerator + ?Sized>(g: &G, seed: u64, sp: V2) -> i32 {
    let x0 = sp.x * MAP_BLOCKSIZE;
    let z0 = sp.z * MAP_BLOCKSIZE;
    let s = MAP_BLOCKSIZE - 1;
    [(0, 0), (s, 0), (0, s), (s, s), (s / 2, s / 2)]
        .into_iter()
        .map(|(dx, dz)| g.find_ground_level(seed, V2::new(x0 + dx, z0 + dz)))
        .min()
        .unwrap_or(0)
}
