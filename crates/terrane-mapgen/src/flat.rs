use terrane_block::{MAP_BLOCKSIZE, block_origin};
use terrane_content::ContentDefs;
use terrane_geom::{V2, V3};

use crate::{BlockMakeData, MapGenerator, Palette};

/// Level ground at a fixed height.
#[derive(Copy, Clone, Debug)]
pub struct FlatGenerator {
    pub ground: i32,
    pub water_level: i32,
}

impl FlatGenerator {
    pub fn new(ground: i32, water_level: i32) -> Self {
        Self { ground, water_level }
    }
}

impl MapGenerator for FlatGenerator {
    fn make_block(&self, data: &mut BlockMakeData, defs: &dyn ContentDefs) {
        if data.no_op {
            return;
        }
        let palette = Palette::resolve(defs);
        let o = block_origin(data.blockpos);
        for z in 0..MAP_BLOCKSIZE {
            for x in 0..MAP_BLOCKSIZE {
                for y in 0..MAP_BLOCKSIZE {
                    let p = o + V3::new(x, y, z);
                    let n = palette.column_node(p.y, self.ground, self.water_level);
                    data.vmanip.set_node(p, n);
                }
            }
        }
    }

    fn find_ground_level(&self, _seed: u64, _p2d: V2) -> i32 {
        self.ground
    }
}
