use std::time::Instant;

use terrane_block::{Block, ModState, Sector};
use terrane_edit::{MapEditEvent, MapEditKind};
use terrane_geom::{V2, V3, VoxelArea};
use terrane_lighting::update_all_lighting;
use terrane_mapgen::BlockMakeData;
use terrane_store::{Table, sector_key};
use terrane_voxel::{BlockSet, ManualVoxelBuffer};
use terrane_world::{BLOCK_LIMIT, WorldError, block_over_limit};

use crate::{Map, MapError};

fn halo(bp: V3) -> VoxelArea {
    VoxelArea::new(bp - V3::ONE, bp + V3::ONE)
}

impl Map {
    /// Sector at `p2d`, loaded with its stored metadata or created fresh.
    pub fn create_sector(&mut self, p2d: V2) -> Result<&mut Sector, MapError> {
        if self.world.get_sector(p2d).is_none() {
            if p2d.x < -BLOCK_LIMIT || p2d.x > BLOCK_LIMIT || p2d.z < -BLOCK_LIMIT || p2d.z > BLOCK_LIMIT {
                return Err(WorldError::OverLimit(p2d.with_y(0)).into());
            }
            if self.store.get(Table::SectorsMeta, sector_key(p2d))?.is_some() {
                self.load_sector_meta(p2d)?;
            }
        }
        Ok(self.world.create_sector(p2d)?)
    }

    /// Blank block at `bp` (undummifying a placeholder). Existing blocks are
    /// returned unchanged.
    pub fn create_block(&mut self, bp: V3) -> Result<&mut Block, MapError> {
        if block_over_limit(bp) {
            return Err(WorldError::OverLimit(bp).into());
        }
        self.create_sector(bp.xz())?;
        Ok(self.world.create_block(bp)?)
    }

    /// Make the block at `bp` available: from memory, then the store, then (if
    /// allowed) the generator. With `allow_generate`, a block that exists but was
    /// never generated (a halo left by a neighbour) is generated too. Returns
    /// whether it is now loaded.
    pub fn emerge_block(&mut self, bp: V3, allow_generate: bool) -> Result<bool, MapError> {
        let in_memory = self.world.get_block(bp).is_some_and(|b| !b.is_dummy());
        let available = in_memory || self.load_block(bp)?;
        if available {
            let Some(b) = self.world.get_block_mut(bp) else {
                return Ok(false);
            };
            b.reset_usage_timer();
            if !allow_generate || b.is_generated() {
                return Ok(true);
            }
        }
        if allow_generate {
            let mut modified = BlockSet::new();
            if self.generate_block(bp, &mut modified)? {
                let event = MapEditEvent::new(MapEditKind::Other, bp).with_blocks(modified);
                self.receivers.dispatch(&event);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Run the generator for `bp` on this thread and merge the result.
    pub fn generate_block(&mut self, bp: V3, modified: &mut BlockSet) -> Result<bool, MapError> {
        if block_over_limit(bp) {
            log::info!(target: "mapgen", "generate_block: {} over limit", bp);
            return Err(WorldError::OverLimit(bp).into());
        }
        let start = Instant::now();
        let mut data = self.init_block_make(bp)?;
        self.generator.make_block(&mut data, &*self.defs);
        if self.cfg.mapgen_debug_info {
            log::info!(target: "mapgen", "make_block {} took {:?}", bp, start.elapsed());
        }
        self.finish_block_make(data, modified)?;
        Ok(self.world.real_block(bp).is_ok())
    }

    /// Load or create the 3x3x3 blocks around `bp` and copy them into a fresh
    /// make-data buffer. Over-limit halos produce a no-op.
    pub fn init_block_make(&mut self, bp: V3) -> Result<BlockMakeData, MapError> {
        if self.cfg.mapgen_debug_info {
            log::info!(target: "mapgen", "init_block_make {}", bp);
        }
        if block_over_limit(bp - V3::ONE) || block_over_limit(bp + V3::ONE) {
            return Ok(BlockMakeData::no_op(bp));
        }
        for p in halo(bp).iter() {
            if !self.emerge_block(p, false)? {
                let underground = self.generator.block_is_underground(self.seed, p);
                self.create_block(p)?.set_is_underground(underground);
            }
            if let Some(b) = self.world.get_block_mut(p) {
                b.set_lighting_expired(true);
            }
        }
        let mut vmanip = ManualVoxelBuffer::new();
        vmanip.initial_emerge(&self.world, bp - V3::ONE, bp + V3::ONE);
        Ok(BlockMakeData {
            no_op: false,
            seed: self.seed,
            blockpos: bp,
            vmanip,
            ..BlockMakeData::default()
        })
    }

    /// Write generated data back, take over its liquid queue, light the centre
    /// block and mark everything touched as needing a write.
    pub fn finish_block_make(
        &mut self,
        mut data: BlockMakeData,
        changed: &mut BlockSet,
    ) -> Result<bool, MapError> {
        if data.no_op {
            return Ok(false);
        }
        let bp = data.blockpos;
        for p in halo(bp).iter() {
            self.emerge_block(p, false)?;
        }

        data.vmanip.blit_back_all(&mut self.world, changed);
        if self.cfg.mapgen_debug_info {
            log::info!(target: "mapgen", "finish_block_make {}: {} changed blocks", bp, changed.len());
        }

        self.transforming_liquid.append(&mut data.transforming_liquid);

        self.world.real_block(bp)?;

        let start = Instant::now();
        let mut batch = BlockSet::new();
        batch.insert(bp);
        update_all_lighting(&mut self.world, &*self.defs, &batch, changed);
        // The neighbours were only partly relit; treat them as current anyway.
        for p in halo(bp).iter() {
            if let Some(b) = self.world.get_block_mut(p) {
                b.set_lighting_expired(false);
            }
        }
        if self.cfg.mapgen_debug_info {
            log::info!(target: "mapgen", "lighting for {} took {:?}", bp, start.elapsed());
        }

        for p in changed.iter() {
            if let Some(b) = self.world.get_block_mut(*p) {
                b.update_day_night_diff(&*self.defs);
                b.raise_modified(ModState::WriteNeeded, "finish_block_make");
            }
        }

        self.world.real_block_mut(bp)?.set_generated(true);
        Ok(true)
    }

    /// Ground height estimate for node column `p2d`.
    pub fn find_ground_level(&self, p2d: V2) -> i32 {
        self.generator.find_ground_level(self.seed, p2d)
    }
}
