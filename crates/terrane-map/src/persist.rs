use std::collections::BTreeMap;

use terrane_block::{Block, ModState};
use terrane_geom::{V2, V3};
use terrane_store::{
    Store, StoreError, Table, block_key, key_to_block, legacy, sector_key,
};

use crate::{Map, MapError};

/// Counts from one [`Map::save`] pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveStats {
    pub sector_metas: u32,
    pub blocks: u32,
    pub blocks_in_memory: u32,
}

/// Write one block and mark it clean. Dummies are skipped (returns false).
pub(crate) fn write_block(store: &mut dyn Store, block: &mut Block) -> Result<bool, MapError> {
    if block.is_dummy() {
        return Ok(false);
    }
    let blob = block.to_blob()?;
    store.put(Table::Blocks, block_key(block.pos()), &blob)?;
    block.reset_modified();
    Ok(true)
}

impl Map {
    /// Write map metadata, dirty sector metadata, and every block modified at
    /// least to `level`. `ModState::Clean` writes everything.
    pub fn save(&mut self, level: ModState) -> Result<SaveStats, MapError> {
        let mut stats = SaveStats::default();
        if !self.saving_enabled {
            log::warn!(target: "map", "not saving map, saving disabled");
            return Ok(stats);
        }
        if level == ModState::Clean {
            log::info!(target: "map", "saving whole map, this can take time");
        }

        self.save_map_meta()?;

        let mut profile: BTreeMap<String, u32> = BTreeMap::new();
        let mut save_started = false;
        let store = &mut *self.store;
        for sector in self.world.sectors_mut() {
            if sector.differs_from_disk || level == ModState::Clean {
                store.put(Table::SectorsMeta, sector_key(sector.pos()), &sector.serialize_meta())?;
                sector.differs_from_disk = false;
                stats.sector_metas += 1;
            }
            for block in sector.blocks_mut() {
                stats.blocks_in_memory += 1;
                if block.modified() < level {
                    continue;
                }
                if !save_started {
                    store.begin()?;
                    save_started = true;
                }
                *profile.entry(block.modified_reason().to_string()).or_default() += 1;
                write_block(store, block)?;
                stats.blocks += 1;
            }
        }
        if save_started {
            store.commit()?;
        }

        if level == ModState::Clean || stats.sector_metas != 0 || stats.blocks != 0 {
            log::info!(
                target: "map",
                "written: {} sector metadata, {} blocks, {} blocks in memory",
                stats.sector_metas,
                stats.blocks,
                stats.blocks_in_memory
            );
            log::info!(target: "map", "blocks modified by: {:?}", profile);
        }
        Ok(stats)
    }

    /// Write a single loaded block regardless of its state.
    pub fn save_block(&mut self, bp: V3) -> Result<bool, MapError> {
        let store = &mut *self.store;
        match self.world.get_block_mut(bp) {
            Some(block) => write_block(store, block),
            None => Ok(false),
        }
    }

    /// Load the block at `bp` from the store. Returns false when the store has
    /// no entry, or the entry is unreadable (the position is left alone).
    pub fn load_block(&mut self, bp: V3) -> Result<bool, MapError> {
        let Some(blob) = self.store.get(Table::Blocks, block_key(bp))? else {
            return Ok(false);
        };
        self.create_sector(bp.xz())?;
        let mut block = Block::new_blank(bp);
        if let Err(e) = block.load_blob(&blob) {
            log::warn!(target: "map", "invalid block data in store at {}: {}", bp, e);
            return Ok(false);
        }
        block.reset_modified();
        self.world.insert_block(block)?;
        Ok(true)
    }

    /// Every block position with an entry in the store, sorted.
    pub fn list_all_loadable_blocks(&self) -> Result<Vec<V3>, MapError> {
        let mut out: Vec<V3> = self
            .store
            .list_keys(Table::Blocks)?
            .into_iter()
            .map(key_to_block)
            .collect();
        out.sort();
        Ok(out)
    }

    pub fn save_map_meta(&mut self) -> Result<(), MapError> {
        log::debug!(target: "map", "saving map metadata: seed={}", self.seed);
        self.store.put_meta("seed", &self.seed.to_string())?;
        Ok(())
    }

    /// Read the seed from the store, falling back to a legacy `map_meta.txt` when
    /// the stored value is missing or unreadable. A new store keeps the current
    /// seed when neither has one.
    pub fn load_map_meta(&mut self) -> Result<(), MapError> {
        let found = match self.store.get_meta("seed")? {
            Some(v) => parse_seed(&v).or_else(|e| {
                log::warn!(target: "map", "{}, trying legacy map_meta.txt", e);
                self.read_legacy_seed()
            }),
            None => self.read_legacy_seed(),
        };
        match found {
            Ok(seed) => self.seed = seed,
            Err(e) if self.store.is_new() => {
                log::debug!(target: "map", "no map metadata in new store ({})", e);
            }
            Err(e) => {
                log::error!(target: "map", "failed to load map metadata: {}", e);
                return Err(e.into());
            }
        }
        log::info!(target: "map", "map seed={}", self.seed);
        Ok(())
    }

    fn read_legacy_seed(&self) -> Result<u64, StoreError> {
        let dir = self
            .store
            .legacy_dir()
            .ok_or_else(|| StoreError::MapMeta("no seed stored".into()))?;
        let params = legacy::read_map_meta(dir)?;
        let seed = params
            .get("seed")
            .ok_or_else(|| StoreError::MapMeta("seed missing".into()))?;
        parse_seed(seed)
    }

    pub fn save_sector_meta(&mut self, p2d: V2) -> Result<bool, MapError> {
        let Some(sector) = self.world.get_sector_mut(p2d) else {
            return Ok(false);
        };
        self.store.put(Table::SectorsMeta, sector_key(p2d), &sector.serialize_meta())?;
        sector.differs_from_disk = false;
        Ok(true)
    }

    /// Bring sector `p2d` in sync with its stored metadata, creating it when
    /// missing. Returns false when the stored metadata is unreadable.
    pub fn load_sector_meta(&mut self, p2d: V2) -> Result<bool, MapError> {
        let data = self.store.get(Table::SectorsMeta, sector_key(p2d))?;
        let sector = self.world.create_sector(p2d)?;
        if let Some(bytes) = data {
            if let Err(e) = sector.deserialize_meta(&bytes) {
                log::warn!(target: "map", "invalid sector metadata at {}: {}", p2d, e);
                return Ok(false);
            }
        }
        sector.differs_from_disk = false;
        Ok(true)
    }
}

fn parse_seed(v: &str) -> Result<u64, StoreError> {
    v.trim()
        .parse()
        .map_err(|_| StoreError::MapMeta(format!("bad seed '{}'", v)))
}
