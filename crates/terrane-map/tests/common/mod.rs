#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use terrane_content::{ContentRegistry, Node};
use terrane_edit::EventLog;
use terrane_geom::{V3, VoxelArea};
use terrane_map::{BlockSet, Map, MapConfig};
use terrane_mapgen::FlatGenerator;
use terrane_store::{MemoryStore, Store};

pub const SEED: u64 = 42;

pub fn config() -> MapConfig {
    MapConfig { fixed_map_seed: Some(SEED), ..MapConfig::default() }
}

pub fn map_with_store(store: Box<dyn Store>) -> Map {
    Map::new(
        store,
        Arc::new(ContentRegistry::builtin()),
        Arc::new(FlatGenerator::new(4, -10)),
        config(),
    )
    .unwrap()
}

pub fn memory_map() -> Map {
    map_with_store(Box::new(MemoryStore::new()))
}

/// Fill every block in `bmin..=bmax` with `n`.
pub fn fill_blocks(map: &mut Map, bmin: V3, bmax: V3, n: Node, underground: bool) -> BlockSet {
    let mut out = BlockSet::new();
    for bp in VoxelArea::new(bmin, bmax).iter() {
        let b = map.world_mut().create_block(bp).unwrap();
        b.fill(n);
        b.set_is_underground(underground);
        out.insert(bp);
    }
    out
}

pub fn relight(map: &mut Map, blocks: &BlockSet) {
    let mut modified = BlockSet::new();
    map.update_lighting(blocks, &mut modified);
}

pub fn attach_log(map: &mut Map) -> Arc<Mutex<EventLog>> {
    let log = Arc::new(Mutex::new(EventLog::new()));
    map.add_event_receiver(Box::new(log.clone()));
    log
}

/// `param1` of every node in `bmin..=bmax` (node coordinates of whole blocks).
pub fn light_snapshot(map: &Map, bmin: V3, bmax: V3) -> Vec<u8> {
    let area = VoxelArea::new(bmin * 16, bmax * 16 + V3::splat(15));
    area.iter().map(|p| map.get_node(p).unwrap().param1).collect()
}
