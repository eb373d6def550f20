mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use common::*;
use terrane_block::ModState;
use terrane_content::{ContentRegistry, Node, builtin};
use terrane_geom::{V2, V3};
use terrane_map::{BlockSet, Map};
use terrane_mapgen::FlatGenerator;
use terrane_store::{
    MemoryStore, SqliteStore, Store, StoreError, Table, block_key, sector_key,
};

fn open(dir: &std::path::Path, seed: Option<u64>) -> Map {
    let cfg = terrane_map::MapConfig { fixed_map_seed: seed, ..terrane_map::MapConfig::default() };
    Map::open(
        dir,
        Arc::new(ContentRegistry::builtin()),
        Arc::new(FlatGenerator::new(4, -10)),
        cfg,
    )
    .unwrap()
}

#[test]
fn save_writes_only_blocks_at_or_above_level() {
    let mut map = memory_map();
    fill_blocks(&mut map, V3::ZERO, V3::new(0, 1, 0), Node::AIR, false);
    map.world_mut()
        .get_block_mut(V3::ZERO)
        .unwrap()
        .raise_modified(ModState::WriteNeeded, "test");
    map.world_mut()
        .get_block_mut(V3::new(0, 1, 0))
        .unwrap()
        .reset_modified();

    let stats = map.save(ModState::WriteNeeded).unwrap();
    assert_eq!(stats.blocks, 1);
    assert_eq!(stats.blocks_in_memory, 2);
    assert!(map.store().get(Table::Blocks, block_key(V3::ZERO)).unwrap().is_some());
    assert!(map.store().get(Table::Blocks, block_key(V3::new(0, 1, 0))).unwrap().is_none());
    assert_eq!(map.world().get_block(V3::ZERO).unwrap().modified(), ModState::Clean);
    assert_eq!(map.store().get_meta("seed").unwrap().as_deref(), Some("42"));

    let stats = map.save(ModState::Clean).unwrap();
    assert_eq!(stats.blocks, 2);
    assert_eq!(stats.sector_metas, 1);
}

#[test]
fn disabled_saving_writes_nothing() {
    let mut map = memory_map();
    fill_blocks(&mut map, V3::ZERO, V3::ZERO, Node::AIR, false);
    map.set_saving_enabled(false);
    assert_eq!(map.save(ModState::Clean).unwrap().blocks, 0);
    assert!(map.store().get_meta("seed").unwrap().is_none());
}

#[test]
fn idle_blocks_are_unloaded_and_written() {
    let mut map = memory_map();
    fill_blocks(&mut map, V3::ZERO, V3::new(0, 1, 0), Node::AIR, false);
    map.world_mut()
        .get_block_mut(V3::ZERO)
        .unwrap()
        .raise_modified(ModState::WriteNeeded, "test");
    map.world_mut()
        .get_block_mut(V3::new(0, 1, 0))
        .unwrap()
        .reset_modified();

    assert!(map.timer_update(1.0, 29.0).unwrap().is_empty());
    assert_eq!(map.world().block_count(), 2);

    let unloaded = map.timer_update(30.0, 29.0).unwrap();
    assert_eq!(unloaded.len(), 2);
    assert_eq!(map.world().block_count(), 0);
    assert!(map.world().get_sector(V2::new(0, 0)).is_none());
    assert!(map.store().get(Table::Blocks, block_key(V3::ZERO)).unwrap().is_some());
    assert!(map.store().get(Table::Blocks, block_key(V3::new(0, 1, 0))).unwrap().is_none());
    // The sector was new, so its metadata went out before it was dropped.
    assert!(map.store().get(Table::SectorsMeta, sector_key(V2::new(0, 0))).unwrap().is_some());
}

/// Memory store that refuses block writes at one key and counts commits.
struct FlakyStore {
    inner: MemoryStore,
    bad_key: i64,
    commits: Arc<AtomicU32>,
}

impl Store for FlakyStore {
    fn is_new(&self) -> bool {
        self.inner.is_new()
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        self.inner.begin()
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit()
    }

    fn put(&mut self, table: Table, key: i64, blob: &[u8]) -> Result<(), StoreError> {
        if table == Table::Blocks && key == self.bad_key {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.put(table, key, blob)
    }

    fn get(&self, table: Table, key: i64) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(table, key)
    }

    fn list_keys(&self, table: Table) -> Result<Vec<i64>, StoreError> {
        self.inner.list_keys(table)
    }

    fn put_meta(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.put_meta(key, value)
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get_meta(key)
    }
}

#[test]
fn failed_unload_write_still_commits_and_drops_empty_sectors() {
    let bad = V3::new(3, 0, 0);
    let commits = Arc::new(AtomicU32::new(0));
    let store = FlakyStore {
        inner: MemoryStore::new(),
        bad_key: block_key(bad),
        commits: commits.clone(),
    };
    let mut map = map_with_store(Box::new(store));
    fill_blocks(&mut map, V3::ZERO, V3::ZERO, Node::AIR, false);
    fill_blocks(&mut map, bad, bad, Node::AIR, false);
    fill_blocks(&mut map, V3::new(6, 0, 0), V3::new(6, 0, 0), Node::AIR, false);
    for bp in [V3::ZERO, bad] {
        map.world_mut()
            .get_block_mut(bp)
            .unwrap()
            .raise_modified(ModState::WriteNeeded, "test");
    }
    map.world_mut()
        .get_block_mut(V3::new(6, 0, 0))
        .unwrap()
        .reset_modified();

    assert!(map.timer_update(30.0, 29.0).is_err());
    assert_eq!(commits.load(Ordering::SeqCst), 1);
    assert!(map.store().get(Table::Blocks, block_key(V3::ZERO)).unwrap().is_some());
    assert!(map.world().get_sector(V2::new(0, 0)).is_none());
    assert!(map.world().get_sector(V2::new(6, 0)).is_none());
    // The block that could not be written is kept, still dirty.
    let kept = map.world().get_block(bad).unwrap();
    assert_eq!(kept.modified(), ModState::WriteNeeded);
    assert_eq!(map.world().block_count(), 1);
}

#[test]
fn recently_used_blocks_stay() {
    let mut map = memory_map();
    fill_blocks(&mut map, V3::ZERO, V3::new(1, 0, 0), Node::AIR, false);
    map.timer_update(20.0, 29.0).unwrap();
    assert!(map.emerge_block(V3::ZERO, false).unwrap());
    let unloaded = map.timer_update(20.0, 29.0).unwrap();
    assert_eq!(unloaded, vec![V3::new(1, 0, 0)]);
    assert!(map.world().get_block(V3::ZERO).is_some());
}

#[test]
fn unloaded_block_emerges_from_store() {
    let mut map = memory_map();
    fill_blocks(&mut map, V3::ZERO, V3::ZERO, Node::new(builtin::DIRT), true);
    map.world_mut()
        .get_block_mut(V3::ZERO)
        .unwrap()
        .raise_modified(ModState::WriteNeeded, "test");
    map.timer_update(30.0, 29.0).unwrap();
    assert!(map.world().get_block(V3::ZERO).is_none());

    assert!(map.emerge_block(V3::ZERO, false).unwrap());
    let b = map.world().get_block(V3::ZERO).unwrap();
    assert!(b.is_underground());
    assert_eq!(b.modified(), ModState::Clean);
    assert_eq!(map.get_node(V3::new(3, 3, 3)).unwrap().content, builtin::DIRT);
    assert_eq!(map.list_all_loadable_blocks().unwrap(), vec![V3::ZERO]);
}

#[test]
fn corrupt_blob_is_skipped() {
    let mut store = MemoryStore::new();
    terrane_store::Store::put(&mut store, Table::Blocks, block_key(V3::ZERO), b"\x00garbage").unwrap();
    let mut map = map_with_store(Box::new(store));
    assert!(!map.load_block(V3::ZERO).unwrap());
    assert!(!map.emerge_block(V3::ZERO, false).unwrap());
    assert!(map.world().get_block(V3::ZERO).is_none());
}

#[test]
fn world_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let seed;
    let blob;
    {
        let mut map = open(dir.path(), None);
        seed = map.seed();
        assert!(map.emerge_block(V3::ZERO, true).unwrap());
        let mut modified = BlockSet::new();
        map.add_node_and_update(V3::new(2, 2, 2), Node::new(builtin::CHEST), &mut modified)
            .unwrap();
        map.node_metadata_mut(V3::new(2, 2, 2))
            .unwrap()
            .unwrap()
            .set_string("owner", "sam");
        map.node_metadata_changed(V3::new(2, 2, 2));
        map.save(ModState::Clean).unwrap();
        blob = map.world().get_block(V3::ZERO).unwrap().to_blob().unwrap();
    }

    let mut map = open(dir.path(), Some(7));
    assert_eq!(map.seed(), seed);
    let stored = map.list_all_loadable_blocks().unwrap();
    assert_eq!(stored.len(), 27);
    assert!(stored.contains(&V3::new(-1, -1, -1)));
    assert!(map.emerge_block(V3::ZERO, false).unwrap());
    let b = map.world().get_block(V3::ZERO).unwrap();
    assert!(b.is_generated());
    assert_eq!(b.to_blob().unwrap(), blob);
    let meta = map.node_metadata(V3::new(2, 2, 2)).unwrap().unwrap();
    assert_eq!(meta.get_string("owner"), Some("sam"));
}

#[test]
fn legacy_seed_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("map_meta.txt"),
        "seed = 1234\n[end_of_params]\n",
    )
    .unwrap();
    let map = open(dir.path(), None);
    assert_eq!(map.seed(), 1234);
}

#[test]
fn unreadable_stored_seed_falls_back_to_legacy_file() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = SqliteStore::open(dir.path()).unwrap();
        store.put_meta("seed", "garbage").unwrap();
    }
    std::fs::write(dir.path().join("map_meta.txt"), "seed = 7\n[end_of_params]\n").unwrap();
    let map = open(dir.path(), None);
    assert_eq!(map.seed(), 7);
}

#[test]
fn reopened_store_without_seed_is_an_error() {
    let store = MemoryStore::new().reopen();
    let r = Map::new(
        Box::new(store),
        Arc::new(ContentRegistry::builtin()),
        Arc::new(FlatGenerator::new(4, -10)),
        config(),
    );
    assert!(r.is_err());
}
