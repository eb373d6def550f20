use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use terrane_block::{ModState, node_block_pos};
use terrane_content::{CONTENT_AIR, CONTENT_IGNORE, ContentDefs, LIGHT_SUN, LightBank, Node};
use terrane_edit::{EventReceivers, MapEditEvent, MapEditKind, MapEventReceiver, ReceiverId};
use terrane_geom::{FACE_DIRS, V2, V3};
use terrane_lighting::{
    LightSources, brightest_neighbour, light_neighbors, propagate_sunlight, spread_light,
    un_light_neighbors, update_all_lighting,
};
use terrane_liquid::{LiquidStats, UniqueQueue, transform_liquids};
use terrane_mapgen::MapGenerator;
use terrane_store::{SqliteStore, Store};
use terrane_voxel::BlockSet;
use terrane_world::{WorldError, WorldIndex};

use crate::persist::write_block;
use crate::{MapConfig, MapError};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MapStats {
    pub sectors: usize,
    pub blocks: usize,
    pub liquid_queue: usize,
    pub receivers: usize,
}

/// The world as seen by the rest of the server.
///
/// Owns the loaded blocks, the backing store, the liquid queue and the edit
/// observers. All mutation goes through `&mut self`, so one thread drives it.
pub struct Map {
    pub(crate) world: WorldIndex,
    pub(crate) defs: Arc<dyn ContentDefs>,
    pub(crate) store: Box<dyn Store>,
    pub(crate) generator: Arc<dyn MapGenerator>,
    pub(crate) receivers: EventReceivers,
    pub(crate) transforming_liquid: UniqueQueue<V3>,
    pub(crate) seed: u64,
    pub(crate) cfg: MapConfig,
    pub(crate) saving_enabled: bool,
}

impl Map {
    /// Wrap `store`, reading its map metadata. An existing store whose metadata
    /// cannot be read is an error.
    pub fn new(
        store: Box<dyn Store>,
        defs: Arc<dyn ContentDefs>,
        generator: Arc<dyn MapGenerator>,
        cfg: MapConfig,
    ) -> Result<Self, MapError> {
        let seed = cfg.fixed_map_seed.unwrap_or_else(rand::random);
        let mut map = Self {
            world: WorldIndex::new(),
            defs,
            store,
            generator,
            receivers: EventReceivers::new(),
            transforming_liquid: UniqueQueue::new(),
            seed,
            cfg,
            saving_enabled: false,
        };
        map.load_map_meta()?;
        map.saving_enabled = true;
        Ok(map)
    }

    /// Open (or create) the SQLite world in `dir`.
    pub fn open(
        dir: &Path,
        defs: Arc<dyn ContentDefs>,
        generator: Arc<dyn MapGenerator>,
        cfg: MapConfig,
    ) -> Result<Self, MapError> {
        let store = SqliteStore::open(dir)?;
        Self::new(Box::new(store), defs, generator, cfg)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &MapConfig {
        &self.cfg
    }

    pub fn defs(&self) -> &Arc<dyn ContentDefs> {
        &self.defs
    }

    pub fn generator(&self) -> &Arc<dyn MapGenerator> {
        &self.generator
    }

    pub fn world(&self) -> &WorldIndex {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldIndex {
        &mut self.world
    }

    pub fn store(&self) -> &dyn Store {
        &*self.store
    }

    pub fn saving_enabled(&self) -> bool {
        self.saving_enabled
    }

    pub fn set_saving_enabled(&mut self, enabled: bool) {
        self.saving_enabled = enabled;
    }

    pub fn stats(&self) -> MapStats {
        MapStats {
            sectors: self.world.sector_count(),
            blocks: self.world.block_count(),
            liquid_queue: self.transforming_liquid.len(),
            receivers: self.receivers.len(),
        }
    }

    // ---- events ----

    pub fn add_event_receiver(&mut self, r: Box<dyn MapEventReceiver + Send>) -> ReceiverId {
        self.receivers.add(r)
    }

    pub fn remove_event_receiver(&mut self, id: ReceiverId) -> Option<Box<dyn MapEventReceiver + Send>> {
        self.receivers.remove(id)
    }

    pub fn dispatch_event(&mut self, event: &MapEditEvent) {
        self.receivers.dispatch(event);
    }

    // ---- node access ----

    pub fn is_valid_position(&self, p: V3) -> bool {
        self.world.is_valid_position(p)
    }

    pub fn get_node(&self, p: V3) -> Result<Node, WorldError> {
        self.world.get_node(p)
    }

    /// Node at `p`, or IGNORE when its block is not loaded.
    pub fn get_node_or_ignore(&self, p: V3) -> Node {
        self.world.get_node(p).unwrap_or(Node::IGNORE)
    }

    /// Raw store of a node; no lighting or liquid upkeep.
    pub fn set_node(&mut self, p: V3, n: Node) -> Result<(), WorldError> {
        self.world.set_node(p, n)
    }

    pub fn is_node_underground(&self, p: V3) -> bool {
        self.world
            .get_block(node_block_pos(p))
            .is_some_and(|b| b.is_underground())
    }

    // ---- edits ----

    /// Place `n` at `p` and repair lighting around it. Every block whose nodes
    /// changed is added to `modified`.
    pub fn add_node_and_update(
        &mut self,
        p: V3,
        mut n: Node,
        modified: &mut BlockSet,
    ) -> Result<(), MapError> {
        if n.content == CONTENT_IGNORE {
            return Err(WorldError::IgnoreContent(p).into());
        }
        let defs = Arc::clone(&self.defs);
        let defs: &dyn ContentDefs = &*defs;

        let node_under_sunlight = match self.world.get_node(p + V3::UP) {
            Ok(top) => top.light(LightBank::Day, defs) == LIGHT_SUN,
            Err(_) => true,
        };

        let mut sources = LightSources::new();
        for bank in LightBank::ALL {
            let lightwas = self.world.get_node(p)?.light(bank, defs);
            modified.insert(node_block_pos(p));
            un_light_neighbors(&mut self.world, defs, bank, p, lightwas, &mut sources, modified);
            n.set_light(bank, 0, defs);
        }

        let f = defs.get(n.content);
        if node_under_sunlight && f.sunlight_propagates {
            n.set_light(LightBank::Day, LIGHT_SUN, defs);
        }

        self.world.set_node(p, n)?;
        if f.light_source > 0 {
            sources.insert(p);
        }

        match &f.metadata_name {
            Some(name) => {
                self.set_node_metadata(p, terrane_block::NodeMetadata::new(name.as_str()))?;
            }
            None => {
                self.remove_node_metadata(p);
            }
        }

        // The column below loses its sunlight.
        if node_under_sunlight && !f.sunlight_propagates {
            let mut y = p.y - 1;
            loop {
                let n2pos = V3::new(p.x, y, p.z);
                let Ok(mut n2) = self.world.get_node(n2pos) else {
                    break;
                };
                if n2.light(LightBank::Day, defs) != LIGHT_SUN {
                    break;
                }
                un_light_neighbors(
                    &mut self.world,
                    defs,
                    LightBank::Day,
                    n2pos,
                    LIGHT_SUN,
                    &mut sources,
                    modified,
                );
                n2.set_light(LightBank::Day, 0, defs);
                self.world.set_node(n2pos, n2)?;
                y -= 1;
            }
        }

        for bank in LightBank::ALL {
            spread_light(&mut self.world, defs, bank, sources.clone(), modified);
        }

        self.update_day_night_diffs(modified);

        // The node itself first, then its neighbours.
        self.queue_liquid_around(p, true);
        Ok(())
    }

    /// Replace the node at `p` with air and repair lighting around it.
    pub fn remove_node_and_update(&mut self, p: V3, modified: &mut BlockSet) -> Result<(), MapError> {
        let defs = Arc::clone(&self.defs);
        let defs: &dyn ContentDefs = &*defs;

        let node_under_sunlight = match self.world.get_node(p + V3::UP) {
            Ok(top) => top.light(LightBank::Day, defs) == LIGHT_SUN,
            Err(_) => true,
        };

        let mut sources = LightSources::new();
        for bank in LightBank::ALL {
            let lightwas = self.world.get_node(p)?.light(bank, defs);
            un_light_neighbors(&mut self.world, defs, bank, p, lightwas, &mut sources, modified);
        }

        self.remove_node_metadata(p);

        self.world.set_node(p, Node::new(CONTENT_AIR))?;

        for bank in LightBank::ALL {
            spread_light(&mut self.world, defs, bank, sources.clone(), modified);
        }

        modified.insert(node_block_pos(p));

        if node_under_sunlight {
            let ybottom = propagate_sunlight(&mut self.world, defs, p, modified);
            let mut y = p.y;
            while y >= ybottom {
                light_neighbors(&mut self.world, defs, LightBank::Day, V3::new(p.x, y, p.z), modified);
                y -= 1;
            }
        } else {
            let mut n = self.world.get_node(p)?;
            n.set_light(LightBank::Day, 0, defs);
            self.world.set_node(p, n)?;
        }

        for bank in LightBank::ALL {
            let n2p = brightest_neighbour(&self.world, defs, bank, p)?;
            light_neighbors(&mut self.world, defs, bank, n2p, modified);
        }

        self.update_day_night_diffs(modified);

        // The node itself goes last so it settles after its neighbours.
        self.queue_liquid_around(p, false);
        Ok(())
    }

    fn update_day_night_diffs(&mut self, blocks: &BlockSet) {
        for bp in blocks {
            if let Some(b) = self.world.get_block_mut(*bp) {
                b.update_day_night_diff(&*self.defs);
            }
        }
    }

    fn queue_liquid_around(&mut self, p: V3, self_first: bool) {
        let mut dirs: Vec<V3> = FACE_DIRS.to_vec();
        if self_first {
            dirs.insert(0, V3::ZERO);
        } else {
            dirs.push(V3::ZERO);
        }
        for d in dirs {
            let p2 = p + d;
            let Ok(n2) = self.world.get_node(p2) else {
                continue;
            };
            if self.defs.get(n2.content).is_liquid() || n2.content == CONTENT_AIR {
                self.transforming_liquid.push_back(p2);
            }
        }
    }

    /// [`Map::add_node_and_update`], reporting the outcome to every receiver.
    /// An unloaded position is a soft failure.
    pub fn add_node_with_event(&mut self, p: V3, n: Node) -> bool {
        let mut event = MapEditEvent::add_node(p, n);
        let mut modified = BlockSet::new();
        let r = self.add_node_and_update(p, n, &mut modified);
        let ok = report_edit(p, r);
        if ok {
            event.modified_blocks = modified;
        }
        self.receivers.dispatch(&event);
        ok
    }

    pub fn remove_node_with_event(&mut self, p: V3) -> bool {
        let mut event = MapEditEvent::new(MapEditKind::RemoveNode, p);
        let mut modified = BlockSet::new();
        let r = self.remove_node_and_update(p, &mut modified);
        let ok = report_edit(p, r);
        if ok {
            event.modified_blocks = modified;
        }
        self.receivers.dispatch(&event);
        ok
    }

    /// Whether the block or any face neighbour has differing day and night light.
    pub fn day_night_diffed(&self, bp: V3) -> bool {
        [
            V3::ZERO,
            V3::new(-1, 0, 0),
            V3::new(0, -1, 0),
            V3::new(0, 0, -1),
            V3::new(1, 0, 0),
            V3::new(0, 1, 0),
            V3::new(0, 0, 1),
        ]
        .into_iter()
        .any(|d| {
            self.world
                .get_block(bp + d)
                .is_some_and(|b| b.day_night_differs())
        })
    }

    pub fn update_lighting(&mut self, blocks: &BlockSet, modified: &mut BlockSet) {
        update_all_lighting(&mut self.world, &*self.defs, blocks, modified);
    }

    // ---- liquids ----

    pub fn queue_liquid(&mut self, p: V3) -> bool {
        self.transforming_liquid.push_back(p)
    }

    pub fn transforming_liquid(&self) -> &UniqueQueue<V3> {
        &self.transforming_liquid
    }

    pub fn transform_liquids(&mut self, modified: &mut BlockSet) -> LiquidStats {
        transform_liquids(
            &mut self.world,
            &*self.defs,
            &mut self.transforming_liquid,
            self.cfg.liquid_loop_factor,
            modified,
        )
    }

    // ---- unloading ----

    /// Age every block by `dtime`; blocks idle longer than `unload_timeout` are
    /// written (when modified and saving is on) and dropped. Sectors left empty
    /// are dropped too. Returns the unloaded block positions.
    ///
    /// A block that fails to write stays loaded. The pass still commits what was
    /// written and drops empty sectors before the first error is returned.
    pub fn timer_update(&mut self, dtime: f32, unload_timeout: f32) -> Result<Vec<V3>, MapError> {
        let save = self.cfg.save_before_unloading && self.saving_enabled;
        let mut profile: BTreeMap<String, u32> = BTreeMap::new();
        let mut unloaded = Vec::new();
        let mut empty_sectors: Vec<V2> = Vec::new();
        let mut saved = 0u32;
        let mut remaining = 0u32;
        let mut save_started = false;
        let mut failed: Option<MapError> = None;

        let store = &mut *self.store;
        for sp in self.world.sector_positions() {
            let Some(sector) = self.world.get_sector_mut(sp) else {
                continue;
            };
            let mut all_deleted = true;
            let ys: Vec<i32> = sector.block_positions().map(|bp| bp.y).collect();
            for y in ys {
                let Some(block) = sector.get_block_mut(y) else {
                    continue;
                };
                block.increment_usage_timer(dtime);
                if block.usage_timer() <= unload_timeout {
                    all_deleted = false;
                    remaining += 1;
                    continue;
                }
                let bp = block.pos();
                if save && block.modified() != ModState::Clean {
                    let reason = block.modified_reason().to_string();
                    let written = begin_once(store, &mut save_started)
                        .and_then(|()| write_block(store, block));
                    if let Err(e) = written {
                        log::warn!(target: "map", "could not write block {} before unloading: {}", bp, e);
                        failed.get_or_insert(e);
                        all_deleted = false;
                        remaining += 1;
                        continue;
                    }
                    *profile.entry(reason).or_default() += 1;
                    saved += 1;
                }
                sector.delete_block(y);
                unloaded.push(bp);
            }
            if all_deleted {
                if save && sector.differs_from_disk {
                    let meta = sector.serialize_meta();
                    let written = begin_once(store, &mut save_started).and_then(|()| {
                        store
                            .put(
                                terrane_store::Table::SectorsMeta,
                                terrane_store::sector_key(sp),
                                &meta,
                            )
                            .map_err(MapError::from)
                    });
                    if let Err(e) = written {
                        log::warn!(target: "map", "could not write sector metadata {}: {}", sp, e);
                        failed.get_or_insert(e);
                        continue;
                    }
                }
                empty_sectors.push(sp);
            }
        }
        if save_started {
            if let Err(e) = store.commit() {
                log::error!(target: "map", "commit after unloading failed: {}", e);
                failed.get_or_insert(e.into());
            }
        }

        for sp in empty_sectors {
            self.world.delete_sector(sp);
        }

        if !unloaded.is_empty() {
            if save {
                log::info!(
                    target: "map",
                    "unloaded {} blocks from memory, of which {} were written, {} blocks in memory",
                    unloaded.len(),
                    saved,
                    remaining
                );
            } else {
                log::info!(
                    target: "map",
                    "unloaded {} blocks from memory, {} blocks in memory",
                    unloaded.len(),
                    remaining
                );
            }
            if saved != 0 {
                log::info!(target: "map", "blocks modified by: {:?}", profile);
            }
        }
        match failed {
            Some(e) => Err(e),
            None => Ok(unloaded),
        }
    }
}

fn begin_once(store: &mut dyn Store, started: &mut bool) -> Result<(), MapError> {
    if !*started {
        store.begin()?;
        *started = true;
    }
    Ok(())
}

fn report_edit(p: V3, r: Result<(), MapError>) -> bool {
    match r {
        Ok(()) => true,
        Err(MapError::World(e)) => {
            log::debug!(target: "events", "edit at {} rejected: {}", p, e);
            false
        }
        Err(e) => {
            log::warn!(target: "events", "edit at {} failed: {}", p, e);
            false
        }
    }
}

impl Drop for Map {
    fn drop(&mut self) {
        if !self.saving_enabled {
            log::info!(target: "map", "map not saved");
            return;
        }
        match self.save(ModState::WriteAtUnload) {
            Ok(stats) => log::info!(target: "map", "saved map on close ({} blocks)", stats.blocks),
            Err(e) => log::error!(target: "map", "failed to save map on close: {}", e),
        }
    }
}
