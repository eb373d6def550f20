use terrane_block::{ModState, NodeMetadata, block_origin, node_block_pos, node_rel_pos};
use terrane_edit::{MapEditEvent, MapEditKind};
use terrane_geom::V3;
use terrane_voxel::BlockSet;

use crate::{Map, MapError};

impl Map {
    /// Load the block holding `p` from the store if it is not in memory.
    fn ensure_meta_block(&mut self, p: V3, op: &str) -> Result<bool, MapError> {
        let bp = node_block_pos(p);
        if self.world.get_block(bp).is_some() {
            return Ok(true);
        }
        log::debug!(target: "map", "{}: need to emerge {}", op, bp);
        if self.emerge_block(bp, false)? {
            return Ok(true);
        }
        log::warn!(target: "map", "{}: block {} not found", op, bp);
        Ok(false)
    }

    pub fn node_metadata(&mut self, p: V3) -> Result<Option<&NodeMetadata>, MapError> {
        if !self.ensure_meta_block(p, "node_metadata")? {
            return Ok(None);
        }
        Ok(self
            .world
            .get_block(node_block_pos(p))
            .and_then(|b| b.metadata.get(node_rel_pos(p))))
    }

    /// Mutable access; call [`Map::node_metadata_changed`] after editing.
    pub fn node_metadata_mut(&mut self, p: V3) -> Result<Option<&mut NodeMetadata>, MapError> {
        if !self.ensure_meta_block(p, "node_metadata_mut")? {
            return Ok(None);
        }
        Ok(self
            .world
            .get_block_mut(node_block_pos(p))
            .and_then(|b| b.metadata.get_mut(node_rel_pos(p))))
    }

    /// Attach `meta` to the node at `p`, replacing any previous entry. False when
    /// the block is neither loaded nor stored.
    pub fn set_node_metadata(&mut self, p: V3, meta: NodeMetadata) -> Result<bool, MapError> {
        if !self.ensure_meta_block(p, "set_node_metadata")? {
            return Ok(false);
        }
        let Some(block) = self.world.get_block_mut(node_block_pos(p)) else {
            return Ok(false);
        };
        block.metadata.set(node_rel_pos(p), meta);
        block.raise_modified(ModState::WriteNeeded, "set_node_metadata");
        Ok(true)
    }

    /// Remove metadata at `p`; only blocks already in memory are touched.
    pub fn remove_node_metadata(&mut self, p: V3) -> Option<NodeMetadata> {
        let Some(block) = self.world.get_block_mut(node_block_pos(p)) else {
            log::warn!(target: "map", "remove_node_metadata: block {} not found", node_block_pos(p));
            return None;
        };
        let old = block.metadata.remove(node_rel_pos(p))?;
        block.raise_modified(ModState::WriteNeeded, "remove_node_metadata");
        Some(old)
    }

    /// Report an in-place metadata edit: notify receivers and schedule a write.
    pub fn node_metadata_changed(&mut self, p: V3) {
        let bp = node_block_pos(p);
        let event = MapEditEvent::new(MapEditKind::MetadataChanged, p).with_blocks([bp]);
        self.receivers.dispatch(&event);
        if let Some(block) = self.world.get_block_mut(bp) {
            block.raise_modified(ModState::WriteNeeded, "node_metadata_changed");
        }
    }

    /// Run `step` over the metadata of every loaded block. Blocks where it
    /// reported a change are marked for writing and returned.
    pub fn node_metadata_step<F>(&mut self, dtime: f32, mut step: F) -> BlockSet
    where
        F: FnMut(V3, &mut NodeMetadata, f32) -> bool,
    {
        let mut changed = BlockSet::new();
        for sector in self.world.sectors_mut() {
            for block in sector.blocks_mut() {
                let origin = block_origin(block.pos());
                let stepped = block
                    .metadata
                    .step(dtime, |rel, m, dt| step(origin + rel, m, dt));
                if stepped {
                    block.raise_modified(ModState::WriteNeeded, "node_metadata_step");
                    changed.insert(block.pos());
                }
            }
        }
        if !changed.is_empty() {
            log::debug!(target: "map", "node_metadata_step: {} blocks changed", changed.len());
        }
        changed
    }
}
