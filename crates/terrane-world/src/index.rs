use std::cell::Cell;

use hashbrown::HashMap;
use terrane_block::{Block, Sector, node_block_pos, node_rel_pos};
use terrane_content::{CONTENT_IGNORE, Node};
use terrane_geom::{V2, V3};

use crate::access::{NodeSink, NodeSource};
use crate::error::WorldError;
use crate::{BLOCK_LIMIT, block_over_limit};

/// Sole owner of all loaded sectors, and through them all blocks.
///
/// Sectors live in a slot vector addressed through `by_pos`. The slot of the most
/// recently looked-up sector is remembered so repeated access to one column skips
/// the hash lookup.
#[derive(Debug, Default)]
pub struct WorldIndex {
    slots: Vec<Option<Sector>>,
    free: Vec<usize>,
    by_pos: HashMap<V2, usize>,
    last: Cell<Option<(V2, usize)>>,
}

impl WorldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_of(&self, p: V2) -> Option<usize> {
        if let Some((cp, i)) = self.last.get() {
            if cp == p {
                return Some(i);
            }
        }
        let i = *self.by_pos.get(&p)?;
        self.last.set(Some((p, i)));
        Some(i)
    }

    /// Position of the sector held in the single-entry cache.
    pub fn cached_sector(&self) -> Option<V2> {
        self.last.get().map(|(p, _)| p)
    }

    pub fn get_sector(&self, p: V2) -> Option<&Sector> {
        let i = self.slot_of(p)?;
        self.slots[i].as_ref()
    }

    pub fn get_sector_mut(&mut self, p: V2) -> Option<&mut Sector> {
        let i = self.slot_of(p)?;
        self.slots[i].as_mut()
    }

    /// Get or create the sector at `p`.
    pub fn create_sector(&mut self, p: V2) -> Result<&mut Sector, WorldError> {
        if p.x < -BLOCK_LIMIT || p.x > BLOCK_LIMIT || p.z < -BLOCK_LIMIT || p.z > BLOCK_LIMIT {
            return Err(WorldError::OverLimit(p.with_y(0)));
        }
        let i = match self.slot_of(p) {
            Some(i) => i,
            None => {
                let sector = Sector::new(p);
                let i = match self.free.pop() {
                    Some(i) => {
                        self.slots[i] = Some(sector);
                        i
                    }
                    None => {
                        self.slots.push(Some(sector));
                        self.slots.len() - 1
                    }
                };
                self.by_pos.insert(p, i);
                self.last.set(Some((p, i)));
                i
            }
        };
        self.slots[i]
            .as_mut()
            .ok_or(WorldError::PositionInvalid(p.with_y(0)))
    }

    /// Remove a sector and all its blocks, invalidating the cache if it pointed there.
    pub fn delete_sector(&mut self, p: V2) -> Option<Sector> {
        let i = self.by_pos.remove(&p)?;
        if self.cached_sector() == Some(p) {
            self.last.set(None);
        }
        self.free.push(i);
        self.slots[i].take()
    }

    pub fn sector_count(&self) -> usize {
        self.by_pos.len()
    }

    /// Loaded sector positions, sorted.
    pub fn sector_positions(&self) -> Vec<V2> {
        let mut v: Vec<V2> = self.by_pos.keys().copied().collect();
        v.sort();
        v
    }

    pub fn sectors(&self) -> impl Iterator<Item = &Sector> {
        self.slots.iter().flatten()
    }

    pub fn sectors_mut(&mut self) -> impl Iterator<Item = &mut Sector> {
        self.slots.iter_mut().flatten()
    }

    pub fn get_block(&self, bp: V3) -> Option<&Block> {
        self.get_sector(bp.xz())?.get_block(bp.y)
    }

    pub fn get_block_mut(&mut self, bp: V3) -> Option<&mut Block> {
        self.get_sector_mut(bp.xz())?.get_block_mut(bp.y)
    }

    /// Non-dummy block at `bp` or `PositionInvalid`.
    pub fn real_block(&self, bp: V3) -> Result<&Block, WorldError> {
        match self.get_block(bp) {
            Some(b) if !b.is_dummy() => Ok(b),
            _ => Err(WorldError::PositionInvalid(bp)),
        }
    }

    pub fn real_block_mut(&mut self, bp: V3) -> Result<&mut Block, WorldError> {
        match self.get_block_mut(bp) {
            Some(b) if !b.is_dummy() => Ok(b),
            _ => Err(WorldError::PositionInvalid(bp)),
        }
    }

    /// Create a blank block at `bp` (and its sector). A dummy there is given real
    /// storage in place; an existing real block is returned as is.
    pub fn create_block(&mut self, bp: V3) -> Result<&mut Block, WorldError> {
        if block_over_limit(bp) {
            return Err(WorldError::OverLimit(bp));
        }
        Ok(self.create_sector(bp.xz())?.create_blank_block(bp.y))
    }

    /// Install a fully built block, replacing any block at its position.
    pub fn insert_block(&mut self, block: Block) -> Result<(), WorldError> {
        let bp = block.pos();
        if block_over_limit(bp) {
            return Err(WorldError::OverLimit(bp));
        }
        self.create_sector(bp.xz())?.insert_block(block);
        Ok(())
    }

    pub fn delete_block(&mut self, bp: V3) -> Option<Block> {
        self.get_sector_mut(bp.xz())?.delete_block(bp.y)
    }

    pub fn block_count(&self) -> usize {
        self.sectors().map(Sector::len).sum()
    }

    /// Every loaded block position, sorted.
    pub fn block_positions(&self) -> Vec<V3> {
        let mut v: Vec<V3> = self.sectors().flat_map(Sector::block_positions).collect();
        v.sort();
        v
    }

    pub fn is_valid_position(&self, p: V3) -> bool {
        self.real_block(node_block_pos(p)).is_ok()
    }

    pub fn get_node(&self, p: V3) -> Result<Node, WorldError> {
        self.real_block(node_block_pos(p))?
            .get_node(node_rel_pos(p))
            .ok_or(WorldError::PositionInvalid(p))
    }

    /// Store a node without any lighting or liquid side effects.
    pub fn set_node(&mut self, p: V3, n: Node) -> Result<(), WorldError> {
        if n.content == CONTENT_IGNORE {
            log::warn!(target: "map", "set_node: not allowing ignore at {}", p);
            return Err(WorldError::IgnoreContent(p));
        }
        let block = self
            .real_block_mut(node_block_pos(p))
            .map_err(|_| WorldError::PositionInvalid(p))?;
        if block.set_node(node_rel_pos(p), n) {
            Ok(())
        } else {
            Err(WorldError::PositionInvalid(p))
        }
    }
}

impl NodeSource for WorldIndex {
    #[inline]
    fn node(&self, p: V3) -> Option<Node> {
        self.get_node(p).ok()
    }
}

impl NodeSink for WorldIndex {
    fn put_node(&mut self, p: V3, n: Node) -> bool {
        match self.get_block_mut(node_block_pos(p)) {
            Some(b) => b.set_node(node_rel_pos(p), n),
            None => false,
        }
    }
}
