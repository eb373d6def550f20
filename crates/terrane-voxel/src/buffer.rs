use hashbrown::HashMap;
use terrane_block::{Block, MAP_BLOCKSIZE, block_origin, node_block_pos, node_rel_pos};
use terrane_content::Node;
use terrane_geom::{V3, VoxelArea};
use terrane_world::{NodeSink, NodeSource, WorldIndex};

use crate::{BlockSet, VOXELFLAG_INEXISTENT, VOXELFLAG_NOT_LOADED};

/// Node area covered by block `bp`.
pub(crate) fn block_area(bp: V3) -> VoxelArea {
    let o = block_origin(bp);
    VoxelArea::new(o, o + V3::splat(MAP_BLOCKSIZE - 1))
}

/// Private dense copy of a region of the world.
///
/// Voxels carry flags: `NOT_LOADED` until data was copied in or written, and
/// `INEXISTENT` when the owning block is absent or a dummy.
#[derive(Clone, Debug, Default)]
pub struct VoxelBuffer {
    area: VoxelArea,
    data: Vec<Node>,
    flags: Vec<u8>,
    /// Blocks already emerged, with whether they existed in the world.
    loaded_blocks: HashMap<V3, bool>,
}

impl VoxelBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn area(&self) -> VoxelArea {
        self.area
    }

    pub fn clear(&mut self) {
        self.area = VoxelArea::EMPTY;
        self.data.clear();
        self.flags.clear();
        self.loaded_blocks.clear();
    }

    /// Grow to cover `a`. Existing contents are kept; new voxels are NOT_LOADED.
    pub fn add_area(&mut self, a: VoxelArea) {
        if a.is_empty() || self.area.contains_area(&a) {
            return;
        }
        let new_area = self.area.union(&a);
        let mut data = vec![Node::IGNORE; new_area.volume()];
        let mut flags = vec![VOXELFLAG_NOT_LOADED; new_area.volume()];
        let old = self.area;
        for p in old.iter() {
            let (i, j) = (old.index(p), new_area.index(p));
            data[j] = self.data[i];
            flags[j] = self.flags[i];
        }
        self.area = new_area;
        self.data = data;
        self.flags = flags;
    }

    #[inline]
    pub fn flags(&self, p: V3) -> Option<u8> {
        self.area
            .contains(p)
            .then(|| self.flags[self.area.index(p)])
    }

    /// Node or IGNORE when outside the buffer.
    pub fn get_or_ignore(&self, p: V3) -> Node {
        if self.area.contains(p) {
            self.data[self.area.index(p)]
        } else {
            Node::IGNORE
        }
    }

    /// Write a node regardless of flags and mark it loaded. False if outside.
    pub fn set_node(&mut self, p: V3, n: Node) -> bool {
        if !self.area.contains(p) {
            return false;
        }
        let i = self.area.index(p);
        self.data[i] = n;
        self.flags[i] &= !VOXELFLAG_NOT_LOADED;
        true
    }

    pub fn loaded_blocks(&self) -> impl Iterator<Item = (V3, bool)> + '_ {
        self.loaded_blocks.iter().map(|(p, e)| (*p, *e))
    }

    pub(crate) fn set_loaded(&mut self, bp: V3, existed: bool) {
        self.loaded_blocks.insert(bp, existed);
    }

    pub(crate) fn is_emerged(&self, bp: V3) -> bool {
        self.loaded_blocks.contains_key(&bp)
    }

    /// Copy a block in, or flag its voxels INEXISTENT when it has no data.
    pub(crate) fn copy_block_in(&mut self, bp: V3, block: Option<&Block>) -> bool {
        let ba = block_area(bp);
        self.add_area(ba);
        match block.and_then(Block::nodes) {
            Some(nodes) => {
                for (i, p) in ba.iter().enumerate() {
                    let j = self.area.index(p);
                    self.data[j] = nodes[i];
                    self.flags[j] &= !(VOXELFLAG_NOT_LOADED | VOXELFLAG_INEXISTENT);
                }
                true
            }
            None => {
                for p in ba.iter() {
                    let j = self.area.index(p);
                    self.flags[j] |= VOXELFLAG_INEXISTENT;
                }
                false
            }
        }
    }

    /// Load every block overlapping `region` that is not already in the buffer.
    pub fn emerge(&mut self, world: &WorldIndex, region: VoxelArea) {
        if region.is_empty() {
            return;
        }
        let bmin = node_block_pos(region.min);
        let bmax = node_block_pos(region.max);
        for bp in VoxelArea::new(bmin, bmax).iter() {
            if self.is_emerged(bp) {
                continue;
            }
            let existed = self.copy_block_in(bp, world.get_block(bp));
            self.set_loaded(bp, existed);
        }
    }

    /// Write changed voxels back to the world. Blocks that received at least one
    /// changed node are added to `modified` once.
    pub fn blit_back(&self, world: &mut WorldIndex, modified: &mut BlockSet) {
        self.blit_back_area(world, self.area, modified);
    }

    /// [`VoxelBuffer::blit_back`] restricted to `region`.
    pub fn blit_back_area(&self, world: &mut WorldIndex, region: VoxelArea, modified: &mut BlockSet) {
        let region = self.area.intersect(&region);
        let mut cur_bp: Option<V3> = None;
        let mut cur: Option<&mut Block> = None;
        for p in region.iter() {
            let i = self.area.index(p);
            if self.flags[i] & (VOXELFLAG_NOT_LOADED | VOXELFLAG_INEXISTENT) != 0 {
                continue;
            }
            let bp = node_block_pos(p);
            if cur_bp != Some(bp) {
                cur = world.get_block_mut(bp).filter(|b| !b.is_dummy());
                cur_bp = Some(bp);
            }
            let Some(block) = cur.as_deref_mut() else {
                continue;
            };
            let rel = node_rel_pos(p);
            let n = self.data[i];
            if block.get_node(rel) != Some(n) {
                block.set_node(rel, n);
                modified.insert(bp);
            }
        }
    }
}

impl NodeSource for VoxelBuffer {
    #[inline]
    fn node(&self, p: V3) -> Option<Node> {
        if !self.area.contains(p) {
            return None;
        }
        let i = self.area.index(p);
        if self.flags[i] & (VOXELFLAG_NOT_LOADED | VOXELFLAG_INEXISTENT) != 0 {
            return None;
        }
        Some(self.data[i])
    }
}

impl NodeSink for VoxelBuffer {
    fn put_node(&mut self, p: V3, n: Node) -> bool {
        match self.flags(p) {
            Some(f) if f & VOXELFLAG_INEXISTENT == 0 => self.set_node(p, n),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrane_content::builtin;

    fn world_with(blocks: &[V3]) -> WorldIndex {
        let mut w = WorldIndex::new();
        for bp in blocks {
            w.create_block(*bp).unwrap().fill(Node::AIR);
        }
        w
    }

    #[test]
    fn add_area_keeps_contents() {
        let mut v = VoxelBuffer::new();
        v.add_area(VoxelArea::around(V3::ZERO, 1));
        assert!(v.set_node(V3::ONE, Node::new(builtin::STONE)));
        v.add_area(VoxelArea::around(V3::splat(5), 1));
        assert_eq!(v.node(V3::ONE), Some(Node::new(builtin::STONE)));
        assert_eq!(v.flags(V3::splat(3)), Some(VOXELFLAG_NOT_LOADED));
        assert_eq!(v.node(V3::splat(3)), None);
        assert_eq!(v.get_or_ignore(V3::splat(100)), Node::IGNORE);
    }

    #[test]
    fn emerge_marks_missing_blocks_inexistent() {
        let w = world_with(&[V3::ZERO]);
        let mut v = VoxelBuffer::new();
        v.emerge(&w, VoxelArea::new(V3::new(0, 0, 0), V3::new(20, 3, 3)));
        assert_eq!(v.node(V3::new(3, 3, 3)), Some(Node::AIR));
        assert_eq!(v.flags(V3::new(17, 0, 0)), Some(VOXELFLAG_NOT_LOADED | VOXELFLAG_INEXISTENT));
        assert_eq!(v.node(V3::new(17, 0, 0)), None);
        let mut loaded: Vec<_> = v.loaded_blocks().collect();
        loaded.sort();
        assert_eq!(loaded, vec![(V3::ZERO, true), (V3::new(1, 0, 0), false)]);
    }

    #[test]
    fn blit_back_writes_only_changes() {
        let mut w = world_with(&[V3::ZERO, V3::new(1, 0, 0)]);
        for b in w.sectors_mut().flat_map(|s| s.blocks_mut()) {
            b.reset_modified();
        }
        let mut v = VoxelBuffer::new();
        v.emerge(&w, VoxelArea::new(V3::ZERO, V3::new(31, 15, 15)));

        let mut modified = BlockSet::new();
        v.blit_back(&mut w, &mut modified);
        assert!(modified.is_empty());

        v.put_node(V3::new(20, 1, 1), Node::new(builtin::STONE));
        v.put_node(V3::new(21, 1, 1), Node::new(builtin::STONE));
        v.blit_back(&mut w, &mut modified);
        assert_eq!(modified.into_iter().collect::<Vec<_>>(), vec![V3::new(1, 0, 0)]);
        assert_eq!(w.get_node(V3::new(21, 1, 1)).unwrap(), Node::new(builtin::STONE));
        assert_eq!(
            w.get_block(V3::ZERO).unwrap().modified(),
            terrane_block::ModState::Clean
        );
    }

    #[test]
    fn inexistent_voxels_refuse_writes() {
        let w = world_with(&[]);
        let mut v = VoxelBuffer::new();
        v.emerge(&w, VoxelArea::around(V3::splat(8), 0));
        assert!(!v.put_node(V3::splat(8), Node::AIR));
        assert!(v.node(V3::splat(8)).is_none());
    }
}
