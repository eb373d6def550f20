use std::ops::{Deref, DerefMut};

use terrane_content::Node;
use terrane_geom::{V3, VoxelArea};
use terrane_world::{NodeSink, NodeSource, WorldIndex};

use crate::buffer::{VoxelBuffer, block_area};
use crate::{BlockSet, VOXELFLAG_INEXISTENT};

/// Buffer loaded once over a block range and committed whole; used for generation.
#[derive(Clone, Debug, Default)]
pub struct ManualVoxelBuffer {
    inner: VoxelBuffer,
}

impl ManualVoxelBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load blocks `bmin..=bmax`. Blocks absent from the world (or dummies) are
    /// flagged INEXISTENT.
    pub fn initial_emerge(&mut self, world: &WorldIndex, bmin: V3, bmax: V3) {
        let range = VoxelArea::new(bmin, bmax);
        if range.is_empty() {
            return;
        }
        let nodes = VoxelArea::new(block_area(bmin).min, block_area(bmax).max);
        self.inner.add_area(nodes);
        for bp in range.iter() {
            if self.inner.is_emerged(bp) {
                continue;
            }
            let existed = self.inner.copy_block_in(bp, world.get_block(bp));
            self.inner.set_loaded(bp, existed);
        }
    }

    /// Write back every block that existed at emerge time, without comparing.
    pub fn blit_back_all(&self, world: &mut WorldIndex, modified: &mut BlockSet) {
        let mut existing: Vec<V3> = self
            .inner
            .loaded_blocks()
            .filter_map(|(bp, existed)| existed.then_some(bp))
            .collect();
        existing.sort();
        for bp in existing {
            let Some(block) = world.get_block_mut(bp) else {
                log::warn!(target: "map", "blit_back_all: block {} vanished", bp);
                continue;
            };
            let Some(nodes) = block.nodes_mut() else {
                continue;
            };
            for (i, p) in block_area(bp).iter().enumerate() {
                if self.inner.flags(p).is_some_and(|f| f & VOXELFLAG_INEXISTENT == 0) {
                    nodes[i] = self.inner.get_or_ignore(p);
                }
            }
            modified.insert(bp);
        }
    }
}

impl Deref for ManualVoxelBuffer {
    type Target = VoxelBuffer;

    fn deref(&self) -> &VoxelBuffer {
        &self.inner
    }
}

impl DerefMut for ManualVoxelBuffer {
    fn deref_mut(&mut self) -> &mut VoxelBuffer {
        &mut self.inner
    }
}

impl NodeSource for ManualVoxelBuffer {
    #[inline]
    fn node(&self, p: V3) -> Option<Node> {
        self.inner.node(p)
    }
}

impl NodeSink for ManualVoxelBuffer {
    #[inline]
    fn put_node(&mut self, p: V3, n: Node) -> bool {
        self.inner.put_node(p, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrane_block::ModState;
    use terrane_content::builtin;

    #[test]
    fn blit_back_all_commits_existing_blocks_only() {
        let mut w = WorldIndex::new();
        w.create_block(V3::ZERO).unwrap();
        w.get_block_mut(V3::ZERO).unwrap().reset_modified();

        let mut vm = ManualVoxelBuffer::new();
        vm.initial_emerge(&w, V3::new(-1, 0, 0), V3::ZERO);
        assert_eq!(vm.area(), VoxelArea::new(V3::new(-16, 0, 0), V3::splat(15)));
        // Block (-1,0,0) is not in the world.
        assert!(!vm.put_node(V3::new(-1, 0, 0), Node::AIR));
        for p in VoxelArea::new(V3::ZERO, V3::splat(15)).iter() {
            vm.put_node(p, Node::new(builtin::STONE));
        }

        let mut modified = BlockSet::new();
        vm.blit_back_all(&mut w, &mut modified);
        assert_eq!(modified.iter().copied().collect::<Vec<_>>(), vec![V3::ZERO]);
        assert_eq!(w.get_node(V3::splat(9)).unwrap(), Node::new(builtin::STONE));
        assert!(w.get_block(V3::new(-1, 0, 0)).is_none());
        // Raw commit leaves modification bookkeeping to the caller.
        assert_eq!(w.get_block(V3::ZERO).unwrap().modified(), ModState::Clean);
    }
}
