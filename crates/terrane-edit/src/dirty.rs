use std::collections::HashMap;

use terrane_block::node_block_pos;
use terrane_geom::V3;

use crate::{MapEditEvent, MapEditKind, MapEventReceiver};

#[derive(Default, Debug, Clone, Copy)]
pub struct DirtyTrackerStats {
    pub rev_entries: usize,
    pub built_entries: usize,
    pub dirty: usize,
}

/// Per-block change tracking fed by map edit events.
///
/// Every event bumps a global counter and stamps each block it touched;
/// consumers compare against the revision they last processed.
#[derive(Default, Debug, Clone)]
pub struct DirtyTracker {
    rev: HashMap<V3, u64>, // latest change affecting block
    built: HashMap<V3, u64>,
    counter: u64,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DirtyTrackerStats {
        DirtyTrackerStats {
            rev_entries: self.rev.len(),
            built_entries: self.built.len(),
            dirty: self.rev.keys().filter(|bp| self.needs_rebuild(**bp)).count(),
        }
    }

    /// Stamps `blocks` with a fresh revision and returns it.
    pub fn bump(&mut self, blocks: impl IntoIterator<Item = V3>) -> u64 {
        self.counter = self.counter.wrapping_add(1).max(1);
        let stamp = self.counter;
        for bp in blocks {
            self.rev.insert(bp, stamp);
        }
        stamp
    }

    pub fn rev(&self, bp: V3) -> u64 {
        self.rev.get(&bp).copied().unwrap_or(0)
    }

    pub fn built_rev(&self, bp: V3) -> u64 {
        self.built.get(&bp).copied().unwrap_or(0)
    }

    pub fn mark_built(&mut self, bp: V3, rev: u64) {
        let e = self.built.entry(bp).or_insert(0);
        if rev > *e {
            *e = rev;
        }
    }

    pub fn needs_rebuild(&self, bp: V3) -> bool {
        self.rev(bp) > self.built_rev(bp)
    }

    /// Blocks whose latest revision has not been marked built, sorted.
    pub fn dirty_blocks(&self) -> Vec<V3> {
        let mut out: Vec<V3> = self
            .rev
            .keys()
            .copied()
            .filter(|bp| self.needs_rebuild(*bp))
            .collect();
        out.sort();
        out
    }

    pub fn forget(&mut self, bp: V3) {
        self.rev.remove(&bp);
        self.built.remove(&bp);
    }
}

impl MapEventReceiver for DirtyTracker {
    fn on_map_edit_event(&mut self, event: &MapEditEvent) {
        let mut blocks: Vec<V3> = event.modified_blocks.iter().copied().collect();
        match event.kind {
            MapEditKind::MetadataChanged => blocks.push(node_block_pos(event.p)),
            MapEditKind::Other if blocks.is_empty() => blocks.push(event.p),
            _ => {}
        }
        if !blocks.is_empty() {
            self.bump(blocks);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_blocks_become_dirty_until_built() {
        let mut t = DirtyTracker::new();
        let ev = MapEditEvent::new(MapEditKind::RemoveNode, V3::new(3, 3, 3))
            .with_blocks([V3::ZERO, V3::new(0, -1, 0)]);
        t.on_map_edit_event(&ev);
        assert_eq!(t.dirty_blocks(), vec![V3::new(0, -1, 0), V3::ZERO]);
        let r = t.rev(V3::ZERO);
        t.mark_built(V3::ZERO, r);
        assert!(!t.needs_rebuild(V3::ZERO));
        assert!(t.needs_rebuild(V3::new(0, -1, 0)));
        // stale build stamps never go backwards
        t.mark_built(V3::ZERO, 0);
        assert_eq!(t.built_rev(V3::ZERO), r);
    }

    #[test]
    fn metadata_event_marks_containing_block() {
        let mut t = DirtyTracker::new();
        t.on_map_edit_event(&MapEditEvent::new(MapEditKind::MetadataChanged, V3::new(-1, 17, 5)));
        assert_eq!(t.dirty_blocks(), vec![V3::new(-1, 1, 0)]);
    }

    #[test]
    fn stamps_increase() {
        let mut t = DirtyTracker::new();
        let a = t.bump([V3::ZERO]);
        let b = t.bump([V3::ONE]);
        assert!(b > a);
        assert_eq!(t.stats().dirty, 2);
    }
}
