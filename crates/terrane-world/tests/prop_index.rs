use proptest::prelude::*;
use terrane_block::node_block_pos;
use terrane_content::Node;
use terrane_geom::{V2, V3};
use terrane_world::{NodeSource, WorldIndex};

fn small_pos() -> impl Strategy<Value = V3> {
    (-40i32..40, -40i32..40, -40i32..40).prop_map(|(x, y, z)| V3::new(x, y, z))
}

proptest! {
    #[test]
    fn last_write_wins_everywhere(writes in prop::collection::vec((small_pos(), 0u16..12), 1..80)) {
        let mut w = WorldIndex::new();
        for (p, _) in &writes {
            w.create_block(node_block_pos(*p)).unwrap();
        }
        for (p, c) in &writes {
            w.set_node(*p, Node::new(*c)).unwrap();
        }
        for (i, (p, _)) in writes.iter().enumerate() {
            let last = writes.iter().rev().find(|(q, _)| q == p).map(|(_, c)| *c);
            prop_assert_eq!(w.node(*p).map(|n| n.content), last, "write #{} at {}", i, p);
        }
    }

    #[test]
    fn cache_never_returns_wrong_sector(ops in prop::collection::vec((-3i32..3, -3i32..3, any::<bool>()), 1..60)) {
        let mut w = WorldIndex::new();
        for (x, z, create) in ops {
            let p = V2::new(x, z);
            if create {
                w.create_sector(p).unwrap();
            } else {
                w.delete_sector(p);
            }
            for q in w.sector_positions() {
                prop_assert_eq!(w.get_sector(q).map(|s| s.pos()), Some(q));
            }
            if !create {
                prop_assert!(w.get_sector(p).is_none());
            }
        }
    }
}
