mod common;

use common::*;
use terrane_block::ModState;
use terrane_content::{LIGHT_SUN, LightBank, Node, builtin};
use terrane_edit::MapEditKind;
use terrane_geom::{V2, V3};
use terrane_map::{BlockSet, MapError};
use terrane_world::BLOCK_LIMIT;

#[test]
fn emerging_generates_the_block_and_its_halo() {
    let mut map = memory_map();
    let log = attach_log(&mut map);
    assert!(map.emerge_block(V3::ZERO, true).unwrap());

    let centre = map.world().get_block(V3::ZERO).unwrap();
    assert!(centre.is_generated());
    assert_eq!(centre.modified(), ModState::WriteNeeded);
    assert!(!centre.lighting_expired());
    let side = map.world().get_block(V3::new(1, 1, -1)).unwrap();
    assert!(!side.is_generated());
    assert!(map.world().get_block(V3::new(0, -1, 0)).unwrap().is_underground());
    assert_eq!(map.world().block_count(), 27);

    assert_eq!(map.get_node(V3::new(3, 4, 3)).unwrap().content, builtin::GRASS);
    assert_eq!(map.get_node(V3::new(3, 2, 3)).unwrap().content, builtin::DIRT);
    assert_eq!(map.get_node(V3::new(3, 0, 3)).unwrap().content, builtin::STONE);
    let above = map.get_node(V3::new(3, 10, 3)).unwrap();
    assert_eq!(above.content, builtin::AIR);
    assert_eq!(above.light(LightBank::Day, &**map.defs()), LIGHT_SUN);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    let ev = log.last().unwrap();
    assert_eq!(ev.kind, MapEditKind::Other);
    assert_eq!(ev.p, V3::ZERO);
    assert!(ev.modified_blocks.contains(&V3::ZERO));
}

#[test]
fn generated_blocks_are_not_regenerated() {
    let mut map = memory_map();
    let log = attach_log(&mut map);
    assert!(map.emerge_block(V3::ZERO, true).unwrap());
    let mut modified = BlockSet::new();
    map.add_node_and_update(V3::new(3, 10, 3), Node::new(builtin::COBBLE), &mut modified)
        .unwrap();
    assert!(map.emerge_block(V3::ZERO, true).unwrap());
    assert_eq!(log.lock().unwrap().len(), 1);
    assert_eq!(map.get_node(V3::new(3, 10, 3)).unwrap().content, builtin::COBBLE);
}

#[test]
fn emerging_without_generation_fails_for_unknown_blocks() {
    let mut map = memory_map();
    assert!(!map.emerge_block(V3::new(5, 5, 5), false).unwrap());
    assert!(map.world().get_block(V3::new(5, 5, 5)).is_none());
}

#[test]
fn halo_over_the_limit_is_a_no_op() {
    let mut map = memory_map();
    let bp = V3::new(BLOCK_LIMIT, 0, 0);
    let data = map.init_block_make(bp).unwrap();
    assert!(data.no_op);
    let mut modified = BlockSet::new();
    assert!(!map.finish_block_make(data, &mut modified).unwrap());
    assert!(modified.is_empty());
}

#[test]
fn generating_past_the_limit_is_refused() {
    let mut map = memory_map();
    let mut modified = BlockSet::new();
    let r = map.generate_block(V3::new(0, BLOCK_LIMIT + 1, 0), &mut modified);
    assert!(matches!(r, Err(MapError::World(_))));
    assert!(matches!(
        map.create_sector(V2::new(-BLOCK_LIMIT - 1, 0)),
        Err(MapError::World(_))
    ));
}

#[test]
fn ground_level_comes_from_the_generator() {
    let map = memory_map();
    assert_eq!(map.find_ground_level(V2::new(100, -100)), 4);
}

#[test]
fn metadata_edits_notify_receivers() {
    let mut map = memory_map();
    assert!(map.emerge_block(V3::ZERO, true).unwrap());
    let p = V3::new(1, 5, 1);
    assert!(map.add_node_with_event(p, Node::new(builtin::CHEST)));
    map.world_mut().get_block_mut(V3::ZERO).unwrap().reset_modified();

    let log = attach_log(&mut map);
    map.node_metadata_mut(p).unwrap().unwrap().set_int("slots", 8);
    map.node_metadata_changed(p);
    let log = log.lock().unwrap();
    let ev = log.last().unwrap();
    assert_eq!(ev.kind, MapEditKind::MetadataChanged);
    assert_eq!(ev.p, p);
    assert_eq!(ev.modified_blocks.iter().copied().collect::<Vec<_>>(), vec![V3::ZERO]);
    assert_eq!(map.world().get_block(V3::ZERO).unwrap().modified(), ModState::WriteNeeded);
    assert!(map.remove_node_metadata(p).is_some());
    assert!(map.remove_node_metadata(p).is_none());
}

#[test]
fn halo_blocks_generate_when_asked() {
    let mut map = memory_map();
    assert!(map.emerge_block(V3::ZERO, true).unwrap());
    let side = V3::new(1, 0, 0);
    assert!(map.emerge_block(side, false).unwrap());
    assert!(!map.world().get_block(side).unwrap().is_generated());
    assert_eq!(map.get_node(V3::new(20, 0, 3)).unwrap().content, Node::IGNORE.content);

    assert!(map.emerge_block(side, true).unwrap());
    assert!(map.world().get_block(side).unwrap().is_generated());
    assert_eq!(map.get_node(V3::new(20, 0, 3)).unwrap().content, builtin::STONE);
    // The first block keeps what it had.
    assert_eq!(map.get_node(V3::new(3, 4, 3)).unwrap().content, builtin::GRASS);
}
