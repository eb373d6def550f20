use terrane_block::{MAP_BLOCKSIZE, ModState, rel_index};
use terrane_content::{CONTENT_IGNORE, ContentDefs, LIGHT_SUN, LightBank, diminish_light};
use terrane_geom::V3;
use terrane_voxel::BlockSet;
use terrane_world::{NodeSink, WorldIndex};

use crate::spread::LightSources;

const S: usize = MAP_BLOCKSIZE as usize;

/// Give full sunlight to `start` and every node below it that lets sunlight
/// through. Returns the lowest y that received sunlight (`start.y + 1` if none did).
pub fn propagate_sunlight<W: NodeSink + ?Sized>(
    w: &mut W,
    defs: &dyn ContentDefs,
    start: V3,
    modified: &mut BlockSet,
) -> i32 {
    let mut y = start.y;
    loop {
        let pos = V3::new(start.x, y, start.z);
        let Some(mut n) = w.node(pos) else {
            break;
        };
        if !defs.get(n.content).sunlight_propagates {
            break;
        }
        n.set_light(LightBank::Day, LIGHT_SUN, defs);
        if w.put_node(pos, n) {
            modified.insert(terrane_block::node_block_pos(pos));
        }
        y -= 1;
    }
    y + 1
}

/// Carry sunlight down every column of block `bp`, raising DAY light where the
/// column is brighter than what is stored. Nodes that can pass light on are added
/// to `sources`.
///
/// Returns whether the block below already agrees with what leaves this block's
/// bottom (true when there is no block below).
pub fn propagate_block_sunlight(
    world: &mut WorldIndex,
    bp: V3,
    defs: &dyn ContentDefs,
    sources: &mut LightSources,
) -> bool {
    // Entry light per column, decided from the block above.
    let mut entry = [[0u8; S]; S];
    {
        let Some(block) = world.get_block(bp) else {
            return true;
        };
        let Some(nodes) = block.nodes() else {
            return true;
        };
        let underground = block.is_underground();
        let above = world.get_block(bp + V3::UP).and_then(|b| b.nodes());
        for (z, row) in entry.iter_mut().enumerate() {
            for (x, e) in row.iter_mut().enumerate() {
                let no_sunlight = match above {
                    Some(above) => {
                        let n = above[rel_index(V3::new(x as i32, 0, z as i32))];
                        if n.content == CONTENT_IGNORE {
                            underground
                        } else {
                            n.light(LightBank::Day, defs) != LIGHT_SUN
                        }
                    }
                    // Assume open sky above a missing block unless told otherwise.
                    None => {
                        let top = nodes[rel_index(V3::new(x as i32, MAP_BLOCKSIZE - 1, z as i32))];
                        underground || !defs.get(top.content).sunlight_propagates
                    }
                };
                *e = if no_sunlight { 0 } else { LIGHT_SUN };
            }
        }
    }

    let origin = terrane_block::block_origin(bp);
    let mut exit = [[false; S]; S];
    let mut changed = false;
    if let Some(block) = world.get_block_mut(bp) {
        if let Some(nodes) = block.nodes_mut() {
            for z in 0..S {
                for x in 0..S {
                    let mut current = entry[z][x];
                    for y in (0..S).rev() {
                        let rel = V3::new(x as i32, y as i32, z as i32);
                        let n = &mut nodes[rel_index(rel)];
                        let f = defs.get(n.content);
                        current = if current == 0 {
                            0
                        } else if current == LIGHT_SUN && f.sunlight_propagates {
                            LIGHT_SUN
                        } else if !f.light_propagates {
                            0
                        } else {
                            diminish_light(current)
                        };
                        if current > n.light(LightBank::Day, defs) {
                            n.set_light(LightBank::Day, current, defs);
                            changed = true;
                        }
                        if diminish_light(current) != 0 {
                            sources.insert(origin + rel);
                        }
                    }
                    exit[z][x] = current == LIGHT_SUN;
                }
            }
        }
        if changed {
            block.raise_modified(ModState::WriteNeeded, "propagate_block_sunlight");
        }
    }

    let Some(below) = world
        .get_block(bp + V3::DOWN)
        .and_then(|b| b.nodes())
    else {
        return true;
    };
    for (z, row) in exit.iter().enumerate() {
        for (x, &sun_goes_down) in row.iter().enumerate() {
            let n = below[rel_index(V3::new(x as i32, MAP_BLOCKSIZE - 1, z as i32))];
            if !defs.get(n.content).light_propagates {
                continue;
            }
            let has_sun = n.light(LightBank::Day, defs) == LIGHT_SUN;
            if has_sun != sun_goes_down {
                return false;
            }
        }
    }
    true
}
