use terrane_block::node_block_pos;
use terrane_content::{
    CONTENT_AIR, ContentDefs, ContentId, LIQUID_FLOW_DOWN_MASK, LIQUID_LEVEL_MASK,
    LIQUID_LEVEL_MAX, LIQUID_LEVEL_SOURCE, LiquidType, Node,
};
use terrane_geom::{FACE_DIRS, V3};
use terrane_lighting::update_all_lighting;
use terrane_voxel::BlockSet;
use terrane_world::WorldIndex;

use crate::queue::UniqueQueue;

/// Level bonus for liquid falling from the node above.
pub const WATER_DROP_BOOST: i8 = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Side {
    Upper,
    Same,
    Lower,
}

#[derive(Copy, Clone, Debug)]
struct Neighbour {
    n: Node,
    side: Side,
    p: V3,
}

/// Counters from one [`transform_liquids`] call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LiquidStats {
    pub processed: u32,
    pub changed: u32,
    /// Positions still queued when the loop cap was hit.
    pub deferred: usize,
    pub relit_blocks: usize,
}

fn side_of(dir: V3) -> Side {
    match dir.y {
        1 => Side::Upper,
        -1 => Side::Lower,
        _ => Side::Same,
    }
}

fn node_at(w: &WorldIndex, p: V3) -> Node {
    w.get_node(p).unwrap_or(Node::IGNORE)
}

fn flowing_alternative(defs: &dyn ContentDefs, c: ContentId) -> ContentId {
    defs.get(c).liquid_alternative_flowing
}

/// Run one bounded liquid pass over `queue`.
///
/// At most `loop_factor` times the initial queue length positions are processed;
/// the rest stay queued. Positions whose level change was limited by viscosity are
/// requeued at the end. Blocks whose light emission changed are relit, and every
/// written or relit block lands in `modified`.
pub fn transform_liquids(
    world: &mut WorldIndex,
    defs: &dyn ContentDefs,
    queue: &mut UniqueQueue<V3>,
    loop_factor: u32,
    modified: &mut BlockSet,
) -> LiquidStats {
    let initial_size = queue.len();
    let cap = initial_size.saturating_mul(loop_factor as usize);
    let mut stats = LiquidStats::default();
    let mut must_reflow: UniqueQueue<V3> = UniqueQueue::new();
    let mut lighting_blocks = BlockSet::new();

    while (stats.processed as usize) < cap {
        let Some(p0) = queue.pop_front() else {
            break;
        };
        stats.processed += 1;

        let mut n0 = node_at(world, p0);
        let f0 = defs.get(n0.content);
        let liquid_type = f0.liquid_type;
        let (liquid_level, mut liquid_kind): (i8, ContentId) = match liquid_type {
            LiquidType::Source => (LIQUID_LEVEL_SOURCE, f0.liquid_alternative_flowing),
            LiquidType::Flowing => ((n0.param2 & LIQUID_LEVEL_MASK) as i8, n0.content),
            // Only air can turn into liquid.
            LiquidType::None if n0.content == CONTENT_AIR => (-1, CONTENT_AIR),
            LiquidType::None => continue,
        };

        let mut sources: Vec<Neighbour> = Vec::with_capacity(6);
        let mut flows: Vec<Neighbour> = Vec::with_capacity(6);
        let mut airs: Vec<Neighbour> = Vec::with_capacity(6);
        let mut flowing_down = false;
        for dir in FACE_DIRS {
            let npos = p0 + dir;
            let nb = Neighbour {
                n: node_at(world, npos),
                side: side_of(dir),
                p: npos,
            };
            match defs.get(nb.n.content).liquid_type {
                LiquidType::None => {
                    if nb.n.content == CONTENT_AIR {
                        airs.push(nb);
                        // Liquid always tries to spread into adjacent air.
                        if nb.side != Side::Upper && liquid_type != LiquidType::None {
                            queue.push_back(npos);
                        }
                        if nb.side == Side::Lower {
                            flowing_down = true;
                        }
                    }
                }
                LiquidType::Source => {
                    let alt = flowing_alternative(defs, nb.n.content);
                    if liquid_kind == CONTENT_AIR {
                        liquid_kind = alt;
                    }
                    // A source below does not feed this node.
                    if alt == liquid_kind && nb.side != Side::Lower {
                        sources.push(nb);
                    }
                }
                LiquidType::Flowing => {
                    let alt = flowing_alternative(defs, nb.n.content);
                    if liquid_kind == CONTENT_AIR {
                        liquid_kind = alt;
                    }
                    if alt == liquid_kind {
                        flows.push(nb);
                        if nb.side == Side::Lower {
                            flowing_down = true;
                        }
                    }
                }
            }
        }

        let new_content: ContentId;
        let mut new_level: i8 = -1;
        if sources.len() >= 2 || liquid_type == LiquidType::Source {
            new_content = defs.get(liquid_kind).liquid_alternative_source;
        } else if sources.len() == 1 && sources[0].side != Side::Lower {
            new_content = liquid_kind;
            new_level = LIQUID_LEVEL_MAX;
        } else {
            let mut max_level: i8 = -1;
            for nb in &flows {
                let level = (nb.n.param2 & LIQUID_LEVEL_MASK) as i8;
                match nb.side {
                    Side::Upper => {
                        if level + WATER_DROP_BOOST > max_level {
                            max_level = (level + WATER_DROP_BOOST).min(LIQUID_LEVEL_MAX);
                        } else if level > max_level {
                            max_level = level;
                        }
                    }
                    Side::Lower => {}
                    Side::Same => {
                        let falls = nb.n.param2 & LIQUID_FLOW_DOWN_MASK == LIQUID_FLOW_DOWN_MASK;
                        if !falls && level > 0 && level - 1 > max_level {
                            max_level = level - 1;
                        }
                    }
                }
            }

            let viscosity = defs.get(liquid_kind).liquid_viscosity as i8;
            if viscosity > 1 && max_level != liquid_level {
                let inc = max_level - liquid_level;
                new_level = if inc < -viscosity || inc > viscosity {
                    liquid_level + inc / viscosity
                } else if inc < 0 {
                    liquid_level - 1
                } else {
                    liquid_level + 1
                };
                if new_level != max_level {
                    must_reflow.push_back(p0);
                }
            } else {
                new_level = max_level;
            }

            new_content = if new_level >= 0 { liquid_kind } else { CONTENT_AIR };
        }

        let new_is_flowing = defs.get(new_content).liquid_type == LiquidType::Flowing;
        let unchanged = new_content == n0.content
            && (liquid_type != LiquidType::Flowing
                || ((n0.param2 & LIQUID_LEVEL_MASK) as i8 == new_level
                    && n0.is_flowing_down() == flowing_down));
        if unchanged {
            continue;
        }

        let old_source = f0.light_source;
        n0.param2 = if new_is_flowing {
            (if flowing_down { LIQUID_FLOW_DOWN_MASK } else { 0 })
                | (new_level as u8 & LIQUID_LEVEL_MASK)
        } else {
            n0.param2 & !(LIQUID_LEVEL_MASK | LIQUID_FLOW_DOWN_MASK)
        };
        n0.content = new_content;
        if let Err(e) = world.set_node(p0, n0) {
            log::warn!(target: "liquid", "cannot update {}: {}", p0, e);
            continue;
        }
        stats.changed += 1;
        let bp = node_block_pos(p0);
        modified.insert(bp);
        if defs.get(new_content).light_source != old_source {
            lighting_blocks.insert(bp);
        }

        match defs.get(new_content).liquid_type {
            LiquidType::Source | LiquidType::Flowing => {
                for nb in flows.iter().chain(airs.iter()) {
                    if nb.side != Side::Upper {
                        queue.push_back(nb.p);
                    }
                }
            }
            // Dried up; flows around may follow.
            LiquidType::None => {
                for nb in &flows {
                    queue.push_back(nb.p);
                }
            }
        }
    }

    stats.deferred = queue.len();
    queue.append(&mut must_reflow);
    stats.relit_blocks = lighting_blocks.len();
    if !lighting_blocks.is_empty() {
        update_all_lighting(world, defs, &lighting_blocks, modified);
    }
    log::debug!(
        target: "liquid",
        "transform_liquids: initial {} processed {} changed {} deferred {} relit {}",
        initial_size,
        stats.processed,
        stats.changed,
        stats.deferred,
        stats.relit_blocks
    );
    stats
}
