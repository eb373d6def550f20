use std::collections::{BTreeMap, BTreeSet};

use terrane_block::node_block_pos;
use terrane_content::{ContentDefs, LightBank, diminish_light, undiminish_light};
use terrane_geom::{FACE_DIRS, V3};
use terrane_voxel::BlockSet;
use terrane_world::{NodeSink, NodeSource, WorldError};

/// Positions whose light should be (re)spread.
pub type LightSources = BTreeSet<V3>;
/// Positions that lost light, with the light they had.
pub type UnlightFrom = BTreeMap<V3, u8>;

/// Retract light that came from `from`. Every neighbour dimmer than the light its
/// source had is darkened and retracted in turn; neighbours at least as bright are
/// collected into `sources` for the following spread.
pub fn unspread_light<W: NodeSink + ?Sized>(
    w: &mut W,
    defs: &dyn ContentDefs,
    bank: LightBank,
    from: UnlightFrom,
    sources: &mut LightSources,
    modified: &mut BlockSet,
) {
    let mut from = from;
    let mut rounds = 0u32;
    while !from.is_empty() {
        rounds += 1;
        let mut unlighted = UnlightFrom::new();
        for (&pos, &oldlight) in &from {
            if w.node(pos).is_none() {
                continue;
            }
            for dir in FACE_DIRS {
                let n2pos = pos + dir;
                let Some(mut n2) = w.node(n2pos) else {
                    continue;
                };
                let light = n2.light(bank, defs);
                if light < oldlight {
                    if light != 0 && defs.get(n2.content).light_propagates {
                        n2.set_light(bank, 0, defs);
                        if w.put_node(n2pos, n2) {
                            modified.insert(node_block_pos(n2pos));
                        }
                        unlighted.entry(n2pos).or_insert(light);
                    }
                } else {
                    sources.insert(n2pos);
                }
            }
        }
        from = unlighted;
    }
    log::trace!(target: "lighting", "unspread {:?}: {} rounds", bank, rounds);
}

/// Single-node form of [`unspread_light`].
pub fn un_light_neighbors<W: NodeSink + ?Sized>(
    w: &mut W,
    defs: &dyn ContentDefs,
    bank: LightBank,
    pos: V3,
    lightwas: u8,
    sources: &mut LightSources,
    modified: &mut BlockSet,
) {
    let mut from = UnlightFrom::new();
    from.insert(pos, lightwas);
    unspread_light(w, defs, bank, from, sources, modified);
}

/// Spread light outwards from `from` until nothing brightens any more.
pub fn spread_light<W: NodeSink + ?Sized>(
    w: &mut W,
    defs: &dyn ContentDefs,
    bank: LightBank,
    from: LightSources,
    modified: &mut BlockSet,
) {
    let mut from = from;
    let mut rounds = 0u32;
    while !from.is_empty() {
        rounds += 1;
        let mut lighted = LightSources::new();
        for &pos in &from {
            let Some(n) = w.node(pos) else {
                continue;
            };
            let oldlight = n.light(bank, defs);
            let newlight = diminish_light(oldlight);
            for dir in FACE_DIRS {
                let n2pos = pos + dir;
                let Some(mut n2) = w.node(n2pos) else {
                    continue;
                };
                let light = n2.light(bank, defs);
                // A brighter neighbour will light this node on its turn.
                if light > undiminish_light(oldlight) {
                    lighted.insert(n2pos);
                }
                if light < newlight && defs.get(n2.content).light_propagates {
                    n2.set_light(bank, newlight, defs);
                    if n2.light(bank, defs) > light && w.put_node(n2pos, n2) {
                        modified.insert(node_block_pos(n2pos));
                        lighted.insert(n2pos);
                    }
                }
            }
        }
        from = lighted;
    }
    log::trace!(target: "lighting", "spread {:?}: {} rounds", bank, rounds);
}

/// Single-node form of [`spread_light`].
pub fn light_neighbors<W: NodeSink + ?Sized>(
    w: &mut W,
    defs: &dyn ContentDefs,
    bank: LightBank,
    pos: V3,
    modified: &mut BlockSet,
) {
    let mut from = LightSources::new();
    from.insert(pos);
    spread_light(w, defs, bank, from, modified);
}

/// Brightest available face neighbour of `p`; the first one found wins ties.
pub fn brightest_neighbour<W: NodeSource + ?Sized>(
    w: &W,
    defs: &dyn ContentDefs,
    bank: LightBank,
    p: V3,
) -> Result<V3, WorldError> {
    let mut best: Option<(V3, u8)> = None;
    for dir in FACE_DIRS {
        let n2pos = p + dir;
        let Some(n2) = w.node(n2pos) else {
            continue;
        };
        let light = n2.light(bank, defs);
        match best {
            Some((_, l)) if light <= l => {}
            _ => best = Some((n2pos, light)),
        }
    }
    best.map(|(pos, _)| pos)
        .ok_or(WorldError::PositionInvalid(p))
}
