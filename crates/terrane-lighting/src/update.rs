use terrane_block::{MAP_BLOCKSIZE, ModState, block_origin, rel_from_index};
use terrane_content::{ContentDefs, LightBank};
use terrane_geom::V3;
use terrane_voxel::{BlockSet, ManualVoxelBuffer};
use terrane_world::WorldIndex;

use crate::spread::{LightSources, UnlightFrom, spread_light, unspread_light};
use crate::sunlight::propagate_block_sunlight;

#[inline]
fn on_border(rel: V3) -> bool {
    let m = MAP_BLOCKSIZE - 1;
    rel.x == 0 || rel.x == m || rel.y == 0 || rel.y == m || rel.z == 0 || rel.z == m
}

/// Recompute one bank of light for `blocks` from scratch.
///
/// Every block is cleared. For DAY, sunlight is re-propagated per column and the
/// pass continues into the block below while that block disagrees with what leaves
/// the bottom. Light is then retracted from the old border values and re-spread over
/// the blocks plus a one-block halo, and written back.
pub fn update_lighting(
    world: &mut WorldIndex,
    defs: &dyn ContentDefs,
    bank: LightBank,
    blocks: &BlockSet,
    modified: &mut BlockSet,
) {
    let mut to_update = BlockSet::new();
    let mut sources = LightSources::new();
    let mut unlight_from = UnlightFrom::new();

    // Top-down, so sunlight entering a lower block is already settled above it.
    let mut order: Vec<V3> = blocks.iter().copied().collect();
    order.sort_by_key(|p| (std::cmp::Reverse(p.y), p.x, p.z));

    for start in order {
        if to_update.contains(&start) {
            continue;
        }
        let mut bp = start;
        loop {
            let Some(block) = world.get_block_mut(bp) else {
                break;
            };
            let Some(nodes) = block.nodes_mut() else {
                break;
            };
            let origin = block_origin(bp);
            for (i, n) in nodes.iter_mut().enumerate() {
                let oldlight = n.light(bank, defs);
                n.set_light(bank, 0, defs);
                let rel = rel_from_index(i);
                if defs.get(n.content).light_source != 0 {
                    sources.insert(origin + rel);
                }
                if on_border(rel) {
                    unlight_from.entry(origin + rel).or_insert(oldlight);
                }
            }
            block.raise_modified(ModState::WriteNeeded, "update_lighting");
            modified.insert(bp);
            to_update.insert(bp);

            if bank == LightBank::Night {
                break;
            }
            if propagate_block_sunlight(world, bp, defs, &mut sources) {
                break;
            }
            log::trace!(target: "lighting", "block below {} needs sunlight too", bp);
            bp = bp + V3::DOWN;
        }
    }

    let mut vm = ManualVoxelBuffer::new();
    for &bp in &to_update {
        vm.initial_emerge(world, bp - V3::ONE, bp + V3::ONE);
        if let Some(block) = world.get_block_mut(bp) {
            block.set_lighting_expired(false);
        }
    }
    let mut scratch = BlockSet::new();
    let unlit = unlight_from.len();
    unspread_light(&mut vm, defs, bank, unlight_from, &mut sources, &mut scratch);
    let spread_from = sources.len();
    spread_light(&mut vm, defs, bank, sources, &mut scratch);
    vm.blit_back(world, modified);
    log::debug!(
        target: "lighting",
        "update_lighting {:?}: {} blocks, {} unlit borders, {} sources",
        bank,
        to_update.len(),
        unlit,
        spread_from
    );
}

/// DAY then NIGHT, then refresh the day/night difference cache of every modified block.
pub fn update_all_lighting(
    world: &mut WorldIndex,
    defs: &dyn ContentDefs,
    blocks: &BlockSet,
    modified: &mut BlockSet,
) {
    update_lighting(world, defs, LightBank::Day, blocks, modified);
    update_lighting(world, defs, LightBank::Night, blocks, modified);
    for bp in modified.iter() {
        if let Some(block) = world.get_block_mut(*bp) {
            block.update_day_night_diff(defs);
        }
    }
}
