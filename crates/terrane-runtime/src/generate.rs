use std::sync::Arc;

use rayon::ThreadPool;
use rayon::prelude::*;
use terrane_edit::{MapEditEvent, MapEditKind};
use terrane_geom::V3;
use terrane_map::{BlockSet, Map, MapError};

// Halos plus the columns their lighting can reach.
fn conflicts(a: V3, b: V3) -> bool {
    (a.x - b.x).abs() < 4 && (a.z - b.z).abs() < 4
}

/// Split `blocks` into waves whose members can be generated side by side.
/// Order inside the input is kept within each wave.
pub fn plan_waves(blocks: &[V3]) -> Vec<Vec<V3>> {
    let mut waves: Vec<Vec<V3>> = Vec::new();
    for &bp in blocks {
        match waves
            .iter_mut()
            .find(|w| w.iter().all(|&other| !conflicts(bp, other)))
        {
            Some(w) => w.push(bp),
            None => waves.push(vec![bp]),
        }
    }
    waves
}

fn is_generated(map: &Map, bp: V3) -> bool {
    map.world().get_block(bp).is_some_and(|b| b.is_generated())
}

/// Emerge every block in `blocks`. Missing ones are generated wave by wave:
/// buffers are prepared on this thread, filled on `pool`, then merged back here.
/// Returns the positions loaded afterwards, in request order.
pub fn emerge_batch(
    map: &mut Map,
    pool: &ThreadPool,
    blocks: &[V3],
    allow_generate: bool,
) -> Result<Vec<V3>, MapError> {
    let mut pending = Vec::new();
    for &bp in blocks {
        let loaded = map.emerge_block(bp, false)?;
        if allow_generate && !(loaded && is_generated(map, bp)) && !pending.contains(&bp) {
            pending.push(bp);
        }
    }

    let generator = Arc::clone(map.generator());
    let defs = Arc::clone(map.defs());
    for wave in plan_waves(&pending) {
        let n = wave.len();
        let mut batch = Vec::with_capacity(wave.len());
        for bp in wave {
            batch.push(map.init_block_make(bp)?);
        }
        pool.install(|| {
            batch
                .par_iter_mut()
                .for_each(|data| generator.make_block(data, &*defs));
        });
        for data in batch {
            let bp = data.blockpos;
            let mut modified = BlockSet::new();
            if map.finish_block_make(data, &mut modified)? {
                let event = MapEditEvent::new(MapEditKind::Other, bp).with_blocks(modified);
                map.dispatch_event(&event);
            }
        }
        log::debug!(target: "mapgen", "generated a wave of {} blocks", n);
    }

    Ok(blocks
        .iter()
        .copied()
        .filter(|bp| map.world().get_block(*bp).is_some_and(|b| !b.is_dummy()))
        .collect())
}
