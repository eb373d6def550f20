//! World index: sectors, blocks, node access and generation limits.
#![forbid(unsafe_code)]

mod access;
mod error;
mod index;

pub use access::{NodeSink, NodeSource};
pub use error::WorldError;
pub use index::WorldIndex;

use terrane_block::{MAP_BLOCKSIZE, node_block_pos};
use terrane_geom::V3;

/// Nodes further than this from the origin on any axis are never generated.
pub const MAP_GENERATION_LIMIT: i32 = 31000;

/// Largest block coordinate magnitude inside the generation limit.
pub const BLOCK_LIMIT: i32 = MAP_GENERATION_LIMIT / MAP_BLOCKSIZE;

#[inline]
pub fn block_over_limit(bp: V3) -> bool {
    bp.x < -BLOCK_LIMIT
        || bp.x > BLOCK_LIMIT
        || bp.y < -BLOCK_LIMIT
        || bp.y > BLOCK_LIMIT
        || bp.z < -BLOCK_LIMIT
        || bp.z > BLOCK_LIMIT
}

#[inline]
pub fn node_over_limit(p: V3) -> bool {
    block_over_limit(node_block_pos(p))
}
