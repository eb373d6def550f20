//! Blocks (16^3 node cubes), sectors (block columns), and their byte formats.
#![forbid(unsafe_code)]

pub mod block;
pub mod metadata;
pub mod sector;
pub mod serialize;

pub use block::{Block, ModState};
pub use metadata::{MetaValue, NodeMetadata, NodeMetadataList};
pub use sector::Sector;
pub use serialize::SerializationError;

use terrane_geom::V3;

/// Edge length of a block in nodes.
pub const MAP_BLOCKSIZE: i32 = 16;
pub const NODES_PER_BLOCK: usize = (MAP_BLOCKSIZE * MAP_BLOCKSIZE * MAP_BLOCKSIZE) as usize;

/// Block containing node position `p` (floor division).
#[inline]
pub fn node_block_pos(p: V3) -> V3 {
    p.div_floor(MAP_BLOCKSIZE)
}

/// Position of `p` relative to its block origin, each axis in `0..MAP_BLOCKSIZE`.
#[inline]
pub fn node_rel_pos(p: V3) -> V3 {
    p.rem_floor(MAP_BLOCKSIZE)
}

/// First node of block `bp`.
#[inline]
pub fn block_origin(bp: V3) -> V3 {
    bp * MAP_BLOCKSIZE
}

/// Flat index of an in-block relative position, y-major like `VoxelArea::index`.
#[inline]
pub fn rel_index(rel: V3) -> usize {
    let s = MAP_BLOCKSIZE as usize;
    (rel.y as usize * s + rel.z as usize) * s + rel.x as usize
}

#[inline]
pub fn rel_from_index(i: usize) -> V3 {
    let s = MAP_BLOCKSIZE as usize;
    V3::new((i % s) as i32, (i / (s * s)) as i32, ((i / s) % s) as i32)
}

#[inline]
pub fn rel_in_bounds(rel: V3) -> bool {
    (0..MAP_BLOCKSIZE).contains(&rel.x)
        && (0..MAP_BLOCKSIZE).contains(&rel.y)
        && (0..MAP_BLOCKSIZE).contains(&rel.z)
}
