//! Dense voxel buffers copied out of the world and written back in bulk.
#![forbid(unsafe_code)]

mod buffer;
mod manual;

pub use buffer::VoxelBuffer;
pub use manual::ManualVoxelBuffer;

use std::collections::BTreeSet;

use terrane_geom::V3;

/// Voxel never copied in from the world (holds IGNORE).
pub const VOXELFLAG_NOT_LOADED: u8 = 1 << 0;
/// Voxel belongs to a block that does not exist; never read or written back.
pub const VOXELFLAG_INEXISTENT: u8 = 1 << 1;

/// Block positions touched by a write-back or lighting pass.
pub type BlockSet = BTreeSet<V3>;
