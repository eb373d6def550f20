//! Packing of block and sector coordinates into one signed 64-bit key.
//!
//! `key = z * 4096^2 + y * 4096 + x`, each axis in `-2048..2048`.

use terrane_geom::{V2, V3};

const SPAN: i64 = 4096;
const HALF: i64 = 2048;

#[inline]
fn to_signed(i: i64) -> i64 {
    if i < HALF { i } else { i - 2 * HALF }
}

#[inline]
pub fn block_key(p: V3) -> i64 {
    p.z as i64 * SPAN * SPAN + p.y as i64 * SPAN + p.x as i64
}

pub fn key_to_block(key: i64) -> V3 {
    let mut i = key;
    let x = to_signed(i.rem_euclid(SPAN));
    i = (i - x) / SPAN;
    let y = to_signed(i.rem_euclid(SPAN));
    i = (i - y) / SPAN;
    let z = to_signed(i.rem_euclid(SPAN));
    V3::new(x as i32, y as i32, z as i32)
}

/// Sectors share the block key space at y = 0.
#[inline]
pub fn sector_key(p: V2) -> i64 {
    block_key(p.with_y(0))
}

pub fn key_to_sector(key: i64) -> V2 {
    key_to_block(key).xz()
}
