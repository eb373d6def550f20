//! Integer vector and voxel area types shared by the engine crates.
#![forbid(unsafe_code)]

use core::fmt;
use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Integer 3D coordinate, used both for nodes and for blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct V3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl V3 {
    pub const ZERO: V3 = V3 { x: 0, y: 0, z: 0 };
    pub const ONE: V3 = V3 { x: 1, y: 1, z: 1 };
    pub const UP: V3 = V3 { x: 0, y: 1, z: 0 };
    pub const DOWN: V3 = V3 { x: 0, y: -1, z: 0 };

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn splat(v: i32) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Component-wise floor division (rounds toward negative infinity).
    #[inline]
    pub fn div_floor(self, d: i32) -> V3 {
        V3::new(self.x.div_euclid(d), self.y.div_euclid(d), self.z.div_euclid(d))
    }

    /// Component-wise non-negative remainder matching `div_floor`.
    #[inline]
    pub fn rem_floor(self, d: i32) -> V3 {
        V3::new(self.x.rem_euclid(d), self.y.rem_euclid(d), self.z.rem_euclid(d))
    }

    #[inline]
    pub fn min(self, o: V3) -> V3 {
        V3::new(self.x.min(o.x), self.y.min(o.y), self.z.min(o.z))
    }

    #[inline]
    pub fn max(self, o: V3) -> V3 {
        V3::new(self.x.max(o.x), self.y.max(o.y), self.z.max(o.z))
    }

    /// Horizontal projection (x, z).
    #[inline]
    pub fn xz(self) -> V2 {
        V2::new(self.x, self.z)
    }
}

impl fmt::Display for V3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for V3 {
    #[inline]
    fn from(v: (i32, i32, i32)) -> Self {
        V3::new(v.0, v.1, v.2)
    }
}

impl From<V3> for (i32, i32, i32) {
    #[inline]
    fn from(v: V3) -> Self {
        (v.x, v.y, v.z)
    }
}

impl Add for V3 {
    type Output = V3;
    #[inline]
    fn add(self, rhs: V3) -> V3 {
        V3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for V3 {
    #[inline]
    fn add_assign(&mut self, rhs: V3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for V3 {
    type Output = V3;
    #[inline]
    fn sub(self, rhs: V3) -> V3 {
        V3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for V3 {
    #[inline]
    fn sub_assign(&mut self, rhs: V3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Mul<i32> for V3 {
    type Output = V3;
    #[inline]
    fn mul(self, rhs: i32) -> V3 {
        V3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for V3 {
    type Output = V3;
    #[inline]
    fn neg(self) -> V3 {
        V3::new(-self.x, -self.y, -self.z)
    }
}

/// Integer 2D coordinate in the horizontal plane (x, z).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct V2 {
    pub x: i32,
    pub z: i32,
}

impl V2 {
    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Lift back into 3D at height `y`.
    #[inline]
    pub const fn with_y(self, y: i32) -> V3 {
        V3::new(self.x, y, self.z)
    }
}

impl fmt::Display for V2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.z)
    }
}

impl From<(i32, i32)> for V2 {
    #[inline]
    fn from(v: (i32, i32)) -> Self {
        V2::new(v.0, v.1)
    }
}

/// The six face neighbours, in the fixed processing order used by the
/// lighting and liquid passes: back, top, right, front, bottom, left.
pub const FACE_DIRS: [V3; 6] = [
    V3::new(0, 0, 1),
    V3::new(0, 1, 0),
    V3::new(1, 0, 0),
    V3::new(0, 0, -1),
    V3::new(0, -1, 0),
    V3::new(-1, 0, 0),
];

/// Inclusive axis-aligned box of voxels. An area with any `max < min` is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoxelArea {
    pub min: V3,
    pub max: V3,
}

impl Default for VoxelArea {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl VoxelArea {
    pub const EMPTY: VoxelArea = VoxelArea {
        min: V3::ONE,
        max: V3::ZERO,
    };

    #[inline]
    pub const fn new(min: V3, max: V3) -> Self {
        Self { min, max }
    }

    /// Box of side `2r+1` centred on `p`.
    #[inline]
    pub fn around(p: V3, r: i32) -> Self {
        Self::new(p - V3::splat(r), p + V3::splat(r))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    #[inline]
    pub fn extent(&self) -> V3 {
        if self.is_empty() {
            V3::ZERO
        } else {
            self.max - self.min + V3::ONE
        }
    }

    #[inline]
    pub fn volume(&self) -> usize {
        let e = self.extent();
        e.x as usize * e.y as usize * e.z as usize
    }

    #[inline]
    pub fn contains(&self, p: V3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    #[inline]
    pub fn contains_area(&self, o: &VoxelArea) -> bool {
        o.is_empty() || (self.contains(o.min) && self.contains(o.max))
    }

    /// Linear index of `p`, y-major: `(y * sz + z) * sx + x`. Caller checks `contains`.
    #[inline]
    pub fn index(&self, p: V3) -> usize {
        let e = self.extent();
        let l = p - self.min;
        ((l.y as usize * e.z as usize) + l.z as usize) * e.x as usize + l.x as usize
    }

    /// Smallest area covering both. Empty operands are ignored.
    pub fn union(&self, o: &VoxelArea) -> VoxelArea {
        if self.is_empty() {
            return *o;
        }
        if o.is_empty() {
            return *self;
        }
        VoxelArea::new(self.min.min(o.min), self.max.max(o.max))
    }

    /// Overlap of both areas; `EMPTY` when they are disjoint.
    pub fn intersect(&self, o: &VoxelArea) -> VoxelArea {
        let a = VoxelArea::new(self.min.max(o.min), self.max.min(o.max));
        if a.is_empty() { VoxelArea::EMPTY } else { a }
    }

    /// Iterate every position in index order.
    pub fn iter(&self) -> impl Iterator<Item = V3> + use<> {
        let a = *self;
        let (ylo, yhi) = if a.is_empty() { (1, 0) } else { (a.min.y, a.max.y) };
        (ylo..=yhi).flat_map(move |y| {
            (a.min.z..=a.max.z).flat_map(move |z| (a.min.x..=a.max.x).map(move |x| V3::new(x, y, z)))
        })
    }
}

impl fmt::Display for VoxelArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = self.extent();
        write!(f, "{}-{} ({}x{}x{})", self.min, self.max, e.x, e.y, e.z)
    }
}
