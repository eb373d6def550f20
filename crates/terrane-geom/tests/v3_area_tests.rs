use terrane_geom::{FACE_DIRS, V2, V3, VoxelArea};

#[test]
fn v3_arith() {
    let a = V3::new(1, 2, 3);
    let b = V3::new(-4, 5, -6);
    assert_eq!(a + b, V3::new(-3, 7, -3));
    assert_eq!((a + b) - a, b);
    assert_eq!(a * 16, V3::new(16, 32, 48));
    assert_eq!(-a, V3::new(-1, -2, -3));
    let mut c = a;
    c += V3::ONE;
    c -= V3::UP;
    assert_eq!(c, V3::new(2, 2, 4));
}

#[test]
fn floor_division_of_negatives() {
    assert_eq!(V3::new(-1, -16, -17).div_floor(16), V3::new(-1, -1, -2));
    assert_eq!(V3::new(-1, -16, -17).rem_floor(16), V3::new(15, 0, 15));
    assert_eq!(V3::new(15, 16, 0).div_floor(16), V3::new(0, 1, 0));
}

#[test]
fn xz_projection_roundtrip() {
    let p = V3::new(7, -3, 9);
    assert_eq!(p.xz(), V2::new(7, 9));
    assert_eq!(p.xz().with_y(-3), p);
}

#[test]
fn face_dirs_are_unit_and_distinct() {
    for (i, d) in FACE_DIRS.iter().enumerate() {
        assert_eq!(d.x.abs() + d.y.abs() + d.z.abs(), 1);
        for o in &FACE_DIRS[i + 1..] {
            assert_ne!(d, o);
        }
    }
    assert_eq!(FACE_DIRS[1], V3::UP);
    assert_eq!(FACE_DIRS[4], V3::DOWN);
}

#[test]
fn empty_area_behaviour() {
    let e = VoxelArea::default();
    assert!(e.is_empty());
    assert_eq!(e.volume(), 0);
    assert_eq!(e.iter().count(), 0);
    let a = VoxelArea::around(V3::ZERO, 1);
    assert_eq!(e.union(&a), a);
    assert_eq!(a.union(&e), a);
    assert_eq!(a.volume(), 27);
    assert!(a.contains(V3::new(-1, 1, 0)));
    assert!(!a.contains(V3::new(-2, 0, 0)));
}

#[test]
fn intersection_clips_or_empties() {
    let a = VoxelArea::new(V3::ZERO, V3::splat(15));
    let b = VoxelArea::new(V3::splat(10), V3::splat(20));
    assert_eq!(a.intersect(&b), VoxelArea::new(V3::splat(10), V3::splat(15)));
    let c = VoxelArea::new(V3::splat(16), V3::splat(17));
    assert!(a.intersect(&c).is_empty());
    assert!(a.contains_area(&a.intersect(&b)));
}
