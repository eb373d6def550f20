use proptest::prelude::*;
use terrane_geom::{V2, V3};
use terrane_store::{block_key, key_to_block, key_to_sector, sector_key};

proptest! {
    #[test]
    fn block_keys_invert(x in -2048i32..2048, y in -2048i32..2048, z in -2048i32..2048) {
        let p = V3::new(x, y, z);
        prop_assert_eq!(key_to_block(block_key(p)), p);
    }

    #[test]
    fn sector_keys_invert(x in -2048i32..2048, z in -2048i32..2048) {
        let p = V2::new(x, z);
        prop_assert_eq!(key_to_sector(sector_key(p)), p);
    }

    #[test]
    fn distinct_blocks_distinct_keys(a in (-64i32..64, -64i32..64, -64i32..64), b in (-64i32..64, -64i32..64, -64i32..64)) {
        let pa = V3::new(a.0, a.1, a.2);
        let pb = V3::new(b.0, b.1, b.2);
        prop_assert_eq!(pa == pb, block_key(pa) == block_key(pb));
    }
}
