use proptest::prelude::*;
use terrane_block::{MAP_BLOCKSIZE, block_origin, node_block_pos};
use terrane_content::{ContentRegistry, Node};
use terrane_geom::{V3, VoxelArea};
use terrane_mapgen::{BlockMakeData, FlatGenerator, MapGenerator, MapgenConfig, NoiseGenerator};
use terrane_voxel::ManualVoxelBuffer;
use terrane_world::WorldIndex;

fn make_data(seed: u64, bp: V3) -> BlockMakeData {
    let mut world = WorldIndex::new();
    for p in VoxelArea::new(bp - V3::ONE, bp + V3::ONE).iter() {
        world.create_block(p).unwrap();
    }
    let mut vmanip = ManualVoxelBuffer::new();
    vmanip.initial_emerge(&world, bp - V3::ONE, bp + V3::ONE);
    BlockMakeData { seed, blockpos: bp, vmanip, ..BlockMakeData::default() }
}

fn block_pos() -> impl Strategy<Value = V3> {
    (-4i32..4, -3i32..3, -4i32..4).prop_map(|(x, y, z)| V3::new(x, y, z))
}

/// Every node outside the central block is still the blank placeholder.
fn halo_untouched(data: &BlockMakeData) -> Result<(), TestCaseError> {
    let bp = data.blockpos;
    let area = VoxelArea::new(
        block_origin(bp - V3::ONE),
        block_origin(bp + V3::ONE) + V3::splat(MAP_BLOCKSIZE - 1),
    );
    for p in area.iter() {
        if node_block_pos(p) != bp {
            prop_assert_eq!(data.vmanip.get_or_ignore(p), Node::IGNORE, "halo node {} written", p);
        }
    }
    for p in data.transforming_liquid.iter() {
        prop_assert_eq!(node_block_pos(*p), bp, "liquid queued outside the block at {}", p);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn noise_writes_only_the_central_block(seed in any::<u64>(), bp in block_pos()) {
        let defs = ContentRegistry::builtin();
        let mut data = make_data(seed, bp);
        NoiseGenerator::new(MapgenConfig::default()).make_block(&mut data, &defs);
        halo_untouched(&data)?;
    }

    #[test]
    fn flat_writes_only_the_central_block(ground in -40i32..40, water in -40i32..40, bp in block_pos()) {
        let defs = ContentRegistry::builtin();
        let mut data = make_data(1, bp);
        FlatGenerator::new(ground, water).make_block(&mut data, &defs);
        halo_untouched(&data)?;
    }
}
