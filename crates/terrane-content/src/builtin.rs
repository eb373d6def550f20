//! Default content set used when no definition file is supplied.

use crate::features::{ContentFeatures, LiquidType, ParamType};
use crate::node::{CONTENT_AIR, CONTENT_IGNORE, ContentId, LIGHT_MAX};

pub const STONE: ContentId = 0;
pub const DIRT: ContentId = 1;
pub const GRASS: ContentId = 2;
pub const SAND: ContentId = 3;
pub const GLASS: ContentId = 4;
pub const TORCH: ContentId = 5;
pub const WATER_FLOWING: ContentId = 6;
pub const WATER_SOURCE: ContentId = 7;
pub const LAVA_FLOWING: ContentId = 8;
pub const LAVA_SOURCE: ContentId = 9;
pub const CHEST: ContentId = 10;
pub const COBBLE: ContentId = 11;

pub const AIR: ContentId = CONTENT_AIR;
pub const IGNORE: ContentId = CONTENT_IGNORE;

const WATER_VISCOSITY: u8 = 1;
const LAVA_VISCOSITY: u8 = 7;

fn solid(name: &str) -> ContentFeatures {
    ContentFeatures {
        name: name.into(),
        ..ContentFeatures::default()
    }
}

fn transparent(name: &str) -> ContentFeatures {
    ContentFeatures {
        name: name.into(),
        param_type: ParamType::Light,
        light_propagates: true,
        sunlight_propagates: true,
        ..ContentFeatures::default()
    }
}

fn liquid(
    name: &str,
    ty: LiquidType,
    flowing: ContentId,
    source: ContentId,
    viscosity: u8,
    light_source: u8,
) -> ContentFeatures {
    ContentFeatures {
        name: name.into(),
        param_type: ParamType::Light,
        // lava glows but is opaque; water dims light but passes it
        light_propagates: light_source == 0,
        sunlight_propagates: false,
        light_source,
        walkable: false,
        liquid_type: ty,
        liquid_alternative_flowing: flowing,
        liquid_alternative_source: source,
        liquid_viscosity: viscosity,
        ..ContentFeatures::default()
    }
}

/// The reserved entries every registry carries.
pub fn reserved() -> Vec<(ContentId, ContentFeatures)> {
    vec![
        (
            AIR,
            ContentFeatures {
                walkable: false,
                ..transparent("air")
            },
        ),
        (
            IGNORE,
            ContentFeatures {
                name: "ignore".into(),
                walkable: false,
                ..ContentFeatures::default()
            },
        ),
    ]
}

pub fn features() -> Vec<(ContentId, ContentFeatures)> {
    let mut out = reserved();
    out.extend([
        (STONE, solid("stone")),
        (DIRT, solid("dirt")),
        (GRASS, solid("grass")),
        (SAND, solid("sand")),
        (COBBLE, solid("cobble")),
        (GLASS, transparent("glass")),
        (
            TORCH,
            ContentFeatures {
                light_source: LIGHT_MAX - 1,
                walkable: false,
                ..transparent("torch")
            },
        ),
        (
            WATER_FLOWING,
            liquid(
                "water_flowing",
                LiquidType::Flowing,
                WATER_FLOWING,
                WATER_SOURCE,
                WATER_VISCOSITY,
                0,
            ),
        ),
        (
            WATER_SOURCE,
            liquid(
                "water_source",
                LiquidType::Source,
                WATER_FLOWING,
                WATER_SOURCE,
                WATER_VISCOSITY,
                0,
            ),
        ),
        (
            LAVA_FLOWING,
            liquid(
                "lava_flowing",
                LiquidType::Flowing,
                LAVA_FLOWING,
                LAVA_SOURCE,
                LAVA_VISCOSITY,
                LIGHT_MAX - 1,
            ),
        ),
        (
            LAVA_SOURCE,
            liquid(
                "lava_source",
                LiquidType::Source,
                LAVA_FLOWING,
                LAVA_SOURCE,
                LAVA_VISCOSITY,
                LIGHT_MAX - 1,
            ),
        ),
        (
            CHEST,
            ContentFeatures {
                metadata_name: Some("chest".into()),
                ..solid("chest")
            },
        ),
    ]);
    out
}
