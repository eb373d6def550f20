//! Day/night light banks: unspread, spread, sunlight columns and block relighting.
#![forbid(unsafe_code)]

mod spread;
mod sunlight;
mod update;

pub use spread::{
    LightSources, UnlightFrom, brightest_neighbour, light_neighbors, spread_light,
    un_light_neighbors, unspread_light,
};
pub use sunlight::{propagate_block_sunlight, propagate_sunlight};
pub use update::{update_all_lighting, update_lighting};

pub use terrane_content::LightBank;
