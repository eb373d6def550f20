//! The map facade: node edits with lighting and liquid upkeep, block lifecycle,
//! persistence and edit events.
#![forbid(unsafe_code)]

mod config;
mod error;
mod generate;
mod map;
mod meta;
mod persist;

pub use config::MapConfig;
pub use error::MapError;
pub use map::{Map, MapStats};
pub use persist::SaveStats;

pub use terrane_block::ModState;
pub use terrane_voxel::BlockSet;
