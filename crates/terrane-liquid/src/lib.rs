//! Queue-driven liquid flow.
#![forbid(unsafe_code)]

mod queue;
mod transform;

pub use queue::UniqueQueue;
pub use transform::{LiquidStats, WATER_DROP_BOOST, transform_liquids};

/// Default cap on a pass: this many times the queue length at the start.
pub const DEFAULT_LOOP_FACTOR: u32 = 3;
