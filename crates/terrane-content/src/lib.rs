//! Node values, content definitions, and the content registry.
#![forbid(unsafe_code)]

pub mod builtin;
pub mod config;
pub mod features;
pub mod node;
pub mod registry;

pub use features::{ContentDefs, ContentFeatures, LiquidType, ParamType};
pub use node::{
    CONTENT_AIR, CONTENT_IGNORE, ContentId, LIGHT_MAX, LIGHT_SUN, LIQUID_FLOW_DOWN_MASK,
    LIQUID_LEVEL_MASK, LIQUID_LEVEL_MAX, LIQUID_LEVEL_SOURCE, LightBank, Node, diminish_light,
    undiminish_light,
};
pub use registry::ContentRegistry;
