use serde::Deserialize;

use crate::node::{CONTENT_IGNORE, ContentId};

/// How `param1` is interpreted for a content type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    None,
    Light,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidType {
    #[default]
    None,
    Source,
    Flowing,
}

/// Registered properties of one content id.
#[derive(Clone, Debug)]
pub struct ContentFeatures {
    pub name: String,
    pub param_type: ParamType,
    pub light_propagates: bool,
    pub sunlight_propagates: bool,
    pub light_source: u8,
    pub walkable: bool,
    pub liquid_type: LiquidType,
    pub liquid_alternative_flowing: ContentId,
    pub liquid_alternative_source: ContentId,
    pub liquid_viscosity: u8,
    pub metadata_name: Option<String>,
}

impl Default for ContentFeatures {
    fn default() -> Self {
        Self {
            name: String::new(),
            param_type: ParamType::None,
            light_propagates: false,
            sunlight_propagates: false,
            light_source: 0,
            walkable: true,
            liquid_type: LiquidType::None,
            liquid_alternative_flowing: CONTENT_IGNORE,
            liquid_alternative_source: CONTENT_IGNORE,
            liquid_viscosity: 0,
            metadata_name: None,
        }
    }
}

impl ContentFeatures {
    #[inline]
    pub fn is_liquid(&self) -> bool {
        self.liquid_type != LiquidType::None
    }
}

/// Read-only content definition capability injected into every algorithm that
/// needs node properties.
pub trait ContentDefs: Send + Sync {
    /// Features for `id`; unregistered ids resolve to an opaque "unknown" entry.
    fn get(&self, id: ContentId) -> &ContentFeatures;

    fn id_by_name(&self, name: &str) -> Option<ContentId>;
}
