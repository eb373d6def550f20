use serde::Deserialize;

use crate::features::{LiquidType, ParamType};

// Top-level content definition file
#[derive(Deserialize, Debug, Default)]
pub struct NodesConfig {
    pub nodes: Vec<NodeDef>,
    // Start from the builtin set and layer these definitions on top.
    #[serde(default)]
    pub extend_builtin: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct NodeDef {
    pub name: String,
    pub id: u16,
    #[serde(default)]
    pub param_type: Option<ParamType>,
    #[serde(default)]
    pub light_propagates: Option<bool>,
    #[serde(default)]
    pub sunlight_propagates: Option<bool>,
    #[serde(default)]
    pub light_source: Option<u8>,
    #[serde(default)]
    pub walkable: Option<bool>,
    #[serde(default)]
    pub liquid_type: Option<LiquidType>,
    // Names, resolved to ids once every definition is known
    #[serde(default)]
    pub liquid_alternative_flowing: Option<String>,
    #[serde(default)]
    pub liquid_alternative_source: Option<String>,
    #[serde(default)]
    pub liquid_viscosity: Option<u8>,
    #[serde(default)]
    pub metadata_name: Option<String>,
}
