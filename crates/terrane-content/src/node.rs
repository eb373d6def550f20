use crate::features::{ContentDefs, ParamType};

pub type ContentId = u16;

/// Placeholder for "not loaded / unknown". Never written into a block.
pub const CONTENT_IGNORE: ContentId = 127;
pub const CONTENT_AIR: ContentId = 126;

/// Brightest value reachable by spreading.
pub const LIGHT_MAX: u8 = 14;
/// Reserved for nodes lit directly by the sky.
pub const LIGHT_SUN: u8 = 15;

pub const LIQUID_LEVEL_MASK: u8 = 0x07;
pub const LIQUID_FLOW_DOWN_MASK: u8 = 0x08;
pub const LIQUID_LEVEL_MAX: i8 = 7;
pub const LIQUID_LEVEL_SOURCE: i8 = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LightBank {
    Day,
    Night,
}

impl LightBank {
    pub const ALL: [LightBank; 2] = [LightBank::Day, LightBank::Night];
}

/// One step of light decay through a transparent node.
#[inline]
pub fn diminish_light(light: u8) -> u8 {
    if light == 0 {
        0
    } else if light >= LIGHT_MAX {
        LIGHT_MAX - 1
    } else {
        light - 1
    }
}

/// Inverse of `diminish_light` for comparisons; saturates at `LIGHT_MAX` and above.
#[inline]
pub fn undiminish_light(light: u8) -> u8 {
    if light == 0 || light >= LIGHT_MAX {
        light
    } else {
        light + 1
    }
}

/// The smallest unit of world state.
///
/// `param1` holds the two light nibbles (DAY low, NIGHT high) for content whose
/// `param_type` is `Light`. `param2` holds the liquid level and flow-down flag for
/// flowing liquids, or a content-specific code otherwise.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Node {
    pub content: ContentId,
    pub param1: u8,
    pub param2: u8,
}

impl Default for Node {
    fn default() -> Self {
        Node::AIR
    }
}

impl Node {
    pub const AIR: Node = Node {
        content: CONTENT_AIR,
        param1: 0,
        param2: 0,
    };
    pub const IGNORE: Node = Node {
        content: CONTENT_IGNORE,
        param1: 0,
        param2: 0,
    };

    #[inline]
    pub const fn new(content: ContentId) -> Self {
        Node {
            content,
            param1: 0,
            param2: 0,
        }
    }

    #[inline]
    pub const fn with_params(content: ContentId, param1: u8, param2: u8) -> Self {
        Node {
            content,
            param1,
            param2,
        }
    }

    #[inline]
    pub fn is_ignore(&self) -> bool {
        self.content == CONTENT_IGNORE
    }

    /// Brightest of stored light and the content's own emission.
    pub fn light(&self, bank: LightBank, defs: &dyn ContentDefs) -> u8 {
        let f = defs.get(self.content);
        let stored = if f.param_type == ParamType::Light {
            match bank {
                LightBank::Day => self.param1 & 0x0f,
                LightBank::Night => (self.param1 >> 4) & 0x0f,
            }
        } else {
            0
        };
        stored.max(f.light_source)
    }

    /// Store a light value. No-op for content that carries no light data.
    pub fn set_light(&mut self, bank: LightBank, light: u8, defs: &dyn ContentDefs) {
        if defs.get(self.content).param_type != ParamType::Light {
            return;
        }
        let light = light & 0x0f;
        match bank {
            LightBank::Day => self.param1 = (self.param1 & 0xf0) | light,
            LightBank::Night => self.param1 = (self.param1 & 0x0f) | (light << 4),
        }
    }

    /// Liquid fill level stored in `param2` (meaningful for flowing liquid only).
    #[inline]
    pub fn liquid_level(&self) -> u8 {
        self.param2 & LIQUID_LEVEL_MASK
    }

    #[inline]
    pub fn is_flowing_down(&self) -> bool {
        self.param2 & LIQUID_FLOW_DOWN_MASK == LIQUID_FLOW_DOWN_MASK
    }
}
