use std::fmt;

use terrane_geom::V3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldError {
    /// Block missing from memory, or a dummy.
    PositionInvalid(V3),
    /// Outside the generation limit; can never be loaded.
    OverLimit(V3),
    /// CONTENT_IGNORE cannot be stored in the world.
    IgnoreContent(V3),
}

impl WorldError {
    pub fn pos(&self) -> V3 {
        match *self {
            WorldError::PositionInvalid(p)
            | WorldError::OverLimit(p)
            | WorldError::IgnoreContent(p) => p,
        }
    }
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::PositionInvalid(p) => write!(f, "position {} is not loaded", p),
            WorldError::OverLimit(p) => write!(f, "position {} is over the generation limit", p),
            WorldError::IgnoreContent(p) => write!(f, "refusing to place ignore at {}", p),
        }
    }
}

impl std::error::Error for WorldError {}
