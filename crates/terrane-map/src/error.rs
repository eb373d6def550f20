use std::fmt;

use terrane_block::SerializationError;
use terrane_store::StoreError;
use terrane_world::WorldError;

#[derive(Debug)]
pub enum MapError {
    World(WorldError),
    Serialization(SerializationError),
    Store(StoreError),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::World(e) => write!(f, "{}", e),
            MapError::Serialization(e) => write!(f, "serialization: {}", e),
            MapError::Store(e) => write!(f, "store: {}", e),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::World(e) => Some(e),
            MapError::Serialization(e) => Some(e),
            MapError::Store(e) => Some(e),
        }
    }
}

impl From<WorldError> for MapError {
    fn from(e: WorldError) -> Self {
        MapError::World(e)
    }
}

impl From<SerializationError> for MapError {
    fn from(e: SerializationError) -> Self {
        MapError::Serialization(e)
    }
}

impl From<StoreError> for MapError {
    fn from(e: StoreError) -> Self {
        MapError::Store(e)
    }
}
