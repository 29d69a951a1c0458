use cellworld_common::ActorId;

use crate::path::MapId;

/// Errors from world map operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("invalid grid dimensions: {width}x{height} cells of {cell_width}x{cell_height}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        cell_width: f32,
        cell_height: f32,
    },
    #[error("position ({x}, {y}) is outside the map")]
    OutOfBounds { x: f32, y: f32 },
    #[error("path was built by map {actual}, not by map {expected}")]
    ForeignPath { expected: MapId, actual: MapId },
    #[error("actor {0} is not registered on the map")]
    NotRegistered(ActorId),
    #[error("actor {0} is already registered on the map")]
    AlreadyRegistered(ActorId),
}
