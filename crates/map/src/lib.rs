//! World map: spatial partition of continuous world space into a fixed grid.
//!
//! # Invariants
//! - Cells are created once at construction and never resized.
//! - Every cell's occupant list is sorted by owning actor id.
//! - An actor's occupants are removed from every cell they were placed in
//!   before being placed anywhere else.
//! - `convert_to_mpos` always yields an in-grid cell (clamping); use
//!   `try_convert_to_mpos` or the `inside_map_*` checks for strict bounds.
//!
//! The map knows nothing about traits. Callers hand it an actor's footprint
//! (a list of [`Space`]s) when registering or asking for a path.

mod config;
mod error;
mod grid;
mod path;
mod space;

pub use config::{GridConfig, RectTest};
pub use error::MapError;
pub use grid::{Cell, GridWorldMap, Neighbors};
pub use path::{MapId, Path, PathNode};
pub use space::{Occupant, Shape, Space};

use cellworld_common::{ActorId, MPos, WPos};

/// Spatial index the world drives actors through.
///
/// `GridWorldMap` is the only implementation shipped; the trait is the seam a
/// different partition (or a map with real path search) plugs into.
pub trait WorldMap {
    /// Identity stamped onto every [`Path`] this map builds.
    fn id(&self) -> MapId;

    /// Grid size in cells.
    fn dimensions(&self) -> (u32, u32);

    /// Size of one cell in world units.
    fn cell_size(&self) -> (f32, f32);

    /// Origin corner of a cell.
    fn convert_to_wpos(&self, m: MPos) -> WPos;

    /// Cell containing a world position, clamped into the grid.
    fn convert_to_mpos(&self, w: WPos) -> MPos;

    /// Cell containing a world position, failing instead of clamping.
    fn try_convert_to_mpos(&self, w: WPos) -> Result<MPos, MapError> {
        if self.inside_map_wpos(w) {
            Ok(self.convert_to_mpos(w))
        } else {
            Err(MapError::OutOfBounds { x: w.x, y: w.y })
        }
    }

    fn inside_map_wpos(&self, w: WPos) -> bool;

    fn inside_map_mpos(&self, m: MPos) -> bool;

    /// Place an actor's footprint at `position`.
    fn register(&mut self, actor: ActorId, position: WPos, footprint: &[Space]) -> Result<(), MapError>;

    /// Remove every occupant the actor placed.
    fn deregister(&mut self, actor: ActorId) -> Result<(), MapError>;

    /// Remove occupancy, move to `path.wpos(percent)`, re-add occupancy.
    /// Returns the new position.
    fn move_actor(&mut self, actor: ActorId, path: &Path, percent: f32) -> Result<WPos, MapError>;

    /// Single-step path from `from` to `to` for an actor standing at
    /// `position` with the given footprint.
    fn get_path(&self, actor: ActorId, position: WPos, footprint: &[Space], from: MPos, to: MPos) -> Path;

    /// Occupants of a cell, sorted by owner. Empty for out-of-grid cells.
    fn occupants_at(&self, m: MPos) -> &[Occupant];

    /// Footprint recorded when the actor was registered.
    fn footprint_of(&self, actor: ActorId) -> Option<&[Space]>;

    fn is_registered(&self, actor: ActorId) -> bool {
        self.footprint_of(actor).is_some()
    }
}
