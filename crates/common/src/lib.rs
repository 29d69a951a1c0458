//! Shared primitives used by every cellworld crate.
//!
//! Kept dependency-light so the map, kernel, and collaborator crates can all
//! agree on positions, identifiers, and orders without importing each other.

pub mod geometry;
pub mod order;
pub mod render;
pub mod types;

pub use geometry::{MPos, WPos};
pub use order::Order;
pub use render::{Mesh, Renderable, from_color, to_color};
pub use types::{ActorId, Parameters};
