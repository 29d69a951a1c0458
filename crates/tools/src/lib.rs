//! Developer tooling: world inspector and occupancy dumps.
//!
//! # Invariants
//! - Tools only read world state.

mod inspector;

pub use inspector::{ActorInfo, TraitInfo, WorldInspector, WorldSummary};
