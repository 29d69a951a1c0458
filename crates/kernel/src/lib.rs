//! Cellworld kernel: actors, traits, capability dispatch, the tick loop and
//! order routing.
//!
//! # Invariants
//! - All world state is owned by one thread; `World` is not `Send`.
//! - Actor ids are strictly increasing and never reused within a world.
//! - Dispatch order is ascending actor id, then trait insertion order.
//! - Only joined actors are ticked or receive orders.
//! - An actor's traits and map occupancy are gone once it leaves the world.

pub mod actor;
pub mod builtin;
pub mod capability;
pub mod dictionary;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod world;

pub use actor::Actor;
pub use capability::{
    AddedNotifier, Capability, CapabilitySet, MoveNotifier, OccupySpace, OrderResolver, RemovedNotifier, Render2D,
    Ticker, Trait,
};
pub use dictionary::{TraitDictionary, TraitHandle, TraitInstance, TraitRef};
pub use dispatch::{DispatchConfig, MainThread, MainThreadHandle};
pub use error::{KernelError, KernelResult};
pub use registry::{ActorDefinition, ActorRegistry, TraitDefinition, TraitFactory};
pub use world::{FrameEndTask, World};
