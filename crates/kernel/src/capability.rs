//! The `Trait` base interface and the capabilities a trait can provide.
//!
//! A trait kind advertises a capability by overriding the matching `as_*`
//! accessor. The accessors must not depend on instance state: the dictionary
//! probes them once per concrete kind and caches the result.

use cellworld_common::{ActorId, Order, Parameters, Renderable, WPos};
use cellworld_map::Space;
use std::any::Any;
use std::fmt;

use crate::error::KernelResult;
use crate::world::World;

/// Something a trait can do, used as the key for capability queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Tick,
    ResolveOrder,
    Render2D,
    OccupySpace,
    NotifyAdded,
    NotifyRemoved,
    NotifyMove,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::Tick,
        Capability::ResolveOrder,
        Capability::Render2D,
        Capability::OccupySpace,
        Capability::NotifyAdded,
        Capability::NotifyRemoved,
        Capability::NotifyMove,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Bit set of capabilities satisfied by a trait kind.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    pub fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }

    /// Ask a trait which accessors it answers.
    pub fn probe(t: &mut dyn Trait) -> Self {
        let mut set = Self::empty();
        if t.as_ticker().is_some() {
            set.insert(Capability::Tick);
        }
        if t.as_order_resolver().is_some() {
            set.insert(Capability::ResolveOrder);
        }
        if t.as_render_2d().is_some() {
            set.insert(Capability::Render2D);
        }
        if t.as_occupy_space().is_some() {
            set.insert(Capability::OccupySpace);
        }
        if t.as_added_notifier().is_some() {
            set.insert(Capability::NotifyAdded);
        }
        if t.as_removed_notifier().is_some() {
            set.insert(Capability::NotifyRemoved);
        }
        if t.as_move_notifier().is_some() {
            set.insert(Capability::NotifyMove);
        }
        set
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Self::empty();
        for c in iter {
            set.insert(c);
        }
        set
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// A behaviour or data unit attached to exactly one actor.
pub trait Trait: Any {
    /// Called once, before the trait is inserted into the dictionary.
    /// Traits declared earlier in the same actor definition are already
    /// attached and can be looked up through `world`.
    fn initialize(&mut self, world: &mut World, owner: ActorId, params: &Parameters) -> KernelResult<()> {
        let _ = (world, owner, params);
        Ok(())
    }

    fn as_ticker(&mut self) -> Option<&mut dyn Ticker> {
        None
    }

    fn as_order_resolver(&mut self) -> Option<&mut dyn OrderResolver> {
        None
    }

    fn as_render_2d(&self) -> Option<&dyn Render2D> {
        None
    }

    fn as_occupy_space(&self) -> Option<&dyn OccupySpace> {
        None
    }

    fn as_added_notifier(&mut self) -> Option<&mut dyn AddedNotifier> {
        None
    }

    fn as_removed_notifier(&mut self) -> Option<&mut dyn RemovedNotifier> {
        None
    }

    fn as_move_notifier(&mut self) -> Option<&mut dyn MoveNotifier> {
        None
    }
}

/// Called once per world tick.
pub trait Ticker {
    fn tick(&mut self, world: &mut World, delta: f32) -> KernelResult<()>;
}

/// Receives orders routed by the world.
pub trait OrderResolver {
    fn resolve_order(&mut self, world: &mut World, order: &Order) -> KernelResult<()>;
}

/// Produces shapes for the renderer.
pub trait Render2D {
    fn render_2d(&self, world: &World) -> Vec<Renderable>;
}

/// Claims cells on the world map.
pub trait OccupySpace {
    /// Footprint relative to the owner's position.
    fn spaces(&self) -> Vec<Space>;
}

pub trait AddedNotifier {
    fn notify_added(&mut self, world: &mut World, owner: ActorId) -> KernelResult<()>;
}

pub trait RemovedNotifier {
    fn notify_removed(&mut self, world: &mut World, owner: ActorId) -> KernelResult<()>;
}

/// Told after the owner has been moved on the map.
pub trait MoveNotifier {
    fn notify_move(&mut self, world: &mut World, old: WPos, new: WPos) -> KernelResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Plain;
    impl Trait for Plain {}

    #[derive(Default)]
    struct Busy;
    impl Trait for Busy {
        fn as_ticker(&mut self) -> Option<&mut dyn Ticker> {
            Some(self)
        }
        fn as_occupy_space(&self) -> Option<&dyn OccupySpace> {
            Some(self)
        }
    }
    impl Ticker for Busy {
        fn tick(&mut self, _world: &mut World, _delta: f32) -> KernelResult<()> {
            Ok(())
        }
    }
    impl OccupySpace for Busy {
        fn spaces(&self) -> Vec<Space> {
            Vec::new()
        }
    }

    #[test]
    fn probe_reads_accessors() {
        assert!(CapabilitySet::probe(&mut Plain).is_empty());
        let set = CapabilitySet::probe(&mut Busy);
        assert!(set.contains(Capability::Tick));
        assert!(set.contains(Capability::OccupySpace));
        assert!(!set.contains(Capability::Render2D));
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn set_collects_and_prints() {
        let set: CapabilitySet = [Capability::NotifyMove, Capability::Tick].into_iter().collect();
        assert_eq!(format!("{set:?}"), "{Tick, NotifyMove}");
    }
}
