//! Trait storage with capability-indexed lookup.
//!
//! # Invariants
//! - A kind's capability set is computed the first time the kind is added
//!   and reused for every later instance.
//! - Enumeration order is ascending actor id, then insertion order within
//!   the actor, for every query.
//! - `remove_actor` leaves no entry for the actor in any index.

use cellworld_common::ActorId;
use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::capability::{Capability, CapabilitySet, Trait};
use crate::error::{KernelError, KernelResult};

/// Shared, single-threaded handle to a type-erased trait.
pub type TraitRef = Rc<RefCell<dyn Trait>>;

/// A constructed trait that is not attached to an actor yet.
#[derive(Clone)]
pub struct TraitInstance {
    kind: TypeId,
    kind_name: &'static str,
    cell: TraitRef,
    any: Rc<dyn Any>,
}

impl TraitInstance {
    pub fn new<T: Trait>(value: T) -> Self {
        let rc = Rc::new(RefCell::new(value));
        Self {
            kind: TypeId::of::<T>(),
            kind_name: std::any::type_name::<T>(),
            cell: rc.clone(),
            any: rc,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind_name
    }

    /// Mutable access before the trait is attached, used for `initialize`.
    pub fn borrow_mut(&self) -> RefMut<'_, dyn Trait> {
        self.cell.borrow_mut()
    }
}

/// A trait attached to an actor, as returned by dictionary queries.
#[derive(Clone)]
pub struct TraitHandle {
    owner: ActorId,
    capabilities: CapabilitySet,
    instance: TraitInstance,
}

impl TraitHandle {
    pub fn owner(&self) -> ActorId {
        self.owner
    }

    pub fn kind_name(&self) -> &'static str {
        self.instance.kind_name
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn implements(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn is<T: Trait>(&self) -> bool {
        self.instance.kind == TypeId::of::<T>()
    }

    /// Shared access; fails if the trait is currently being dispatched.
    pub fn try_borrow(&self) -> KernelResult<Ref<'_, dyn Trait>> {
        self.instance.cell.try_borrow().map_err(|_| self.busy())
    }

    /// Exclusive access; fails if the trait is already borrowed.
    pub fn try_borrow_mut(&self) -> KernelResult<RefMut<'_, dyn Trait>> {
        self.instance.cell.try_borrow_mut().map_err(|_| self.busy())
    }

    /// Typed handle, if the trait is of concrete kind `T`.
    pub fn downcast<T: Trait>(&self) -> Option<Rc<RefCell<T>>> {
        self.instance.any.clone().downcast::<RefCell<T>>().ok()
    }

    fn busy(&self) -> KernelError {
        KernelError::TraitBusy {
            actor: self.owner,
            kind: self.instance.kind_name,
        }
    }
}

impl fmt::Debug for TraitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitHandle")
            .field("owner", &self.owner)
            .field("kind", &self.instance.kind_name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Index from actor and capability to attached traits.
#[derive(Default)]
pub struct TraitDictionary {
    by_actor: BTreeMap<ActorId, Vec<TraitHandle>>,
    by_capability: BTreeMap<Capability, BTreeMap<ActorId, Vec<TraitHandle>>>,
    kinds: HashMap<TypeId, CapabilitySet>,
}

impl TraitDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a trait to an actor. No uniqueness constraint across or within
    /// kinds.
    pub fn add_trait(&mut self, owner: ActorId, instance: TraitInstance) -> KernelResult<TraitHandle> {
        let capabilities = match self.kinds.get(&instance.kind) {
            Some(set) => *set,
            None => {
                let mut guard = instance.cell.try_borrow_mut().map_err(|_| KernelError::TraitBusy {
                    actor: owner,
                    kind: instance.kind_name,
                })?;
                let set = CapabilitySet::probe(&mut *guard);
                drop(guard);
                tracing::trace!(kind = instance.kind_name, capabilities = ?set, "new trait kind");
                self.kinds.insert(instance.kind, set);
                set
            }
        };

        let handle = TraitHandle {
            owner,
            capabilities,
            instance,
        };
        self.by_actor.entry(owner).or_default().push(handle.clone());
        for capability in capabilities.iter() {
            self.by_capability
                .entry(capability)
                .or_default()
                .entry(owner)
                .or_default()
                .push(handle.clone());
        }
        Ok(handle)
    }

    /// Purge every trait of an actor. Returns how many were removed.
    pub fn remove_actor(&mut self, owner: ActorId) -> usize {
        for index in self.by_capability.values_mut() {
            index.remove(&owner);
        }
        self.by_actor.remove(&owner).map_or(0, |traits| traits.len())
    }

    /// The single trait of concrete kind `T` on the actor.
    pub fn get_trait<T: Trait>(&self, owner: ActorId) -> KernelResult<Rc<RefCell<T>>> {
        let mut matches = self.traits_of(owner).iter().filter(|h| h.is::<T>());
        let kind = || std::any::type_name::<T>().to_string();
        match (matches.next(), matches.count()) {
            (None, _) => Err(KernelError::TraitNotFound { actor: owner, kind: kind() }),
            (Some(handle), 0) => handle.downcast::<T>().ok_or_else(|| KernelError::TraitNotFound {
                actor: owner,
                kind: kind(),
            }),
            (Some(_), rest) => Err(KernelError::AmbiguousTrait {
                actor: owner,
                kind: kind(),
                count: rest + 1,
            }),
        }
    }

    /// The single trait on the actor satisfying `capability`.
    pub fn get_trait_implementing(&self, owner: ActorId, capability: Capability) -> KernelResult<TraitHandle> {
        let found = self.actor_index(owner, capability);
        match found {
            [only] => Ok(only.clone()),
            [] => Err(KernelError::TraitNotFound {
                actor: owner,
                kind: format!("{capability:?}"),
            }),
            many => Err(KernelError::AmbiguousTrait {
                actor: owner,
                kind: format!("{capability:?}"),
                count: many.len(),
            }),
        }
    }

    /// Every trait on the actor satisfying `capability`, in insertion order.
    pub fn get_traits_implementing(&self, owner: ActorId, capability: Capability) -> Vec<TraitHandle> {
        self.actor_index(owner, capability).to_vec()
    }

    /// Every trait in the dictionary satisfying `capability`.
    pub fn get_all_traits_implementing(&self, capability: Capability) -> Vec<TraitHandle> {
        self.by_capability
            .get(&capability)
            .map(|index| index.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// All traits of an actor in insertion order.
    pub fn traits_of(&self, owner: ActorId) -> &[TraitHandle] {
        self.by_actor.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_actor(&self, owner: ActorId) -> bool {
        self.by_actor.contains_key(&owner)
    }

    pub fn actor_count(&self) -> usize {
        self.by_actor.len()
    }

    pub fn trait_count(&self) -> usize {
        self.by_actor.values().map(Vec::len).sum()
    }

    /// Cached capability set of kind `T`, once an instance has been added.
    pub fn kind_capabilities<T: Trait>(&self) -> Option<CapabilitySet> {
        self.kinds.get(&TypeId::of::<T>()).copied()
    }

    fn actor_index(&self, owner: ActorId, capability: Capability) -> &[TraitHandle] {
        self.by_capability
            .get(&capability)
            .and_then(|index| index.get(&owner))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
