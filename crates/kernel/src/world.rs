use cellworld_common::{ActorId, MPos, Order, WPos};
use cellworld_map::{Path, Space, WorldMap};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use crate::actor::Actor;
use crate::capability::{Capability, Trait};
use crate::dictionary::{TraitDictionary, TraitHandle, TraitInstance};
use crate::error::{KernelError, KernelResult};

/// Work queued to run once after the current tick's trait updates.
pub type FrameEndTask = Box<dyn FnOnce(&mut World) -> KernelResult<()>>;

/// The authoritative simulation state.
///
/// Owns the actors, the trait dictionary and the world map. All lifecycle
/// changes go through `add_to_world`/`remove_from_world`; all movement goes
/// through `move_actor`, which keeps actor positions and map occupancy in step.
///
/// Traits are `Rc<RefCell<_>>`, so a `World` never leaves the thread that
/// built it.
pub struct World {
    actors: BTreeMap<ActorId, Actor>,
    traits: TraitDictionary,
    map: Box<dyn WorldMap>,
    next_actor_id: ActorId,
    frame_end_tasks: VecDeque<FrameEndTask>,
    tick: u64,
}

impl World {
    /// Create an empty world over the given map.
    pub fn new(map: impl WorldMap + 'static) -> Self {
        Self {
            actors: BTreeMap::new(),
            traits: TraitDictionary::new(),
            map: Box::new(map),
            next_actor_id: ActorId(0),
            frame_end_tasks: VecDeque::new(),
            tick: 0,
        }
    }

    /// Number of completed or in-progress ticks.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn world_map(&self) -> &dyn WorldMap {
        self.map.as_ref()
    }

    /// Direct map access. Changes made here bypass actor positions; prefer
    /// `move_actor`/`place_actor` for joined actors.
    pub fn world_map_mut(&mut self) -> &mut dyn WorldMap {
        self.map.as_mut()
    }

    pub fn traits(&self) -> &TraitDictionary {
        &self.traits
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Every actor record, joined or not, in id order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Number of joined actors.
    pub fn actor_count(&self) -> usize {
        self.actors.values().filter(|a| a.is_alive()).count()
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.actors.get(&id).is_some_and(Actor::is_alive)
    }

    pub fn pending_tasks(&self) -> usize {
        self.frame_end_tasks.len()
    }

    /// Allocate a new, not yet joined actor.
    pub fn spawn_actor(&mut self, position: WPos) -> ActorId {
        let id = self.next_actor_id;
        self.next_actor_id = id.next();
        self.actors.insert(id, Actor::new(id, position));
        tracing::trace!(actor = %id, %position, "actor constructed");
        id
    }

    /// Attach a trait to an actor that has not joined yet.
    pub fn attach_trait(&mut self, actor: ActorId, instance: TraitInstance) -> KernelResult<TraitHandle> {
        let record = self.actors.get(&actor).ok_or(KernelError::ActorNotFound(actor))?;
        if record.is_alive() {
            return Err(KernelError::AlreadyInWorld(actor));
        }
        self.traits.add_trait(actor, instance)
    }

    /// Join an actor: register its footprint on the map, then notify its
    /// interested traits.
    pub fn add_to_world(&mut self, actor: ActorId) -> KernelResult<()> {
        let record = self.actors.get(&actor).ok_or(KernelError::ActorNotFound(actor))?;
        if record.is_alive() {
            return Err(KernelError::AlreadyInWorld(actor));
        }
        let position = record.position();
        let footprint = self.collect_footprint(actor)?;

        self.map.register(actor, position, &footprint)?;
        if let Some(record) = self.actors.get_mut(&actor) {
            record.set_alive(true);
        }
        tracing::debug!(%actor, %position, spaces = footprint.len(), "actor joined world");

        let notify = self.traits.get_traits_implementing(actor, Capability::NotifyAdded);
        self.dispatch(notify, false, |t, world| match t.as_added_notifier() {
            Some(n) => n.notify_added(world, actor),
            None => Ok(()),
        })
    }

    /// Leave: deregister from the map, notify, then purge the actor's traits
    /// and record.
    pub fn remove_from_world(&mut self, actor: ActorId) -> KernelResult<()> {
        let record = self.actors.get(&actor).ok_or(KernelError::ActorNotFound(actor))?;
        if !record.is_alive() {
            return Err(KernelError::NotInWorld(actor));
        }

        self.map.deregister(actor)?;
        if let Some(record) = self.actors.get_mut(&actor) {
            record.set_alive(false);
        }

        let notify = self.traits.get_traits_implementing(actor, Capability::NotifyRemoved);
        let notified = self.dispatch(notify, false, |t, world| match t.as_removed_notifier() {
            Some(n) => n.notify_removed(world, actor),
            None => Ok(()),
        });

        let purged = self.traits.remove_actor(actor);
        self.actors.remove(&actor);
        tracing::debug!(%actor, traits = purged, "actor left world");
        notified
    }

    /// Drop an actor that never joined (or failed to finish construction).
    pub fn discard_actor(&mut self, actor: ActorId) -> KernelResult<()> {
        let record = self.actors.get(&actor).ok_or(KernelError::ActorNotFound(actor))?;
        if record.is_alive() {
            return Err(KernelError::AlreadyInWorld(actor));
        }
        self.traits.remove_actor(actor);
        self.actors.remove(&actor);
        tracing::trace!(%actor, "actor discarded");
        Ok(())
    }

    /// Queue a task to run after this tick's trait updates.
    pub fn add_frame_end_task(&mut self, task: impl FnOnce(&mut World) -> KernelResult<()> + 'static) {
        self.frame_end_tasks.push_back(Box::new(task));
    }

    /// Advance one tick: every tick-capable trait once, in dictionary order,
    /// then the frame-end tasks in FIFO order. Tasks queued while the queue
    /// drains run on the next tick. A failing task is dropped and its error
    /// returned; the tasks behind it stay queued for the next tick.
    pub fn tick(&mut self, delta: f32) -> KernelResult<()> {
        self.tick += 1;
        let _span = tracing::info_span!("world_tick", tick = self.tick).entered();

        let tickers = self.traits.get_all_traits_implementing(Capability::Tick);
        tracing::trace!(tickers = tickers.len(), delta, "dispatching tick");
        self.dispatch(tickers, true, |t, world| match t.as_ticker() {
            Some(ticker) => ticker.tick(world, delta),
            None => Ok(()),
        })?;

        let due = self.frame_end_tasks.len();
        if due > 0 {
            tracing::trace!(tasks = due, "running frame end tasks");
        }
        for _ in 0..due {
            let Some(task) = self.frame_end_tasks.pop_front() else {
                break;
            };
            if let Err(err) = task(self) {
                tracing::warn!(%err, left = self.frame_end_tasks.len(), "frame end task failed");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Broadcast an order to every resolver in the world.
    pub fn issue_global_order(&mut self, mut order: Order) -> KernelResult<()> {
        order.set_global(true);
        let resolvers = self.traits.get_all_traits_implementing(Capability::ResolveOrder);
        tracing::debug!(kind = %order.kind, resolvers = resolvers.len(), "global order");
        self.dispatch(resolvers, true, |t, world| match t.as_order_resolver() {
            Some(r) => r.resolve_order(world, &order),
            None => Ok(()),
        })
    }

    /// Send an order to the resolvers of one joined actor.
    pub fn issue_order(&mut self, actor: ActorId, mut order: Order) -> KernelResult<()> {
        self.require_alive(actor)?;
        order.set_global(false);
        let resolvers = self.traits.get_traits_implementing(actor, Capability::ResolveOrder);
        tracing::debug!(%actor, kind = %order.kind, resolvers = resolvers.len(), "order");
        self.dispatch(resolvers, true, |t, world| match t.as_order_resolver() {
            Some(r) => r.resolve_order(world, &order),
            None => Ok(()),
        })
    }

    /// Single-step path for a joined actor, using its registered footprint.
    pub fn get_path(&self, actor: ActorId, from: MPos, to: MPos) -> KernelResult<Path> {
        let record = self.actors.get(&actor).ok_or(KernelError::ActorNotFound(actor))?;
        let footprint = match self.map.footprint_of(actor) {
            Some(spaces) => spaces.to_vec(),
            None => self.collect_footprint(actor)?,
        };
        Ok(self.map.get_path(actor, record.position(), &footprint, from, to))
    }

    /// Move a joined actor along `path`, then tell its move notifiers.
    pub fn move_actor(&mut self, actor: ActorId, path: &Path, percent: f32) -> KernelResult<WPos> {
        self.require_alive(actor)?;
        let new = self.map.move_actor(actor, path, percent)?;
        let old = match self.actors.get_mut(&actor) {
            Some(record) => {
                let old = record.position();
                record.set_position(new);
                old
            }
            None => return Err(KernelError::ActorNotFound(actor)),
        };

        let notify = self.traits.get_traits_implementing(actor, Capability::NotifyMove);
        self.dispatch(notify, true, |t, world| match t.as_move_notifier() {
            Some(n) => n.notify_move(world, old, new),
            None => Ok(()),
        })?;
        Ok(new)
    }

    /// Put an actor somewhere without a path. Joined actors are re-registered
    /// with the footprint they joined with.
    pub fn place_actor(&mut self, actor: ActorId, position: WPos) -> KernelResult<()> {
        let alive = self.actors.get(&actor).ok_or(KernelError::ActorNotFound(actor))?.is_alive();
        if alive {
            let footprint = self
                .map
                .footprint_of(actor)
                .map(<[Space]>::to_vec)
                .unwrap_or_default();
            self.map.deregister(actor)?;
            self.map.register(actor, position, &footprint)?;
        }
        if let Some(record) = self.actors.get_mut(&actor) {
            record.set_position(position);
        }
        Ok(())
    }

    /// The single trait of concrete kind `T` on an actor.
    pub fn get_trait<T: Trait>(&self, actor: ActorId) -> KernelResult<Rc<RefCell<T>>> {
        self.traits.get_trait::<T>(actor)
    }

    pub fn get_trait_implementing(&self, actor: ActorId, capability: Capability) -> KernelResult<TraitHandle> {
        self.traits.get_trait_implementing(actor, capability)
    }

    pub fn get_traits_implementing(&self, actor: ActorId, capability: Capability) -> Vec<TraitHandle> {
        self.traits.get_traits_implementing(actor, capability)
    }

    /// Capability query across the world; safe between ticks.
    pub fn get_all_traits_implementing(&self, capability: Capability) -> Vec<TraitHandle> {
        self.traits.get_all_traits_implementing(capability)
    }

    fn require_alive(&self, actor: ActorId) -> KernelResult<()> {
        match self.actors.get(&actor) {
            None => Err(KernelError::ActorNotFound(actor)),
            Some(record) if !record.is_alive() => Err(KernelError::NotInWorld(actor)),
            Some(_) => Ok(()),
        }
    }

    fn collect_footprint(&self, actor: ActorId) -> KernelResult<Vec<Space>> {
        let mut spaces = Vec::new();
        for handle in self.traits.get_traits_implementing(actor, Capability::OccupySpace) {
            let guard = handle.try_borrow()?;
            if let Some(occupier) = guard.as_occupy_space() {
                spaces.extend(occupier.spaces());
            }
        }
        Ok(spaces)
    }

    /// Call `f` on each handle in order. With `live_only`, traits whose owner
    /// has left (possibly earlier in this same pass) are skipped.
    fn dispatch(
        &mut self,
        handles: Vec<TraitHandle>,
        live_only: bool,
        mut f: impl FnMut(&mut (dyn Trait + 'static), &mut World) -> KernelResult<()>,
    ) -> KernelResult<()> {
        for handle in handles {
            if live_only && !self.is_alive(handle.owner()) {
                continue;
            }
            let mut guard = handle.try_borrow_mut()?;
            f(&mut *guard, self)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{
        AddedNotifier, MoveNotifier, OccupySpace, OrderResolver, RemovedNotifier, Ticker,
    };
    use cellworld_map::GridWorldMap;
    use std::cell::Cell;

    fn world10() -> World {
        World::new(GridWorldMap::with_size(10, 10, 1.0, 1.0).unwrap())
    }

    fn at(x: u32, y: u32) -> WPos {
        WPos::planar(x as f32, y as f32)
    }

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every callback it receives into a shared log.
    struct Probe {
        name: &'static str,
        log: Log,
    }

    impl Probe {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: log.clone(),
            }
        }

        fn note(&self, what: String) {
            self.log.borrow_mut().push(format!("{}:{what}", self.name));
        }
    }

    impl Trait for Probe {
        fn as_ticker(&mut self) -> Option<&mut dyn Ticker> {
            Some(self)
        }
        fn as_order_resolver(&mut self) -> Option<&mut dyn OrderResolver> {
            Some(self)
        }
        fn as_added_notifier(&mut self) -> Option<&mut dyn AddedNotifier> {
            Some(self)
        }
        fn as_removed_notifier(&mut self) -> Option<&mut dyn RemovedNotifier> {
            Some(self)
        }
        fn as_move_notifier(&mut self) -> Option<&mut dyn MoveNotifier> {
            Some(self)
        }
    }

    impl Ticker for Probe {
        fn tick(&mut self, _world: &mut World, _delta: f32) -> KernelResult<()> {
            self.note("tick".into());
            Ok(())
        }
    }

    impl OrderResolver for Probe {
        fn resolve_order(&mut self, _world: &mut World, order: &Order) -> KernelResult<()> {
            self.note(format!("{}{}", order.kind, if order.is_global() { "*" } else { "" }));
            Ok(())
        }
    }

    impl AddedNotifier for Probe {
        fn notify_added(&mut self, _world: &mut World, _owner: ActorId) -> KernelResult<()> {
            self.note("added".into());
            Ok(())
        }
    }

    impl RemovedNotifier for Probe {
        fn notify_removed(&mut self, _world: &mut World, _owner: ActorId) -> KernelResult<()> {
            self.note("removed".into());
            Ok(())
        }
    }

    impl MoveNotifier for Probe {
        fn notify_move(&mut self, _world: &mut World, old: WPos, new: WPos) -> KernelResult<()> {
            self.note(format!("move {}->{}", old.x, new.x));
            Ok(())
        }
    }

    struct Block;
    impl Trait for Block {
        fn as_occupy_space(&self) -> Option<&dyn OccupySpace> {
            Some(self)
        }
    }
    impl OccupySpace for Block {
        fn spaces(&self) -> Vec<Space> {
            vec![Space::cell(WPos::ZERO)]
        }
    }

    /// Counts orders; shared counter so tests can read it after routing.
    struct Counter(Rc<Cell<u32>>);
    impl Trait for Counter {
        fn as_order_resolver(&mut self) -> Option<&mut dyn OrderResolver> {
            Some(self)
        }
    }
    impl OrderResolver for Counter {
        fn resolve_order(&mut self, _world: &mut World, _order: &Order) -> KernelResult<()> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    fn joined(world: &mut World, position: WPos, traits: Vec<TraitInstance>) -> ActorId {
        let id = world.spawn_actor(position);
        for t in traits {
            world.attach_trait(id, t).unwrap();
        }
        world.add_to_world(id).unwrap();
        id
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let mut w = world10();
        let a = w.spawn_actor(WPos::ZERO);
        let b = w.spawn_actor(WPos::ZERO);
        assert!(a < b);
        w.discard_actor(a).unwrap();
        assert!(w.spawn_actor(WPos::ZERO) > b);
    }

    #[test]
    fn join_and_leave_lifecycle() {
        let log = Log::default();
        let mut w = world10();
        let id = joined(&mut w, at(2, 2), vec![TraitInstance::new(Probe::new("p", &log)), TraitInstance::new(Block)]);
        assert!(w.is_alive(id));
        assert_eq!(w.world_map().occupants_at(MPos::new(2, 2)).len(), 1);

        w.remove_from_world(id).unwrap();
        assert_eq!(*log.borrow(), ["p:added", "p:removed"]);
        assert!(w.actor(id).is_none());
        assert!(!w.traits().contains_actor(id));
        assert!(w.world_map().occupants_at(MPos::new(2, 2)).is_empty());
        assert!(!w.world_map().is_registered(id));
    }

    #[test]
    fn lifecycle_contract_violations() {
        let mut w = world10();
        let id = w.spawn_actor(WPos::ZERO);
        assert!(matches!(w.remove_from_world(id), Err(KernelError::NotInWorld(_))));
        w.add_to_world(id).unwrap();
        assert!(matches!(w.add_to_world(id), Err(KernelError::AlreadyInWorld(_))));
        assert!(matches!(
            w.attach_trait(id, TraitInstance::new(Block)),
            Err(KernelError::AlreadyInWorld(_))
        ));
        assert!(matches!(
            w.remove_from_world(ActorId(99)),
            Err(KernelError::ActorNotFound(_))
        ));
    }

    #[test]
    fn tick_dispatches_in_actor_order_then_runs_tasks() {
        let log = Log::default();
        let mut w = world10();
        joined(&mut w, at(0, 0), vec![TraitInstance::new(Probe::new("a", &log))]);
        joined(&mut w, at(1, 0), vec![TraitInstance::new(Probe::new("b", &log))]);
        log.borrow_mut().clear();

        let task_log = log.clone();
        w.add_frame_end_task(move |_| {
            task_log.borrow_mut().push("task1".into());
            Ok(())
        });
        let task_log = log.clone();
        w.add_frame_end_task(move |_| {
            task_log.borrow_mut().push("task2".into());
            Ok(())
        });

        w.tick(0.016).unwrap();
        assert_eq!(*log.borrow(), ["a:tick", "b:tick", "task1", "task2"]);
        assert_eq!(w.pending_tasks(), 0);
        assert_eq!(w.tick_count(), 1);
    }

    #[test]
    fn empty_tick_still_drains_tasks() {
        let mut w = world10();
        let ran = Rc::new(Cell::new(0));
        let seen = ran.clone();
        w.add_frame_end_task(move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        });
        w.tick(1.0).unwrap();
        w.tick(1.0).unwrap();
        assert_eq!(ran.get(), 1);
    }

    #[test]
    fn tasks_queued_while_draining_wait_for_next_tick() {
        let mut w = world10();
        let ran = Rc::new(Cell::new(0));
        let seen = ran.clone();
        w.add_frame_end_task(move |world| {
            let inner = seen.clone();
            world.add_frame_end_task(move |_| {
                inner.set(inner.get() + 1);
                Ok(())
            });
            Ok(())
        });
        w.tick(1.0).unwrap();
        assert_eq!(ran.get(), 0);
        assert_eq!(w.pending_tasks(), 1);
        w.tick(1.0).unwrap();
        assert_eq!(ran.get(), 1);
    }

    #[test]
    fn failed_task_leaves_the_rest_queued() {
        let mut w = world10();
        let ran = Rc::new(Cell::new(false));
        let seen = ran.clone();
        w.add_frame_end_task(|_| Err(KernelError::ActorNotFound(ActorId(7))));
        w.add_frame_end_task(move |_| {
            seen.set(true);
            Ok(())
        });

        assert!(matches!(w.tick(1.0), Err(KernelError::ActorNotFound(ActorId(7)))));
        assert!(!ran.get());
        assert_eq!(w.pending_tasks(), 1);

        w.tick(1.0).unwrap();
        assert!(ran.get());
        assert_eq!(w.pending_tasks(), 0);
    }

    #[test]
    fn global_orders_reach_everyone_targeted_orders_one_actor() {
        let mut w = world10();
        let counters: Vec<Rc<Cell<u32>>> = (0..3).map(|_| Rc::new(Cell::new(0))).collect();
        let ids: Vec<ActorId> = counters
            .iter()
            .enumerate()
            .map(|(i, c)| joined(&mut w, at(i as u32, 0), vec![TraitInstance::new(Counter(c.clone()))]))
            .collect();

        w.issue_global_order(Order::new("halt")).unwrap();
        assert!(counters.iter().all(|c| c.get() == 1));

        w.issue_order(ids[1], Order::new("stop")).unwrap();
        let counts: Vec<u32> = counters.iter().map(|c| c.get()).collect();
        assert_eq!(counts, [1, 2, 1]);
    }

    #[test]
    fn orders_carry_routing_flag() {
        let log = Log::default();
        let mut w = world10();
        let id = joined(&mut w, at(0, 0), vec![TraitInstance::new(Probe::new("p", &log))]);
        log.borrow_mut().clear();

        w.issue_global_order(Order::new("halt")).unwrap();
        w.issue_order(id, Order::new("go")).unwrap();
        assert_eq!(*log.borrow(), ["p:halt*", "p:go"]);
    }

    #[test]
    fn orders_to_unjoined_actors_fail() {
        let mut w = world10();
        let id = w.spawn_actor(WPos::ZERO);
        assert!(matches!(w.issue_order(id, Order::new("go")), Err(KernelError::NotInWorld(_))));
    }

    /// Removes a victim actor the first time it ticks.
    struct Assassin(ActorId);
    impl Trait for Assassin {
        fn as_ticker(&mut self) -> Option<&mut dyn Ticker> {
            Some(self)
        }
    }
    impl Ticker for Assassin {
        fn tick(&mut self, world: &mut World, _delta: f32) -> KernelResult<()> {
            if world.is_alive(self.0) {
                world.remove_from_world(self.0)?;
            }
            Ok(())
        }
    }

    #[test]
    fn actors_removed_mid_tick_are_not_ticked() {
        let log = Log::default();
        let mut w = world10();
        let killer = w.spawn_actor(WPos::ZERO);
        let victim = joined(&mut w, at(1, 1), vec![TraitInstance::new(Probe::new("v", &log))]);
        w.attach_trait(killer, TraitInstance::new(Assassin(victim))).unwrap();
        w.add_to_world(killer).unwrap();
        log.borrow_mut().clear();

        // Killer has the lower id, so it ticks first.
        w.tick(1.0).unwrap();
        assert_eq!(*log.borrow(), ["v:removed"]);
    }

    /// Sends an order to its own actor while ticking.
    struct Echo(ActorId);
    impl Trait for Echo {
        fn as_ticker(&mut self) -> Option<&mut dyn Ticker> {
            Some(self)
        }
        fn as_order_resolver(&mut self) -> Option<&mut dyn OrderResolver> {
            Some(self)
        }
    }
    impl Ticker for Echo {
        fn tick(&mut self, world: &mut World, _delta: f32) -> KernelResult<()> {
            world.issue_order(self.0, Order::new("echo"))
        }
    }
    impl OrderResolver for Echo {
        fn resolve_order(&mut self, _world: &mut World, _order: &Order) -> KernelResult<()> {
            Ok(())
        }
    }

    #[test]
    fn reentrant_dispatch_is_reported() {
        let mut w = world10();
        let id = w.spawn_actor(WPos::ZERO);
        w.attach_trait(id, TraitInstance::new(Echo(id))).unwrap();
        w.add_to_world(id).unwrap();
        assert!(matches!(w.tick(1.0), Err(KernelError::TraitBusy { .. })));
    }

    #[test]
    fn move_updates_position_occupancy_and_notifies() {
        let log = Log::default();
        let mut w = world10();
        let id = joined(&mut w, at(2, 2), vec![TraitInstance::new(Block), TraitInstance::new(Probe::new("m", &log))]);
        log.borrow_mut().clear();

        let path = w.get_path(id, MPos::new(2, 2), MPos::new(3, 2)).unwrap();
        assert!(!path.is_blocked());
        let new = w.move_actor(id, &path, 1.0).unwrap();

        assert_eq!(new, at(3, 2));
        assert_eq!(w.actor(id).unwrap().position(), at(3, 2));
        assert!(w.world_map().occupants_at(MPos::new(2, 2)).is_empty());
        assert_eq!(w.world_map().occupants_at(MPos::new(3, 2))[0].owner, id);
        assert_eq!(*log.borrow(), ["m:move 2->3"]);
    }

    #[test]
    fn blocked_path_then_clear_and_move() {
        let mut w = world10();
        let a = joined(&mut w, at(2, 2), vec![TraitInstance::new(Block)]);
        let b = joined(&mut w, at(3, 2), vec![TraitInstance::new(Block)]);

        let blocked = w.get_path(b, MPos::new(2, 2), MPos::new(3, 2)).unwrap();
        // b stands at (3,2); stepping by +1 lands on (4,2), which is free.
        assert!(!blocked.is_blocked());
        let blocked = w.get_path(a, MPos::new(2, 2), MPos::new(3, 2)).unwrap();
        assert_eq!(blocked.first(), blocked.last());

        w.remove_from_world(b).unwrap();
        let path = w.get_path(a, MPos::new(2, 2), MPos::new(3, 2)).unwrap();
        w.move_actor(a, &path, 1.0).unwrap();
        let occupants = w.world_map().occupants_at(MPos::new(3, 2));
        assert_eq!(occupants.len(), 1);
        assert_eq!(occupants[0].owner, a);
    }

    #[test]
    fn foreign_paths_are_rejected() {
        let mut w = world10();
        let other = world10();
        let id = joined(&mut w, at(1, 1), vec![TraitInstance::new(Block)]);
        let other_id = ActorId(0);
        let path = other
            .world_map()
            .get_path(other_id, at(1, 1), &[], MPos::new(1, 1), MPos::new(2, 1));
        assert!(matches!(
            w.move_actor(id, &path, 1.0),
            Err(KernelError::Map(cellworld_map::MapError::ForeignPath { .. }))
        ));
    }

    #[test]
    fn place_actor_reregisters_joined_actor() {
        let mut w = world10();
        let id = joined(&mut w, at(0, 0), vec![TraitInstance::new(Block)]);
        w.place_actor(id, at(5, 5)).unwrap();
        assert!(w.world_map().occupants_at(MPos::new(0, 0)).is_empty());
        assert_eq!(w.world_map().occupants_at(MPos::new(5, 5)).len(), 1);
        assert_eq!(w.actor(id).unwrap().position(), at(5, 5));
    }

    #[test]
    fn typed_trait_lookup_through_world() {
        let mut w = world10();
        let counter = Rc::new(Cell::new(0));
        let id = joined(&mut w, at(0, 0), vec![TraitInstance::new(Counter(counter))]);
        assert!(w.get_trait::<Counter>(id).is_ok());
        assert!(w.get_trait::<Block>(id).is_err());
        assert_eq!(w.get_all_traits_implementing(Capability::ResolveOrder).len(), 1);
    }
}
