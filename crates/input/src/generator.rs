use cellworld_common::{ActorId, Order, WPos};
use cellworld_kernel::{KernelResult, World};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::event::{InputEvent, KeyState};

/// Order issued when a key reaches a given state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub code: u32,
    #[serde(default = "pressed")]
    pub state: KeyState,
    /// Actor to send the order to; broadcast when absent.
    #[serde(default)]
    pub target: Option<ActorId>,
    pub order: Order,
}

/// Order issued on a mouse button, aimed at the cell under the cursor.
///
/// The order kind is sent with a `{x, y}` cell payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseBinding {
    pub button: u32,
    #[serde(default = "pressed")]
    pub state: KeyState,
    #[serde(default)]
    pub target: Option<ActorId>,
    pub kind: String,
}

fn pressed() -> KeyState {
    KeyState::Pressed
}

/// An order waiting for the next `route`.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOrder {
    Order { target: Option<ActorId>, order: Order },
    /// Cell resolved against the world map at routing time.
    AtCursor {
        target: Option<ActorId>,
        kind: String,
        cursor: WPos,
    },
}

/// Maps input events to orders and queues them until the frame routes them.
#[derive(Debug, Default)]
pub struct OrderGenerator {
    keys: BTreeMap<(u32, KeyState), KeyBinding>,
    buttons: BTreeMap<(u32, KeyState), MouseBinding>,
    cursor: WPos,
    pending: VecDeque<PendingOrder>,
}

impl OrderGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a key. A later binding for the same key and state replaces the
    /// earlier one.
    pub fn bind_key(&mut self, binding: KeyBinding) {
        if let Some(old) = self.keys.insert((binding.code, binding.state), binding) {
            tracing::debug!(code = old.code, kind = %old.order.kind, "key binding replaced");
        }
    }

    pub fn bind_mouse(&mut self, binding: MouseBinding) {
        if let Some(old) = self.buttons.insert((binding.button, binding.state), binding) {
            tracing::debug!(button = old.button, kind = %old.kind, "mouse binding replaced");
        }
    }

    pub fn cursor(&self) -> WPos {
        self.cursor
    }

    pub fn pending(&self) -> &VecDeque<PendingOrder> {
        &self.pending
    }

    /// Feed one event. Returns true if it queued an order.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Key { code, state } => self.handle_key(code, state),
            InputEvent::MouseMove { position } => {
                self.cursor = position;
                false
            }
            InputEvent::MouseButton { button, state } => self.handle_mouse_button(button, state),
        }
    }

    pub fn handle_key(&mut self, code: u32, state: KeyState) -> bool {
        let Some(binding) = self.keys.get(&(code, state)) else {
            return false;
        };
        tracing::trace!(code, ?state, kind = %binding.order.kind, "key order queued");
        self.pending.push_back(PendingOrder::Order {
            target: binding.target,
            order: binding.order.clone(),
        });
        true
    }

    pub fn handle_mouse_button(&mut self, button: u32, state: KeyState) -> bool {
        let Some(binding) = self.buttons.get(&(button, state)) else {
            return false;
        };
        tracing::trace!(button, ?state, kind = %binding.kind, "cursor order queued");
        self.pending.push_back(PendingOrder::AtCursor {
            target: binding.target,
            kind: binding.kind.clone(),
            cursor: self.cursor,
        });
        true
    }

    /// Take every queued order, oldest first.
    pub fn drain(&mut self) -> Vec<PendingOrder> {
        self.pending.drain(..).collect()
    }

    /// Issue every queued order to the world. Targeted orders go to
    /// `issue_order`, the rest to `issue_global_order`. Cursor orders whose
    /// position is off the map are dropped. Returns how many were issued.
    ///
    /// An order the world rejects is dropped and its error returned; the
    /// orders behind it stay queued for the next call.
    pub fn route(&mut self, world: &mut World) -> KernelResult<usize> {
        let mut issued = 0;
        while let Some(pending) = self.pending.pop_front() {
            let (target, order) = match pending {
                PendingOrder::Order { target, order } => (target, order),
                PendingOrder::AtCursor { target, kind, cursor } => {
                    let Ok(cell) = world.world_map().try_convert_to_mpos(cursor) else {
                        tracing::debug!(%cursor, %kind, "cursor order off the map");
                        continue;
                    };
                    (target, Order::targeting(kind, cell))
                }
            };
            let kind = order.kind.clone();
            let result = match target {
                Some(actor) => world.issue_order(actor, order),
                None => world.issue_global_order(order),
            };
            if let Err(err) = result {
                tracing::warn!(%err, %kind, left = self.pending.len(), "order rejected");
                return Err(err);
            }
            issued += 1;
        }
        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellworld_common::MPos;
    use cellworld_kernel::builtin::{self, OrderCounter};
    use cellworld_kernel::{ActorDefinition, ActorRegistry, TraitDefinition};
    use cellworld_map::GridWorldMap;

    fn world_with_counters(n: usize) -> (World, Vec<ActorId>) {
        let mut reg = ActorRegistry::new();
        builtin::register_builtin_traits(&mut reg).unwrap();
        reg.register_actor(ActorDefinition::new("listener").with_trait(TraitDefinition::new(builtin::ORDER_COUNTER)))
            .unwrap();
        let mut world = World::new(GridWorldMap::with_size(4, 4, 1.0, 1.0).unwrap());
        let ids = (0..n)
            .map(|_| reg.create_actor("listener", None, &mut world, true).unwrap())
            .collect();
        (world, ids)
    }

    fn counter(world: &World, id: ActorId) -> std::rc::Rc<std::cell::RefCell<OrderCounter>> {
        world.get_trait::<OrderCounter>(id).unwrap()
    }

    #[test]
    fn unbound_keys_queue_nothing() {
        let mut generator = OrderGenerator::new();
        assert!(!generator.handle_key(7, KeyState::Pressed));
        assert!(generator.pending().is_empty());
    }

    #[test]
    fn key_state_is_part_of_the_binding() {
        let mut generator = OrderGenerator::new();
        generator.bind_key(KeyBinding {
            code: 32,
            state: KeyState::Released,
            target: None,
            order: Order::new("halt"),
        });
        assert!(!generator.handle_key(32, KeyState::Pressed));
        assert!(generator.handle_key(32, KeyState::Released));
        assert_eq!(generator.drain().len(), 1);
        assert!(generator.drain().is_empty());
    }

    #[test]
    fn routes_global_and_targeted_orders() {
        let (mut world, ids) = world_with_counters(2);
        let mut generator = OrderGenerator::new();
        generator.bind_key(KeyBinding {
            code: 1,
            state: KeyState::Pressed,
            target: None,
            order: Order::new("halt"),
        });
        generator.bind_key(KeyBinding {
            code: 2,
            state: KeyState::Pressed,
            target: Some(ids[1]),
            order: Order::new("stop"),
        });

        generator.handle_key(1, KeyState::Pressed);
        generator.handle_key(2, KeyState::Pressed);
        assert_eq!(generator.route(&mut world).unwrap(), 2);

        assert_eq!(counter(&world, ids[0]).borrow().total(), 1);
        assert_eq!(counter(&world, ids[1]).borrow().total(), 2);
        assert_eq!(counter(&world, ids[1]).borrow().global(), 1);
    }

    #[test]
    fn rejected_order_leaves_the_rest_queued() {
        let (mut world, ids) = world_with_counters(2);
        world.remove_from_world(ids[0]).unwrap();
        let mut generator = OrderGenerator::new();
        generator.bind_key(KeyBinding {
            code: 1,
            state: KeyState::Pressed,
            target: Some(ids[0]),
            order: Order::new("stop"),
        });
        generator.bind_key(KeyBinding {
            code: 2,
            state: KeyState::Pressed,
            target: Some(ids[1]),
            order: Order::new("stop"),
        });

        generator.handle_key(1, KeyState::Pressed);
        generator.handle_key(2, KeyState::Pressed);
        assert!(generator.route(&mut world).is_err());
        assert_eq!(generator.pending().len(), 1);
        assert_eq!(counter(&world, ids[1]).borrow().total(), 0);

        assert_eq!(generator.route(&mut world).unwrap(), 1);
        assert!(generator.pending().is_empty());
        assert_eq!(counter(&world, ids[1]).borrow().count("stop"), 1);
    }

    #[test]
    fn cursor_orders_resolve_to_cells() {
        let (mut world, ids) = world_with_counters(1);
        let mut generator = OrderGenerator::new();
        generator.bind_mouse(MouseBinding {
            button: 0,
            state: KeyState::Pressed,
            target: Some(ids[0]),
            kind: "move_to".into(),
        });

        generator.handle(InputEvent::MouseMove {
            position: WPos::planar(2.5, 1.2),
        });
        generator.handle(InputEvent::MouseButton {
            button: 0,
            state: KeyState::Pressed,
        });
        generator.handle(InputEvent::MouseMove {
            position: WPos::planar(40.0, 1.0),
        });
        generator.handle(InputEvent::MouseButton {
            button: 0,
            state: KeyState::Pressed,
        });
        assert!(matches!(
            &generator.pending()[0],
            PendingOrder::AtCursor { cursor, .. } if *cursor == WPos::planar(2.5, 1.2)
        ));

        assert_eq!(generator.route(&mut world).unwrap(), 1);
        assert_eq!(counter(&world, ids[0]).borrow().count("move_to"), 1);
        assert_eq!(Order::targeting("move_to", MPos::new(2, 1)).target_cell(), Some(MPos::new(2, 1)));
    }

    #[test]
    fn bindings_deserialize_with_defaults() {
        let binding: KeyBinding = serde_json::from_value(serde_json::json!({
            "code": 87,
            "order": { "kind": "move_to", "payload": { "x": 1, "y": 0 } }
        }))
        .unwrap();
        assert_eq!(binding.state, KeyState::Pressed);
        assert_eq!(binding.target, None);
        assert_eq!(binding.order.target_cell(), Some(MPos::new(1, 0)));
    }
}
