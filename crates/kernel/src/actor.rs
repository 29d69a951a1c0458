use cellworld_common::{ActorId, WPos};
use serde::{Deserialize, Serialize};

/// An identity with a position. Behaviour lives in traits, keyed by `id` in
/// the world's trait dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    id: ActorId,
    position: WPos,
    alive: bool,
}

impl Actor {
    pub(crate) fn new(id: ActorId, position: WPos) -> Self {
        Self {
            id,
            position,
            alive: false,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn position(&self) -> WPos {
        self.position
    }

    /// True while the actor is joined to its world.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub(crate) fn set_position(&mut self, position: WPos) {
        self.position = position;
    }

    pub(crate) fn set_alive(&mut self, alive: bool) {
        self.alive = alive;
    }
}
