use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an actor in a world.
///
/// Ids are handed out by the owning world in strictly increasing order and
/// are never reused, so ordering by id is the same as ordering by creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl ActorId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The id that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Named construction parameters handed to a trait when it is initialized.
///
/// Backed by `serde_json::Map`, which iterates in key order.
pub type Parameters = serde_json::Map<String, serde_json::Value>;
