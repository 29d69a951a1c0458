use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::MPos;

/// A named command routed to order-resolver traits.
///
/// The payload is opaque to the engine. Whether the order is global is
/// decided by the world when it is issued, not by whoever built it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_deserializing)]
    global: bool,
}

impl Order {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
            global: false,
        }
    }

    pub fn with_payload(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            payload,
            ..Self::new(kind)
        }
    }

    /// Order carrying a target cell as `{ "x": .., "y": .. }`.
    pub fn targeting(kind: impl Into<String>, cell: MPos) -> Self {
        Self::with_payload(kind, serde_json::json!({ "x": cell.x, "y": cell.y }))
    }

    /// True when the order was broadcast to every resolver in the world.
    pub fn is_global(&self) -> bool {
        self.global
    }

    /// Set by the world when routing; resolvers only ever see `&Order`.
    pub fn set_global(&mut self, global: bool) {
        self.global = global;
    }

    /// Read the payload as a target cell, if it has that shape.
    pub fn target_cell(&self) -> Option<MPos> {
        serde_json::from_value(self.payload.clone()).ok()
    }
}
