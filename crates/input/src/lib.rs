//! Input mapping: raw key and mouse events to world orders.
//!
//! # Invariants
//! - The world only ever sees orders, never raw input events.
//! - Queued orders are routed in the order their events arrived.

pub mod event;
pub mod generator;

pub use event::{InputEvent, KeyState};
pub use generator::{KeyBinding, MouseBinding, OrderGenerator, PendingOrder};
