//! Rendering adapter: walks render-capable traits and hands their shapes to a
//! back-end.
//!
//! # Invariants
//! - Renderers read the world; they never mutate it.
//! - Renderables are submitted in dictionary order (actor id, then trait
//!   insertion order).

mod batch;
mod camera;
mod error;
mod renderer;

pub use batch::{Batch, BatchConfig, BatchRenderer, Vertex};
pub use camera::Camera;
pub use error::RenderError;
pub use renderer::{DebugTextRenderer, FrameStats, RenderSink, Renderer, TraitRenderer, collect_renderables};
