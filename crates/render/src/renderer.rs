use cellworld_common::{Renderable, from_color};
use cellworld_kernel::{Capability, World};
use std::fmt::Write as _;

use crate::camera::Camera;
use crate::error::RenderError;

/// Back-end that receives a frame's renderables.
///
/// A frame is `begin`, any number of `submit`s, `flush`, `end`.
pub trait RenderSink {
    fn begin(&mut self, camera: &Camera);
    fn submit(&mut self, renderable: &Renderable) -> Result<(), RenderError>;
    fn flush(&mut self);
    fn end(&mut self);
}

/// Produces one frame of output from world state.
///
/// Renderers only read the world.
pub trait Renderer {
    type Output;

    fn render(&mut self, world: &World, camera: &Camera) -> Result<Self::Output, RenderError>;
}

/// Every renderable of every render-capable trait, in dictionary order.
pub fn collect_renderables(world: &World) -> Result<Vec<Renderable>, RenderError> {
    let mut out = Vec::new();
    for handle in world.get_all_traits_implementing(Capability::Render2D) {
        if !world.is_alive(handle.owner()) {
            continue;
        }
        let guard = handle.try_borrow()?;
        if let Some(render) = guard.as_render_2d() {
            out.extend(render.render_2d(world));
        }
    }
    Ok(out)
}

/// Counts for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub renderables: usize,
    pub culled: usize,
}

/// Walks render-capable traits and feeds their output to a sink.
#[derive(Debug, Default)]
pub struct TraitRenderer<S> {
    sink: S,
    cull: bool,
}

impl<S: RenderSink> TraitRenderer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, cull: false }
    }

    /// Skip renderables whose position is outside the camera.
    pub fn with_culling(mut self, cull: bool) -> Self {
        self.cull = cull;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: RenderSink> Renderer for TraitRenderer<S> {
    type Output = FrameStats;

    fn render(&mut self, world: &World, camera: &Camera) -> Result<FrameStats, RenderError> {
        let renderables = collect_renderables(world)?;
        let mut stats = FrameStats::default();

        self.sink.begin(camera);
        for renderable in &renderables {
            if self.cull && !camera.contains(renderable.position) {
                stats.culled += 1;
                continue;
            }
            if let Err(err) = self.sink.submit(renderable) {
                self.sink.end();
                return Err(err);
            }
            stats.renderables += 1;
        }
        self.sink.flush();
        self.sink.end();

        tracing::trace!(tick = world.tick_count(), drawn = stats.renderables, culled = stats.culled, "frame rendered");
        Ok(stats)
    }
}

/// Plain-text frame: a header line and one line per renderable.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, world: &World, camera: &Camera) -> Result<String, RenderError> {
        let renderables = collect_renderables(world)?;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame (tick={}, actors={}, renderables={}) ===",
            world.tick_count(),
            world.actor_count(),
            renderables.len()
        );
        let _ = writeln!(
            out,
            "Camera: center=({:.1}, {:.1}) size={:.1}x{:.1}",
            camera.x, camera.y, camera.width, camera.height
        );
        for r in &renderables {
            let (red, green, blue, alpha) = from_color(r.color);
            let _ = writeln!(
                out,
                "  {} rgba({red}, {green}, {blue}, {alpha}) verts={}",
                r.position,
                r.mesh.vertex_count()
            );
        }
        Ok(out)
    }
}
