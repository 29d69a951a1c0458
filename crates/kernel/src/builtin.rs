//! Trait kinds shipped with the kernel.
//!
//! Register them with [`register_builtin_traits`] and reference them by name
//! from actor definitions.

use cellworld_common::{ActorId, MPos, Mesh, Order, Parameters, Renderable, WPos, to_color};
use cellworld_map::{Path, Space};
use glam::Vec3;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::capability::{AddedNotifier, MoveNotifier, OccupySpace, OrderResolver, Render2D, Ticker, Trait};
use crate::error::{KernelError, KernelResult};
use crate::registry::ActorRegistry;
use crate::world::World;

pub const FOOTPRINT: &str = "footprint";
pub const MOVER: &str = "mover";
pub const SPRITE: &str = "sprite";
pub const ORDER_COUNTER: &str = "order_counter";
pub const ODOMETER: &str = "odometer";

/// Register every built-in kind under its default name.
pub fn register_builtin_traits(registry: &mut ActorRegistry) -> KernelResult<()> {
    registry.register_trait::<Footprint>(FOOTPRINT)?;
    registry.register_trait::<Mover>(MOVER)?;
    registry.register_trait::<Sprite>(SPRITE)?;
    registry.register_trait::<OrderCounter>(ORDER_COUNTER)?;
    registry.register_trait::<Odometer>(ODOMETER)?;
    Ok(())
}

/// Deserialize merged parameters into a typed struct. Unknown keys are
/// ignored, since runtime parameters are shared by every trait of an actor.
fn parse_params<P: DeserializeOwned>(kind: &str, params: &Parameters) -> KernelResult<P> {
    serde_json::from_value(Value::Object(params.clone())).map_err(|e| KernelError::InvalidParameters {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Footprint
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FootprintParams {
    #[serde(default)]
    cells: Option<Vec<[i32; 2]>>,
    #[serde(default)]
    rect: Option<RectParams>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RectParams {
    half_width: f32,
    half_height: f32,
}

/// Claims map cells for its actor.
///
/// `cells` lists offsets in whole cells; `rect` adds a rectangle anchored at
/// the actor's position. With neither, the actor claims its own cell.
#[derive(Debug, Default)]
pub struct Footprint {
    spaces: Vec<Space>,
}

impl Footprint {
    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }
}

impl Trait for Footprint {
    fn initialize(&mut self, world: &mut World, _owner: ActorId, params: &Parameters) -> KernelResult<()> {
        let parsed: FootprintParams = parse_params(FOOTPRINT, params)?;
        let (cw, ch) = world.world_map().cell_size();

        self.spaces.clear();
        if let Some(rect) = parsed.rect {
            let positive = |v: f32| v > 0.0;
            if !positive(rect.half_width) || !positive(rect.half_height) {
                return Err(KernelError::InvalidParameters {
                    kind: FOOTPRINT.to_string(),
                    reason: "rect half extents must be positive".to_string(),
                });
            }
            self.spaces.push(Space::rect(WPos::ZERO, rect.half_width, rect.half_height));
        }
        let cells = match (parsed.cells, self.spaces.is_empty()) {
            (Some(cells), _) => cells,
            (None, true) => vec![[0, 0]],
            (None, false) => Vec::new(),
        };
        self.spaces.extend(
            cells
                .into_iter()
                .map(|[dx, dy]| Space::cell(WPos::planar(dx as f32 * cw, dy as f32 * ch))),
        );
        Ok(())
    }

    fn as_occupy_space(&self) -> Option<&dyn OccupySpace> {
        Some(self)
    }
}

impl OccupySpace for Footprint {
    fn spaces(&self) -> Vec<Space> {
        self.spaces.clone()
    }
}

// ---------------------------------------------------------------------------
// Mover
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MoverParams {
    #[serde(default = "default_speed")]
    speed: f32,
}

fn default_speed() -> f32 {
    1.0
}

/// Walks its actor toward a target cell, one single-step path at a time.
///
/// Orders: `move_to` with a `{x, y}` payload sets the target; `stop` and the
/// global `halt` clear it. `speed` is in cells per second. Steps go along x
/// first, then y. A blocked step drops the target.
#[derive(Debug)]
pub struct Mover {
    owner: ActorId,
    speed: f32,
    target: Option<MPos>,
    step: Option<Path>,
    progress: f32,
    blocked: bool,
}

impl Default for Mover {
    fn default() -> Self {
        Self {
            owner: ActorId::default(),
            speed: default_speed(),
            target: None,
            step: None,
            progress: 0.0,
            blocked: false,
        }
    }
}

impl Mover {
    pub fn target(&self) -> Option<MPos> {
        self.target
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_moving(&self) -> bool {
        self.target.is_some()
    }

    /// True if the last attempted step was refused by the map.
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    fn halt(&mut self) {
        self.target = None;
        self.step = None;
        self.progress = 0.0;
    }

    /// A step is only checked when it starts; another actor may have moved
    /// into its destination since. Re-run the query from the step's origin.
    fn destination_clear(world: &World, owner: ActorId, path: &Path) -> bool {
        let map = world.world_map();
        let footprint = map.footprint_of(owner).unwrap_or(&[]);
        let (from, to) = (path.first(), path.last());
        !map.get_path(owner, from.wpos(0.0), footprint, from.mpos(), to.mpos())
            .is_blocked()
    }

    fn next_cell(here: MPos, target: MPos) -> MPos {
        if here.x != target.x {
            let x = if target.x > here.x { here.x + 1 } else { here.x - 1 };
            MPos::new(x, here.y)
        } else {
            let y = if target.y > here.y { here.y + 1 } else { here.y - 1 };
            MPos::new(here.x, y)
        }
    }
}

impl Trait for Mover {
    fn initialize(&mut self, _world: &mut World, owner: ActorId, params: &Parameters) -> KernelResult<()> {
        let parsed: MoverParams = parse_params(MOVER, params)?;
        if parsed.speed.is_nan() || parsed.speed < 0.0 {
            return Err(KernelError::InvalidParameters {
                kind: MOVER.to_string(),
                reason: format!("speed must be non-negative, got {}", parsed.speed),
            });
        }
        self.owner = owner;
        self.speed = parsed.speed;
        Ok(())
    }

    fn as_ticker(&mut self) -> Option<&mut dyn Ticker> {
        Some(self)
    }

    fn as_order_resolver(&mut self) -> Option<&mut dyn OrderResolver> {
        Some(self)
    }
}

impl Ticker for Mover {
    fn tick(&mut self, world: &mut World, delta: f32) -> KernelResult<()> {
        let Some(target) = self.target else {
            return Ok(());
        };

        let mut budget = self.speed * delta;
        while budget > 0.0 {
            if self.step.is_none() {
                let position = world
                    .actor(self.owner)
                    .ok_or(KernelError::ActorNotFound(self.owner))?
                    .position();
                let here = world.world_map().convert_to_mpos(position);
                if here == target {
                    tracing::debug!(actor = %self.owner, %target, "target reached");
                    self.halt();
                    break;
                }
                let path = world.get_path(self.owner, here, Self::next_cell(here, target))?;
                if path.is_blocked() {
                    tracing::debug!(actor = %self.owner, %here, %target, "step blocked");
                    self.blocked = true;
                    self.halt();
                    break;
                }
                self.blocked = false;
                self.step = Some(path);
                self.progress = 0.0;
            }

            let Some(path) = self.step.take() else {
                break;
            };
            let remaining = 1.0 - self.progress;
            let finishing = budget >= remaining;
            if finishing && !Self::destination_clear(world, self.owner, &path) {
                tracing::debug!(actor = %self.owner, to = %path.last().mpos(), "step taken by another actor");
                world.move_actor(self.owner, &path, 0.0)?;
                self.blocked = true;
                self.halt();
                break;
            }
            if finishing {
                budget -= remaining;
                self.progress = 1.0;
            } else {
                self.progress += budget;
                budget = 0.0;
            }
            world.move_actor(self.owner, &path, self.progress)?;
            if finishing {
                self.progress = 0.0;
            } else {
                self.step = Some(path);
            }
        }
        Ok(())
    }
}

impl OrderResolver for Mover {
    fn resolve_order(&mut self, world: &mut World, order: &Order) -> KernelResult<()> {
        match order.kind.as_str() {
            "move_to" if !order.is_global() => {
                let target = order.target_cell().ok_or_else(|| KernelError::InvalidParameters {
                    kind: "move_to".to_string(),
                    reason: format!("payload is not a cell: {}", order.payload),
                })?;
                if !world.world_map().inside_map_mpos(target) {
                    return Err(KernelError::Map(cellworld_map::MapError::OutOfBounds {
                        x: target.x as f32,
                        y: target.y as f32,
                    }));
                }
                tracing::debug!(actor = %self.owner, %target, "move ordered");
                self.halt();
                self.blocked = false;
                self.target = Some(target);
            }
            "stop" | "halt" => self.halt(),
            _ => {}
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sprite
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SpriteParams {
    #[serde(default = "default_color")]
    color: [u8; 4],
    #[serde(default = "default_size")]
    size: f32,
}

fn default_color() -> [u8; 4] {
    [255, 255, 255, 255]
}

fn default_size() -> f32 {
    1.0
}

/// Draws a square quad at its actor's position.
#[derive(Debug)]
pub struct Sprite {
    owner: ActorId,
    color: u32,
    size: f32,
}

impl Default for Sprite {
    fn default() -> Self {
        let [r, g, b, a] = default_color();
        Self {
            owner: ActorId::default(),
            color: to_color(r, g, b, a),
            size: default_size(),
        }
    }
}

impl Sprite {
    pub fn color(&self) -> u32 {
        self.color
    }
}

impl Trait for Sprite {
    fn initialize(&mut self, _world: &mut World, owner: ActorId, params: &Parameters) -> KernelResult<()> {
        let parsed: SpriteParams = parse_params(SPRITE, params)?;
        let [r, g, b, a] = parsed.color;
        self.owner = owner;
        self.color = to_color(r, g, b, a);
        self.size = parsed.size;
        Ok(())
    }

    fn as_render_2d(&self) -> Option<&dyn Render2D> {
        Some(self)
    }
}

impl Render2D for Sprite {
    fn render_2d(&self, world: &World) -> Vec<Renderable> {
        let Some(actor) = world.actor(self.owner) else {
            return Vec::new();
        };
        vec![Renderable {
            mesh: Mesh::quad(self.size, self.size),
            position: actor.position(),
            color: self.color,
        }]
    }
}

// ---------------------------------------------------------------------------
// OrderCounter
// ---------------------------------------------------------------------------

/// Counts every order its actor receives, per kind.
#[derive(Debug, Default)]
pub struct OrderCounter {
    counts: BTreeMap<String, u32>,
    global: u32,
}

impl OrderCounter {
    pub fn count(&self, kind: &str) -> u32 {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// How many of the received orders were broadcasts.
    pub fn global(&self) -> u32 {
        self.global
    }
}

impl Trait for OrderCounter {
    fn as_order_resolver(&mut self) -> Option<&mut dyn OrderResolver> {
        Some(self)
    }
}

impl OrderResolver for OrderCounter {
    fn resolve_order(&mut self, _world: &mut World, order: &Order) -> KernelResult<()> {
        *self.counts.entry(order.kind.clone()).or_default() += 1;
        if order.is_global() {
            self.global += 1;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Odometer
// ---------------------------------------------------------------------------

/// Tracks distance travelled by its actor.
#[derive(Debug, Default)]
pub struct Odometer {
    owner: ActorId,
    joined_at: Option<WPos>,
    distance: f32,
    moves: u32,
}

impl Odometer {
    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn joined_at(&self) -> Option<WPos> {
        self.joined_at
    }
}

impl Trait for Odometer {
    fn initialize(&mut self, _world: &mut World, owner: ActorId, _params: &Parameters) -> KernelResult<()> {
        self.owner = owner;
        Ok(())
    }

    fn as_added_notifier(&mut self) -> Option<&mut dyn AddedNotifier> {
        Some(self)
    }

    fn as_move_notifier(&mut self) -> Option<&mut dyn MoveNotifier> {
        Some(self)
    }
}

impl AddedNotifier for Odometer {
    fn notify_added(&mut self, world: &mut World, owner: ActorId) -> KernelResult<()> {
        self.joined_at = world.actor(owner).map(|a| a.position());
        Ok(())
    }
}

impl MoveNotifier for Odometer {
    fn notify_move(&mut self, _world: &mut World, old: WPos, new: WPos) -> KernelResult<()> {
        self.distance += Vec3::from(old).distance(Vec3::from(new));
        self.moves += 1;
        tracing::trace!(actor = %self.owner, distance = self.distance, "odometer");
        Ok(())
    }
}
