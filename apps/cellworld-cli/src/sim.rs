use anyhow::Context;
use cellworld_common::ActorId;
use cellworld_input::{KeyBinding, OrderGenerator};
use cellworld_kernel::{ActorRegistry, World, builtin};
use cellworld_map::{GridWorldMap, WorldMap};
use cellworld_render::{Camera, DebugTextRenderer, Renderer};

use crate::scenario::{LifecycleAction, Scenario};

/// A world built from a scenario, plus the input and script state that
/// drives it.
pub struct Simulation {
    world: World,
    registry: ActorRegistry,
    generator: OrderGenerator,
    scenario: Scenario,
    spawned: Vec<ActorId>,
    camera: Camera,
}

impl Simulation {
    pub fn new(scenario: Scenario) -> anyhow::Result<Self> {
        let map = GridWorldMap::new(scenario.map.clone()).context("building world map")?;
        let (cw, ch) = map.cell_size();
        let camera = Camera::framing(scenario.map.width as f32 * cw, scenario.map.height as f32 * ch);
        let mut world = World::new(map);

        let mut registry = ActorRegistry::new();
        builtin::register_builtin_traits(&mut registry)?;
        for definition in &scenario.actors {
            registry
                .register_actor(definition.clone())
                .with_context(|| format!("registering actor definition {}", definition.name))?;
        }

        let mut spawned = Vec::with_capacity(scenario.spawns.len());
        for (index, spawn) in scenario.spawns.iter().enumerate() {
            let position = world.world_map().convert_to_wpos(spawn.at);
            let id = registry
                .create_actor_at(&spawn.template, position, spawn.params.as_ref(), &mut world, spawn.join)
                .with_context(|| format!("spawn #{index} ({}) at {}", spawn.template, spawn.at))?;
            spawned.push(id);
        }

        let mut generator = OrderGenerator::new();
        for binding in &scenario.bindings {
            generator.bind_key(KeyBinding {
                code: binding.code,
                state: binding.state,
                target: binding.target.map(|i| spawned[i]),
                order: binding.order.clone(),
            });
        }

        tracing::info!(scenario = scenario.title(), actors = spawned.len(), "scenario loaded");
        Ok(Self {
            world,
            registry,
            generator,
            scenario,
            spawned,
            camera,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn spawned(&self) -> &[ActorId] {
        &self.spawned
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// One frame: tick the world, then route whatever the script and input
    /// produced for this tick.
    pub fn step(&mut self, delta: f32) -> anyhow::Result<()> {
        self.world.tick(delta)?;
        let tick = self.world.tick_count();

        for input in self.scenario.input.iter().filter(|i| i.tick == tick) {
            self.generator.handle(input.event);
        }
        let routed = self.generator.route(&mut self.world)?;

        for scripted in self.scenario.orders.iter().filter(|o| o.tick == tick) {
            match scripted.target {
                Some(index) => self.world.issue_order(self.spawned[index], scripted.order.clone())?,
                None => self.world.issue_global_order(scripted.order.clone())?,
            }
        }
        self.apply_lifecycle(tick)?;
        tracing::debug!(tick, routed, "frame done");
        Ok(())
    }

    fn apply_lifecycle(&mut self, tick: u64) -> anyhow::Result<()> {
        let events: Vec<_> = self
            .scenario
            .lifecycle
            .iter()
            .filter(|l| l.tick == tick)
            .map(|l| (l.spawn, l.action))
            .collect();
        for (index, action) in events {
            let id = self.spawned[index];
            match action {
                LifecycleAction::Join => self.world.add_to_world(id)?,
                LifecycleAction::Remove => self.registry.dispose_actor(id, &mut self.world)?,
            }
            tracing::debug!(actor = %id, ?action, "lifecycle event");
        }
        Ok(())
    }

    pub fn frame(&self) -> anyhow::Result<String> {
        Ok(DebugTextRenderer::new().render(&self.world, &self.camera)?)
    }
}
