use anyhow::{Context, bail};
use cellworld_common::{MPos, Order, Parameters};
use cellworld_input::{InputEvent, KeyState};
use cellworld_kernel::ActorDefinition;
use cellworld_map::GridConfig;
use serde::Deserialize;
use std::path::Path;

/// A scenario file: map, actor templates, what to spawn, and what happens
/// on which tick.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub map: GridConfig,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    #[serde(default = "default_delta")]
    pub delta: f32,
    #[serde(default)]
    pub actors: Vec<ActorDefinition>,
    #[serde(default)]
    pub spawns: Vec<Spawn>,
    #[serde(default)]
    pub orders: Vec<ScriptedOrder>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default)]
    pub input: Vec<ScriptedInput>,
    #[serde(default)]
    pub lifecycle: Vec<LifecycleEvent>,
}

fn default_ticks() -> u64 {
    10
}

fn default_delta() -> f32 {
    0.5
}

fn default_true() -> bool {
    true
}

/// One actor to create before the first tick.
#[derive(Debug, Clone, Deserialize)]
pub struct Spawn {
    pub template: String,
    #[serde(default)]
    pub at: MPos,
    #[serde(default)]
    pub params: Option<Parameters>,
    #[serde(default = "default_true")]
    pub join: bool,
}

/// An order issued right after the given tick. `target` is an index into
/// `spawns`; without one the order is broadcast.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedOrder {
    pub tick: u64,
    #[serde(default)]
    pub target: Option<usize>,
    pub order: Order,
}

/// Key binding whose target is a spawn index.
#[derive(Debug, Clone, Deserialize)]
pub struct Binding {
    pub code: u32,
    #[serde(default = "pressed")]
    pub state: KeyState,
    #[serde(default)]
    pub target: Option<usize>,
    pub order: Order,
}

fn pressed() -> KeyState {
    KeyState::Pressed
}

/// A raw input event fed to the order generator after the given tick.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedInput {
    pub tick: u64,
    pub event: InputEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    /// Join a spawn created with `join: false`.
    Join,
    /// Remove a spawn from the world.
    Remove,
}

/// Join or remove a spawn after the given tick.
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleEvent {
    pub tick: u64,
    pub spawn: usize,
    pub action: LifecycleAction,
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("loading scenario {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Spawn indices must exist; everything else is checked when the world is
    /// built.
    pub fn validate(&self) -> anyhow::Result<()> {
        let spawns = self.spawns.len();
        let targets = self
            .orders
            .iter()
            .filter_map(|o| o.target)
            .chain(self.bindings.iter().filter_map(|b| b.target))
            .chain(self.lifecycle.iter().map(|l| l.spawn));
        for target in targets {
            if target >= spawns {
                bail!("target spawn index {target} out of range ({spawns} spawns)");
            }
        }
        if !self.delta.is_finite() || self.delta < 0.0 {
            bail!("delta must be a non-negative number, got {}", self.delta);
        }
        Ok(())
    }

    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed scenario")
    }
}
