//! Named trait kinds and actor templates.

use cellworld_common::{ActorId, Parameters, WPos};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::capability::Trait;
use crate::dictionary::TraitInstance;
use crate::error::{KernelError, KernelResult};
use crate::world::World;

/// Builds a fresh, uninitialized trait of one kind.
pub type TraitFactory = Box<dyn Fn() -> TraitInstance>;

/// One trait in an actor template, with its template parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitDefinition {
    pub kind: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl TraitDefinition {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            parameters: Parameters::new(),
        }
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Named actor template: an ordered list of traits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorDefinition {
    pub name: String,
    #[serde(default)]
    pub traits: Vec<TraitDefinition>,
}

impl ActorDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            traits: Vec::new(),
        }
    }

    /// Append a trait; traits are instantiated in the order they were added.
    pub fn add_trait(&mut self, definition: TraitDefinition) {
        self.traits.push(definition);
    }

    pub fn with_trait(mut self, definition: TraitDefinition) -> Self {
        self.add_trait(definition);
        self
    }
}

/// Registry of constructible trait kinds and actor templates.
#[derive(Default)]
pub struct ActorRegistry {
    kinds: BTreeMap<String, TraitFactory>,
    definitions: BTreeMap<String, ActorDefinition>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a default-constructible trait kind under `name`.
    pub fn register_trait<T: Trait + Default>(&mut self, name: impl Into<String>) -> KernelResult<()> {
        self.register_trait_with(name, || TraitInstance::new(T::default()))
    }

    pub fn register_trait_with(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> TraitInstance + 'static,
    ) -> KernelResult<()> {
        let name = name.into();
        if self.kinds.contains_key(&name) {
            return Err(KernelError::DuplicateTraitKind(name));
        }
        tracing::debug!(kind = %name, "trait kind registered");
        self.kinds.insert(name, Box::new(factory));
        Ok(())
    }

    /// Register a template. Every trait it names must already be registered.
    pub fn register_actor(&mut self, definition: ActorDefinition) -> KernelResult<()> {
        if self.definitions.contains_key(&definition.name) {
            return Err(KernelError::DuplicateActorDefinition(definition.name));
        }
        if let Some(unknown) = definition.traits.iter().find(|t| !self.kinds.contains_key(&t.kind)) {
            return Err(KernelError::UnknownTraitKind(unknown.kind.clone()));
        }
        tracing::debug!(name = %definition.name, traits = definition.traits.len(), "actor definition registered");
        self.definitions.insert(definition.name.clone(), definition);
        Ok(())
    }

    /// Build an actor at the origin. See [`ActorRegistry::create_actor_at`].
    pub fn create_actor(
        &self,
        name: &str,
        runtime: Option<&Parameters>,
        world: &mut World,
        add_to_world: bool,
    ) -> KernelResult<ActorId> {
        self.create_actor_at(name, WPos::ZERO, runtime, world, add_to_world)
    }

    /// Build an actor from the template `name`.
    ///
    /// Traits are created in template order. Each one is initialized with its
    /// template parameters overlaid by `runtime` (runtime wins), then attached
    /// before the next is created, so later traits can look up earlier ones.
    /// If anything fails the half-built actor is thrown away and the error is
    /// returned.
    pub fn create_actor_at(
        &self,
        name: &str,
        position: WPos,
        runtime: Option<&Parameters>,
        world: &mut World,
        add_to_world: bool,
    ) -> KernelResult<ActorId> {
        let definition = self
            .definitions
            .get(name)
            .ok_or_else(|| KernelError::UnknownActorDefinition(name.to_string()))?;

        let actor = world.spawn_actor(position);
        match self.build(definition, actor, runtime, world, add_to_world) {
            Ok(()) => {
                tracing::debug!(%actor, template = name, "actor created");
                Ok(actor)
            }
            Err(err) => {
                let cleanup = if world.is_alive(actor) {
                    world.remove_from_world(actor)
                } else {
                    world.discard_actor(actor)
                };
                if let Err(cleanup) = cleanup {
                    tracing::warn!(%actor, error = %cleanup, "failed to discard half-built actor");
                }
                Err(err)
            }
        }
    }

    /// Remove an actor created by this registry from its world.
    pub fn dispose_actor(&self, actor: ActorId, world: &mut World) -> KernelResult<()> {
        world.remove_from_world(actor)
    }

    pub fn definition(&self, name: &str) -> Option<&ActorDefinition> {
        self.definitions.get(name)
    }

    pub fn actor_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn trait_kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    fn build(
        &self,
        definition: &ActorDefinition,
        actor: ActorId,
        runtime: Option<&Parameters>,
        world: &mut World,
        add_to_world: bool,
    ) -> KernelResult<()> {
        for trait_def in &definition.traits {
            let factory = self
                .kinds
                .get(&trait_def.kind)
                .ok_or_else(|| KernelError::UnknownTraitKind(trait_def.kind.clone()))?;
            let instance = factory();
            let params = merge_parameters(&trait_def.parameters, runtime);
            instance.borrow_mut().initialize(world, actor, &params)?;
            world.attach_trait(actor, instance)?;
            tracing::trace!(%actor, kind = %trait_def.kind, "trait attached");
        }
        if add_to_world {
            world.add_to_world(actor)?;
        }
        Ok(())
    }
}

/// Template parameters overlaid with runtime parameters.
pub fn merge_parameters(template: &Parameters, runtime: Option<&Parameters>) -> Parameters {
    let mut merged = template.clone();
    if let Some(runtime) = runtime {
        for (key, value) in runtime {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
