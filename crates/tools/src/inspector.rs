use cellworld_common::{ActorId, MPos, WPos};
use cellworld_kernel::{Capability, World};
use std::fmt;

/// Read-only queries against a world, for debugging and CLI output.
pub struct WorldInspector;

impl WorldInspector {
    pub fn summary(world: &World) -> WorldSummary {
        let (width, height) = world.world_map().dimensions();
        let occupied_cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| MPos::new(x, y)))
            .filter(|m| !world.world_map().occupants_at(*m).is_empty())
            .count();
        WorldSummary {
            tick: world.tick_count(),
            actors: world.actor_count(),
            constructed: world.actors().filter(|a| !a.is_alive()).count(),
            traits: world.traits().trait_count(),
            pending_tasks: world.pending_tasks(),
            occupied_cells,
        }
    }

    pub fn inspect_actor(world: &World, id: ActorId) -> Option<ActorInfo> {
        let actor = world.actor(id)?;
        let traits = world
            .traits()
            .traits_of(id)
            .iter()
            .map(|h| TraitInfo {
                kind: short_kind(h.kind_name()),
                capabilities: h.capabilities().iter().collect(),
            })
            .collect();
        Some(ActorInfo {
            id,
            position: actor.position(),
            cell: world.world_map().convert_to_mpos(actor.position()),
            alive: actor.is_alive(),
            traits,
        })
    }

    /// Every actor record, joined or not, in id order.
    pub fn list_actors(world: &World) -> Vec<ActorId> {
        world.actors().map(|a| a.id()).collect()
    }

    /// ASCII dump of the map, top row first. `.` is empty, a digit is the
    /// last digit of the single occupant's id, `*` marks shared cells.
    pub fn occupancy_grid(world: &World) -> String {
        let map = world.world_map();
        let (width, height) = map.dimensions();
        let mut out = String::with_capacity(grid_text_len(width, height));
        for y in (0..height).rev() {
            for x in 0..width {
                let occupants = map.occupants_at(MPos::new(x, y));
                let owner = occupants.first().map(|o| o.owner);
                let shared = occupants.iter().any(|o| Some(o.owner) != owner);
                let c = match owner {
                    None => '.',
                    Some(_) if shared => '*',
                    Some(id) => char::from_digit((id.0 % 10) as u32, 10).unwrap_or('?'),
                };
                out.push(c);
            }
            out.push('\n');
        }
        out
    }
}

fn short_kind(name: &str) -> String {
    name.rsplit("::").next().unwrap_or(name).to_string()
}

#[derive(Debug, Clone)]
pub struct WorldSummary {
    pub tick: u64,
    /// Joined actors.
    pub actors: usize,
    /// Actors built but not joined yet.
    pub constructed: usize,
    pub traits: usize,
    pub pending_tasks: usize,
    pub occupied_cells: usize,
}

impl fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "World: tick={} actors={} constructed={} traits={} pending_tasks={} occupied_cells={}",
            self.tick, self.actors, self.constructed, self.traits, self.pending_tasks, self.occupied_cells
        )
    }
}

#[derive(Debug, Clone)]
pub struct TraitInfo {
    pub kind: String,
    pub capabilities: Vec<Capability>,
}

#[derive(Debug, Clone)]
pub struct ActorInfo {
    pub id: ActorId,
    pub position: WPos,
    pub cell: MPos,
    pub alive: bool,
    pub traits: Vec<TraitInfo>,
}

impl fmt::Display for ActorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Actor {} pos={} cell={} {}",
            self.id,
            self.position,
            self.cell,
            if self.alive { "joined" } else { "constructed" }
        )?;
        for t in &self.traits {
            write!(f, "\n  {} {:?}", t.kind, t.capabilities)?;
        }
        Ok(())
    }
}

/// Bytes in an occupancy dump: one char per cell plus a newline per row.
fn grid_text_len(width: u32, height: u32) -> usize {
    (width as usize + 1) * height as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellworld_kernel::builtin;
    use cellworld_kernel::{ActorDefinition, ActorRegistry, TraitDefinition};
    use cellworld_map::GridWorldMap;

    fn populated() -> (World, ActorId, ActorId) {
        let mut reg = ActorRegistry::new();
        builtin::register_builtin_traits(&mut reg).unwrap();
        reg.register_actor(
            ActorDefinition::new("unit")
                .with_trait(TraitDefinition::new(builtin::FOOTPRINT))
                .with_trait(TraitDefinition::new(builtin::MOVER)),
        )
        .unwrap();
        let mut world = World::new(GridWorldMap::with_size(4, 3, 1.0, 1.0).unwrap());
        let a = reg
            .create_actor_at("unit", WPos::planar(0.0, 0.0), None, &mut world, true)
            .unwrap();
        let b = reg
            .create_actor_at("unit", WPos::planar(2.0, 2.0), None, &mut world, false)
            .unwrap();
        (world, a, b)
    }

    #[test]
    fn summary_counts() {
        let (mut world, _, _) = populated();
        world.add_frame_end_task(|_| Ok(()));
        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.actors, 1);
        assert_eq!(summary.constructed, 1);
        assert_eq!(summary.traits, 4);
        assert_eq!(summary.pending_tasks, 1);
        assert_eq!(summary.occupied_cells, 1);
        assert!(summary.to_string().contains("tick=0"));
    }

    #[test]
    fn inspect_actor_lists_traits() {
        let (world, a, _) = populated();
        let info = WorldInspector::inspect_actor(&world, a).unwrap();
        assert!(info.alive);
        assert_eq!(info.traits.len(), 2);
        assert_eq!(info.traits[0].kind, "Footprint");
        assert_eq!(info.traits[1].capabilities, [Capability::Tick, Capability::ResolveOrder]);
        let text = info.to_string();
        assert!(text.contains("joined"));
        assert!(text.contains("Mover"));
        assert!(WorldInspector::inspect_actor(&world, ActorId(42)).is_none());
    }

    #[test]
    fn lists_every_record() {
        let (world, a, b) = populated();
        assert_eq!(WorldInspector::list_actors(&world), [a, b]);
    }

    #[test]
    fn grid_text_len_does_not_wrap_on_wide_maps() {
        assert_eq!(grid_text_len(3, 2), 8);
        assert_eq!(grid_text_len(u32::MAX, 2), (u32::MAX as usize + 1) * 2);
    }

    #[test]
    fn occupancy_grid_draws_top_row_first() {
        let (mut world, _, b) = populated();
        world.add_to_world(b).unwrap();
        assert_eq!(WorldInspector::occupancy_grid(&world), "..1.\n....\n0...\n");
    }
}
