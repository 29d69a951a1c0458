use cellworld_common::{ActorId, MPos, WPos};
use std::collections::BTreeMap;

use crate::WorldMap;
use crate::config::{GridConfig, RectTest};
use crate::error::MapError;
use crate::path::{MapId, Path};
use crate::space::{Occupant, Shape, Space, rects_intersect};

/// One grid cell and the spaces registered into it.
#[derive(Debug, Clone)]
pub struct Cell {
    position: MPos,
    occupants: Vec<Occupant>,
}

impl Cell {
    pub fn position(&self) -> MPos {
        self.position
    }

    /// Occupants sorted by owning actor id.
    pub fn occupants(&self) -> &[Occupant] {
        &self.occupants
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Insert after any existing occupants of the same owner.
    fn insert(&mut self, occupant: Occupant) {
        let at = self.occupants.partition_point(|o| o.owner <= occupant.owner);
        self.occupants.insert(at, occupant);
    }

    /// Remove every occupant owned by `owner`; returns how many were removed.
    fn remove_owner(&mut self, owner: ActorId) -> usize {
        let start = self.occupants.partition_point(|o| o.owner < owner);
        let end = self.occupants.partition_point(|o| o.owner <= owner);
        self.occupants.drain(start..end).count()
    }
}

/// The four orthogonal neighbours of a cell; `None` at the grid edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub left: Option<MPos>,
    pub right: Option<MPos>,
    pub top: Option<MPos>,
    pub bottom: Option<MPos>,
}

impl Neighbors {
    pub fn iter(&self) -> impl Iterator<Item = MPos> {
        [self.left, self.right, self.top, self.bottom].into_iter().flatten()
    }
}

/// What the map remembers about a registered actor.
#[derive(Debug, Clone)]
struct Registration {
    position: WPos,
    footprint: Vec<Space>,
    /// Arena indices the footprint was placed into.
    cells: Vec<usize>,
}

/// Fixed rectangular grid over world space.
///
/// Cells live in a flat arena indexed by `x + y * width`; neighbour links are
/// index arithmetic rather than stored references.
pub struct GridWorldMap {
    id: MapId,
    config: GridConfig,
    cells: Vec<Cell>,
    registrations: BTreeMap<ActorId, Registration>,
}

impl GridWorldMap {
    pub fn new(config: GridConfig) -> Result<Self, MapError> {
        config.validate()?;
        let mut cells = Vec::with_capacity(config.width as usize * config.height as usize);
        for y in 0..config.height {
            for x in 0..config.width {
                cells.push(Cell {
                    position: MPos::new(x, y),
                    occupants: Vec::new(),
                });
            }
        }
        tracing::debug!(
            width = config.width,
            height = config.height,
            cell_width = config.cell_width,
            cell_height = config.cell_height,
            "grid world map created"
        );
        Ok(Self {
            id: MapId::next(),
            config,
            cells,
            registrations: BTreeMap::new(),
        })
    }

    /// Shorthand for a map with the default intersection test.
    pub fn with_size(width: u32, height: u32, cell_width: f32, cell_height: f32) -> Result<Self, MapError> {
        Self::new(GridConfig::new(width, height, cell_width, cell_height))
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Arena index of an in-grid cell.
    pub fn index_of(&self, m: MPos) -> Option<usize> {
        self.inside_map_mpos(m)
            .then(|| m.x as usize + m.y as usize * self.config.width as usize)
    }

    pub fn cell_at(&self, m: MPos) -> Option<&Cell> {
        self.index_of(m).map(|i| &self.cells[i])
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn neighbors(&self, m: MPos) -> Neighbors {
        if !self.inside_map_mpos(m) {
            return Neighbors::default();
        }
        let (w, h) = (self.config.width, self.config.height);
        Neighbors {
            left: (m.x > 0).then(|| MPos::new(m.x - 1, m.y)),
            right: (m.x + 1 < w).then(|| MPos::new(m.x + 1, m.y)),
            top: (m.y > 0).then(|| MPos::new(m.x, m.y - 1)),
            bottom: (m.y + 1 < h).then(|| MPos::new(m.x, m.y + 1)),
        }
    }

    /// Cells that currently hold at least one occupant.
    pub fn occupied_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.is_empty())
    }

    pub fn registered_actors(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.registrations.keys().copied()
    }

    /// Total occupant records across all cells.
    pub fn occupant_count(&self) -> usize {
        self.cells.iter().map(|c| c.occupants.len()).sum()
    }

    fn place(&mut self, actor: ActorId, position: WPos, footprint: &[Space]) -> Vec<usize> {
        let mut placed = Vec::with_capacity(footprint.len());
        for space in footprint {
            let origin = space.origin(position);
            let Some(index) = self.index_of(self.convert_to_mpos(origin)) else {
                continue;
            };
            self.cells[index].insert(Occupant {
                owner: actor,
                origin,
                shape: space.shape,
            });
            placed.push(index);
        }
        placed.sort_unstable();
        placed.dedup();
        placed
    }

    fn clear(&mut self, actor: ActorId, cells: &[usize]) {
        for &index in cells {
            self.cells[index].remove_owner(actor);
        }
    }

    fn intersects(&self, a_origin: WPos, a: Shape, b_origin: WPos, b: Shape) -> bool {
        match (a, b) {
            (
                Shape::Rect {
                    half_width: ahw,
                    half_height: ahh,
                },
                Shape::Rect {
                    half_width: bhw,
                    half_height: bhh,
                },
            ) => rects_intersect(a_origin, (ahw, ahh), b_origin, (bhw, bhh), self.config.rect_test),
            _ => self.convert_to_mpos(a_origin) == self.convert_to_mpos(b_origin),
        }
    }

    fn single_node(&self, at: MPos, blocked: bool) -> Path {
        let at = MPos::new(at.x.min(self.config.width - 1), at.y.min(self.config.height - 1));
        Path::new(self.id, self.config.width, vec![at], vec![self.convert_to_wpos(at)], blocked)
    }

    /// Intersection test in use.
    pub fn rect_test(&self) -> RectTest {
        self.config.rect_test
    }
}

impl WorldMap for GridWorldMap {
    fn id(&self) -> MapId {
        self.id
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn cell_size(&self) -> (f32, f32) {
        (self.config.cell_width, self.config.cell_height)
    }

    fn convert_to_wpos(&self, m: MPos) -> WPos {
        WPos::planar(
            m.x as f32 * self.config.cell_width,
            m.y as f32 * self.config.cell_height,
        )
    }

    fn convert_to_mpos(&self, w: WPos) -> MPos {
        MPos::new(
            axis_cell(w.x, self.config.cell_width, self.config.width),
            axis_cell(w.y, self.config.cell_height, self.config.height),
        )
    }

    fn inside_map_wpos(&self, w: WPos) -> bool {
        w.x >= 0.0
            && w.y >= 0.0
            && w.x < self.config.width as f32 * self.config.cell_width
            && w.y < self.config.height as f32 * self.config.cell_height
    }

    fn inside_map_mpos(&self, m: MPos) -> bool {
        m.x < self.config.width && m.y < self.config.height
    }

    fn register(&mut self, actor: ActorId, position: WPos, footprint: &[Space]) -> Result<(), MapError> {
        if self.registrations.contains_key(&actor) {
            return Err(MapError::AlreadyRegistered(actor));
        }
        let cells = self.place(actor, position, footprint);
        tracing::debug!(%actor, %position, spaces = footprint.len(), cells = cells.len(), "registered on map");
        self.registrations.insert(
            actor,
            Registration {
                position,
                footprint: footprint.to_vec(),
                cells,
            },
        );
        Ok(())
    }

    fn deregister(&mut self, actor: ActorId) -> Result<(), MapError> {
        let reg = self
            .registrations
            .remove(&actor)
            .ok_or(MapError::NotRegistered(actor))?;
        self.clear(actor, &reg.cells);
        tracing::debug!(%actor, cells = reg.cells.len(), "deregistered from map");
        Ok(())
    }

    fn move_actor(&mut self, actor: ActorId, path: &Path, percent: f32) -> Result<WPos, MapError> {
        if path.map_id() != self.id {
            return Err(MapError::ForeignPath {
                expected: self.id,
                actual: path.map_id(),
            });
        }
        let mut reg = self
            .registrations
            .remove(&actor)
            .ok_or(MapError::NotRegistered(actor))?;

        self.clear(actor, &reg.cells);
        let old = reg.position;
        reg.position = path.wpos(percent);
        reg.cells = self.place(actor, reg.position, &reg.footprint);
        let new = reg.position;
        self.registrations.insert(actor, reg);

        tracing::trace!(%actor, %old, %new, percent, "moved on map");
        Ok(new)
    }

    fn get_path(&self, actor: ActorId, position: WPos, footprint: &[Space], from: MPos, to: MPos) -> Path {
        if from == to {
            return self.single_node(from, false);
        }
        if !self.inside_map_mpos(from) || !self.inside_map_mpos(to) {
            tracing::trace!(%actor, %from, %to, "path endpoint outside map");
            return self.single_node(from, true);
        }

        let offset = self.convert_to_wpos(to) - self.convert_to_wpos(from);

        if footprint
            .iter()
            .any(|space| !self.inside_map_wpos(space.origin(position) + offset))
        {
            tracing::trace!(%actor, %from, %to, "path leaves the map");
            return self.single_node(from, true);
        }

        for space in footprint {
            let candidate = space.origin(position) + offset;
            let cell = self.convert_to_mpos(candidate);
            let collides = self.occupants_at(cell).iter().any(|other| {
                other.owner != actor && self.intersects(candidate, space.shape, other.origin, other.shape)
            });
            if collides {
                tracing::trace!(%actor, %from, %to, %cell, "path blocked");
                return self.single_node(from, true);
            }
        }

        Path::new(
            self.id,
            self.config.width,
            vec![from, to],
            vec![self.convert_to_wpos(from), self.convert_to_wpos(to)],
            false,
        )
    }

    fn occupants_at(&self, m: MPos) -> &[Occupant] {
        self.cell_at(m).map(Cell::occupants).unwrap_or(&[])
    }

    fn footprint_of(&self, actor: ActorId) -> Option<&[Space]> {
        self.registrations.get(&actor).map(|r| r.footprint.as_slice())
    }
}

/// Clamped cell index along one axis.
///
/// The division is corrected against `cell * size` so that a cell origin
/// produced by `convert_to_wpos` always maps back to the same cell.
fn axis_cell(v: f32, size: f32, count: u32) -> u32 {
    let max = count - 1;
    if v.is_nan() || v <= 0.0 {
        return 0;
    }
    let mut cell = ((v / size).floor() as u32).min(max);
    if cell > 0 && cell as f32 * size > v {
        cell -= 1;
    }
    if cell < max && (cell + 1) as f32 * size <= v {
        cell += 1;
    }
    cell
}
