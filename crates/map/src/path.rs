use cellworld_common::{MPos, WPos};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of the map that built a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapId(u64);

impl MapId {
    /// Fresh id, unique for the lifetime of the process.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map-{}", self.0)
    }
}

/// Sequence of cell visits produced by a path query. Immutable once built.
///
/// A blocked or zero-offset query yields a single node, so `first() == last()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    map: MapId,
    width: u32,
    cells: Vec<MPos>,
    origins: Vec<WPos>,
    blocked: bool,
}

impl Path {
    pub(crate) fn new(map: MapId, width: u32, cells: Vec<MPos>, origins: Vec<WPos>, blocked: bool) -> Self {
        debug_assert!(!cells.is_empty());
        debug_assert_eq!(cells.len(), origins.len());
        Self {
            map,
            width,
            cells,
            origins,
            blocked,
        }
    }

    pub fn map_id(&self) -> MapId {
        self.map
    }

    /// True when the query was rejected by a collision or the map bounds.
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Number of nodes (at least one).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// A path always has its starting node.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True when the path goes nowhere.
    pub fn is_zero_length(&self) -> bool {
        self.cells.len() == 1
    }

    pub fn first(&self) -> PathNode<'_> {
        PathNode { path: self, index: 0 }
    }

    pub fn last(&self) -> PathNode<'_> {
        PathNode {
            path: self,
            index: self.cells.len() - 1,
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = PathNode<'_>> {
        (0..self.cells.len()).map(move |index| PathNode { path: self, index })
    }

    pub fn cells(&self) -> &[MPos] {
        &self.cells
    }

    /// Position along the whole path: 0 is the start, 1 the end, linear in
    /// between. `percent` is clamped into `[0, 1]`.
    pub fn wpos(&self, percent: f32) -> WPos {
        let segments = self.origins.len() - 1;
        if segments == 0 {
            return self.origins[0];
        }
        let t = percent.clamp(0.0, 1.0) * segments as f32;
        let seg = (t.floor() as usize).min(segments - 1);
        self.origins[seg].lerp(self.origins[seg + 1], t - seg as f32)
    }
}

/// Cursor over one node of a [`Path`].
#[derive(Debug, Clone, Copy)]
pub struct PathNode<'a> {
    path: &'a Path,
    index: usize,
}

impl<'a> PathNode<'a> {
    pub fn mpos(&self) -> MPos {
        self.path.cells[self.index]
    }

    /// Flat arena index of this node's cell.
    pub fn cell_index(&self) -> usize {
        let m = self.mpos();
        m.x as usize + m.y as usize * self.path.width as usize
    }

    /// Position between this node and the next; `percent` is clamped into
    /// `[0, 1]`. The end node always yields its own origin.
    pub fn wpos(&self, percent: f32) -> WPos {
        let start = self.path.origins[self.index];
        match self.path.origins.get(self.index + 1) {
            Some(next) => start.lerp(*next, percent.clamp(0.0, 1.0)),
            None => start,
        }
    }

    pub fn is_end(&self) -> bool {
        self.index + 1 == self.path.cells.len()
    }

    pub fn next(&self) -> Option<PathNode<'a>> {
        (!self.is_end()).then(|| PathNode {
            path: self.path,
            index: self.index + 1,
        })
    }

    pub fn first(&self) -> PathNode<'a> {
        self.path.first()
    }

    pub fn last(&self) -> PathNode<'a> {
        self.path.last()
    }
}

impl PartialEq for PathNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.path, other.path) && self.index == other.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_step() -> Path {
        Path::new(
            MapId::next(),
            10,
            vec![MPos::new(2, 2), MPos::new(3, 2)],
            vec![WPos::planar(2.0, 2.0), WPos::planar(3.0, 2.0)],
            false,
        )
    }

    #[test]
    fn traversal_links() {
        let path = two_step();
        let first = path.first();
        assert!(!first.is_end());
        let next = first.next().unwrap();
        assert!(next.is_end());
        assert!(next.next().is_none());
        assert_eq!(next, path.last());
        assert_eq!(next.first(), first);
        assert_eq!(next.cell_index(), 23);
    }

    #[test]
    fn interpolates_both_axes() {
        let path = Path::new(
            MapId::next(),
            10,
            vec![MPos::new(1, 1), MPos::new(2, 2)],
            vec![WPos::planar(1.0, 1.0), WPos::planar(2.0, 2.0)],
            false,
        );
        assert_eq!(path.wpos(0.5), WPos::planar(1.5, 1.5));
        assert_eq!(path.first().wpos(0.25), WPos::planar(1.25, 1.25));
    }

    #[test]
    fn wpos_clamps_percent() {
        let path = two_step();
        assert_eq!(path.wpos(-1.0), WPos::planar(2.0, 2.0));
        assert_eq!(path.wpos(4.0), WPos::planar(3.0, 2.0));
        assert_eq!(path.last().wpos(0.5), WPos::planar(3.0, 2.0));
    }

    #[test]
    fn single_node_path() {
        let path = Path::new(MapId::next(), 4, vec![MPos::new(0, 0)], vec![WPos::ZERO], true);
        assert!(path.first().is_end());
        assert_eq!(path.first(), path.last());
        assert!(path.is_zero_length());
        assert_eq!(path.wpos(0.7), WPos::ZERO);
    }

    #[test]
    fn map_ids_are_unique() {
        assert_ne!(MapId::next(), MapId::next());
    }
}
