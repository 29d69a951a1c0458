use cellworld_common::{ActorId, WPos};
use serde::{Deserialize, Serialize};

use crate::config::RectTest;

/// Extent of a claimed space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Claims the whole cell its origin falls in.
    Cell,
    /// Axis-aligned rectangle centred on its origin.
    Rect { half_width: f32, half_height: f32 },
}

/// One claim in an actor's footprint, relative to the actor's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub local_offset: WPos,
    pub shape: Shape,
}

impl Space {
    /// Whole-cell claim at the given local offset.
    pub fn cell(local_offset: WPos) -> Self {
        Self {
            local_offset,
            shape: Shape::Cell,
        }
    }

    /// Rectangle whose bottom-left corner sits at `local_offset`.
    pub fn rect(local_offset: WPos, half_width: f32, half_height: f32) -> Self {
        Self {
            local_offset: local_offset + WPos::planar(half_width, half_height),
            shape: Shape::Rect {
                half_width,
                half_height,
            },
        }
    }

    /// Absolute origin when the owner stands at `position`.
    pub fn origin(&self, position: WPos) -> WPos {
        position + self.local_offset
    }
}

/// A space registered into a cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    pub owner: ActorId,
    /// Absolute origin of the space at registration time.
    pub origin: WPos,
    pub shape: Shape,
}

/// Rectangle intersection on centre distance and summed half extents.
pub(crate) fn rects_intersect(
    a: WPos,
    (ahw, ahh): (f32, f32),
    b: WPos,
    (bhw, bhh): (f32, f32),
    test: RectTest,
) -> bool {
    let on_x = (a.x - b.x).abs() < ahw + bhw;
    let on_y = (a.y - b.y).abs() < ahh + bhh;
    match test {
        RectTest::Overlap => on_x && on_y,
        RectTest::LegacyAxisOr => on_x || on_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_space_is_centred_on_its_box() {
        let s = Space::rect(WPos::ZERO, 0.5, 0.5);
        assert_eq!(s.origin(WPos::planar(2.0, 3.0)), WPos::planar(2.5, 3.5));
    }

    #[test]
    fn overlap_requires_both_axes() {
        let half = (0.5, 0.5);
        let a = WPos::planar(0.5, 0.5);
        assert!(rects_intersect(a, half, WPos::planar(1.2, 0.9), half, RectTest::Overlap));
        // Same row, far apart on y.
        let b = WPos::planar(0.9, 5.0);
        assert!(!rects_intersect(a, half, b, half, RectTest::Overlap));
        assert!(rects_intersect(a, half, b, half, RectTest::LegacyAxisOr));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let half = (0.5, 0.5);
        let a = WPos::planar(0.5, 0.5);
        let b = WPos::planar(1.5, 0.5);
        assert!(!rects_intersect(a, half, b, half, RectTest::Overlap));
    }
}
