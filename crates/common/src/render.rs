use serde::{Deserialize, Serialize};

use crate::geometry::WPos;

/// Triangle mesh in local 2D coordinates (`points` holds x,y pairs).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub points: Vec<f32>,
    pub triangles: Vec<u32>,
}

impl Mesh {
    /// Axis-aligned quad with its origin at the bottom-left corner.
    pub fn quad(width: f32, height: f32) -> Self {
        Self {
            points: vec![0.0, 0.0, width, 0.0, width, height, 0.0, height],
            triangles: vec![0, 1, 2, 2, 3, 0],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len() / 2
    }
}

/// One shape handed to the renderer: mesh, world position, packed RGBA colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Renderable {
    pub mesh: Mesh,
    pub position: WPos,
    pub color: u32,
}

/// Pack an RGBA colour into a `u32` (`0xRRGGBBAA`).
pub fn to_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | a as u32
}

/// Unpack a colour produced by [`to_color`].
pub fn from_color(c: u32) -> (u8, u8, u8, u8) {
    ((c >> 24) as u8, (c >> 16) as u8, (c >> 8) as u8, c as u8)
}
