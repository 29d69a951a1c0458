use cellworld_common::WPos;
use glam::{Mat4, Vec3};

/// Orthographic 2D camera centred on `(x, y)`, `width` by `height` world
/// units across.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 20.0,
            height: 20.0,
        }
    }
}

impl Camera {
    /// Camera framing a `width` x `height` area with its corner at the origin.
    pub fn framing(width: f32, height: f32) -> Self {
        Self {
            x: width / 2.0,
            y: height / 2.0,
            width,
            height,
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh_gl(
            self.x - self.width / 2.0,
            self.x + self.width / 2.0,
            self.y - self.height / 2.0,
            self.y + self.height / 2.0,
            -1.0,
            1.0,
        )
    }

    /// World position to normalized device coordinates.
    pub fn to_clip(&self, p: WPos) -> Vec3 {
        self.projection().project_point3(Vec3::from(p))
    }

    pub fn contains(&self, p: WPos) -> bool {
        (p.x - self.x).abs() <= self.width / 2.0 && (p.y - self.y).abs() <= self.height / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_clip_edges() {
        let cam = Camera::framing(10.0, 10.0);
        let lo = cam.to_clip(WPos::planar(0.0, 0.0));
        let hi = cam.to_clip(WPos::planar(10.0, 10.0));
        assert!((lo.x + 1.0).abs() < 1e-5 && (lo.y + 1.0).abs() < 1e-5);
        assert!((hi.x - 1.0).abs() < 1e-5 && (hi.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn containment() {
        let cam = Camera::framing(10.0, 4.0);
        assert!(cam.contains(WPos::planar(5.0, 2.0)));
        assert!(!cam.contains(WPos::planar(5.0, 4.5)));
    }
}
