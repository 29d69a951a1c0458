use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Continuous world-space position.
///
/// No invariant is enforced; values are only clamped when a caller asks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WPos {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl WPos {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// A position on the ground plane (`z = 0`).
    pub const fn planar(x: f32, y: f32) -> Self {
        Self::new(x, y, 0.0)
    }

    /// Vector pointing from `self` to `to`.
    pub fn vector(self, to: WPos) -> WPos {
        to - self
    }

    /// Component-wise clamp into `[min, max]`.
    pub fn clamp(self, min: WPos, max: WPos) -> WPos {
        Vec3::from(self).clamp(min.into(), max.into()).into()
    }

    /// Linear interpolation; `t = 0` yields `self`, `t = 1` yields `to`.
    pub fn lerp(self, to: WPos, t: f32) -> WPos {
        Vec3::from(self).lerp(to.into(), t).into()
    }

    pub fn length(self) -> f32 {
        Vec3::from(self).length()
    }
}

impl From<Vec3> for WPos {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<WPos> for Vec3 {
    fn from(p: WPos) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

impl Add for WPos {
    type Output = WPos;

    fn add(self, rhs: WPos) -> WPos {
        (Vec3::from(self) + Vec3::from(rhs)).into()
    }
}

impl AddAssign for WPos {
    fn add_assign(&mut self, rhs: WPos) {
        *self = *self + rhs;
    }
}

impl Sub for WPos {
    type Output = WPos;

    fn sub(self, rhs: WPos) -> WPos {
        (Vec3::from(self) - Vec3::from(rhs)).into()
    }
}

impl SubAssign for WPos {
    fn sub_assign(&mut self, rhs: WPos) {
        *self = *self - rhs;
    }
}

impl Neg for WPos {
    type Output = WPos;

    fn neg(self) -> WPos {
        WPos::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for WPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// Discrete map-cell coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MPos {
    pub x: u32,
    pub y: u32,
}

impl MPos {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for MPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_subtract() {
        let a = WPos::new(1.0, 2.0, 3.0);
        let b = WPos::new(0.5, 0.5, 0.5);
        assert_eq!(a + b, WPos::new(1.5, 2.5, 3.5));
        assert_eq!(a - b, WPos::new(0.5, 1.5, 2.5));
        assert_eq!(a.vector(b), b - a);
    }

    #[test]
    fn clamp_is_component_wise() {
        let p = WPos::new(-4.0, 12.0, 0.5);
        let clamped = p.clamp(WPos::ZERO, WPos::new(10.0, 10.0, 1.0));
        assert_eq!(clamped, WPos::new(0.0, 10.0, 0.5));
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = WPos::planar(2.0, 2.0);
        let b = WPos::planar(4.0, 6.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), WPos::planar(3.0, 4.0));
    }

    #[test]
    fn glam_round_trip() {
        let p = WPos::new(1.0, -2.0, 3.5);
        let v: Vec3 = p.into();
        assert_eq!(WPos::from(v), p);
    }

    #[test]
    fn mpos_display_and_order() {
        assert!(MPos::new(0, 9) < MPos::new(1, 0));
        assert_eq!(MPos::new(3, 2).to_string(), "[3, 2]");
    }
}
