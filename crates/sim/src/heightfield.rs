//! Display height field
//!
//! The solver lifts every particle onto a surface for rendering. It only
//! needs a height and a normal at a display-space (x, z); the surface itself
//! is supplied by the caller. Physics never reads these values back.

use glam::{Vec2, Vec3};

/// Surface used to place particles for display.
///
/// Implementations must be pure: the same (x, z) always yields the same
/// result.
pub trait HeightField {
    /// Height and unit normal at display coordinates (x, z).
    fn sample(&self, x: f32, z: f32) -> (f32, Vec3);
}

impl<F> HeightField for F
where
    F: Fn(f32, f32) -> (f32, Vec3),
{
    fn sample(&self, x: f32, z: f32) -> (f32, Vec3) {
        self(x, z)
    }
}

/// Flat surface at height 0 facing +z.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatHeightField;

impl HeightField for FlatHeightField {
    fn sample(&self, _x: f32, _z: f32) -> (f32, Vec3) {
        (0.0, Vec3::Z)
    }
}

/// Radially symmetric pyramid with a rounded tip and a soft foot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PyramidHeightField {
    /// Distance from the axis where the foot reaches the ground.
    pub radius: f32,
    /// Peak height.
    pub height: f32,
    /// Forward-difference step for the normal.
    pub normal_epsilon: f32,
}

impl Default for PyramidHeightField {
    fn default() -> Self {
        Self {
            radius: 0.3,
            height: 0.48,
            normal_epsilon: 0.01,
        }
    }
}

impl PyramidHeightField {
    /// Height at display coordinates (x, z).
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let d = (Vec2::new(x, z).length() / self.radius).clamp(0.0, 1.0);
        profile(d) * self.height
    }

    /// Normal from forward differences around a precomputed height `h`.
    pub fn normal_at(&self, x: f32, z: f32, h: f32) -> Vec3 {
        let eps = self.normal_epsilon;
        let hx = self.height_at(x + eps, z);
        let hz = self.height_at(x, z + eps);
        Vec3::new((hx - h) / eps, (hz - h) / eps, 1.0).normalize()
    }
}

impl HeightField for PyramidHeightField {
    fn sample(&self, x: f32, z: f32) -> (f32, Vec3) {
        let h = self.height_at(x, z);
        (h, self.normal_at(x, z, h))
    }
}

/// Blend of a rounded cone (near the tip) into a soft foot, over d in [0, 1].
fn profile(d: f32) -> f32 {
    let tip = 1.0 - (d * d + 0.001).sqrt();
    let foot = soft_abs(d - 1.0, 0.1) * 1.1;
    mix(tip, foot, smoothstep(0.0, 1.0, d))
}

/// |x| with a rounded minimum, 0 at x = 0.
#[inline]
fn soft_abs(x: f32, t: f32) -> f32 {
    (x * x + t).sqrt() - t.sqrt()
}

#[inline]
fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
