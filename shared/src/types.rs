/*!
Math aliases and small value types shared across the controller modules.

This module intentionally contains no algorithms.
*/

use nalgebra as na;

pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Point3 = na::Point3<f32>;

/// Polar input pair: magnitude in `[0, 1]` and angle in radians.
///
/// Angle convention: `0` points forward (away from the camera), angles grow
/// counter-clockwise seen from above, so `PI / 2` is left and `3 * PI / 2` is right.
/// Angles are kept in `[0, TAU)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Polar {
    pub distance: f32,
    pub angle: f32,
}

impl Polar {
    pub const ZERO: Self = Self {
        distance: 0.0,
        angle: 0.0,
    };

    /// Build a polar pair, clamping the distance to `[0, 1]` and wrapping the angle.
    pub fn new(distance: f32, angle: f32) -> Self {
        let distance = if distance.is_finite() {
            distance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let angle = if angle.is_finite() {
            angle.rem_euclid(std::f32::consts::TAU)
        } else {
            0.0
        };
        Self { distance, angle }
    }

    /// Convert a screen-space stick deflection (`x` right, `y` up) to a polar pair.
    pub fn from_stick(x: f32, y: f32) -> Self {
        let distance = (x * x + y * y).sqrt();
        // Forward is +y; counter-clockwise toward left (-x).
        Self::new(distance, (-x).atan2(y))
    }

    /// Inverse of [`Polar::from_stick`]: `(x right, y up)` deflection.
    pub fn to_stick(&self) -> (f32, f32) {
        (
            -self.distance * self.angle.sin(),
            self.distance * self.angle.cos(),
        )
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.distance > 0.0
    }
}

/// Slope measured under and ahead of the character.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlopeSample {
    /// Angle between the surface normal ahead and world up (radians).
    pub angle: f32,
    /// Surface normal reported by the slope ray.
    pub normal: Vec3,
}

/// Spring state of the floating capsule for the current tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FloatState {
    /// Rest distance between ray origin and ground.
    pub rest_distance: f32,
    /// Distance reported by the ground ray this tick, if any.
    pub ray_distance: Option<f32>,
    /// Spring-damper impulse applied this tick (0 while airborne).
    pub spring_force: f32,
}
