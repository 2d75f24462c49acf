use crate::types::Vec3;

/// Per-tick working values.
///
/// Owned by the controller and overwritten at the start of every tick; nothing in here is
/// read before it is written in the same tick.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Scratch {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f32,
    /// Ground ray origin in world space.
    pub ray_origin: Vec3,
    /// Where the capsule's spring meets the ground.
    pub standing_point: Vec3,
    pub moving_direction: Vec3,
    pub move_impulse: Vec3,
    /// Inherited reference velocity of the standing platform.
    pub platform_velocity: Vec3,
    /// Reaction applied to the standing body by the spring.
    pub mass_force: Vec3,
}

impl Scratch {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
