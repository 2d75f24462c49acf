//! Physics seam between the controller and a rigid-body engine.
//!
//! The controller only talks to [`PhysicsWorld`]; [`crate::rapier_world::RapierWorld`] is the
//! rapier3d implementation, tests use a scripted one.

use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

use crate::{
    bitmask_flags::BitmaskFlags,
    define_bitmask_flags,
    types::{Quat, Vec3},
};

define_bitmask_flags!(ColliderTag, u128, {
    /// Ignored by the follow camera's collision ray.
    ExcludeFromCamera,
    /// Ignored by the ground and slope rays.
    ExcludeFromGroundRay,
});

/// Tag set stored in a collider's `user_data`.
pub type ColliderTags = BitmaskFlags<u128>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    Kinematic,
    Fixed,
}

/// Snapshot of a rigid body at the start of a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub kind: BodyKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    pub angvel: Vec3,
    pub mass: f32,
    pub gravity_scale: f32,
}

impl BodyState {
    /// Velocity of the body's material at world point `point`.
    pub fn velocity_at_point(&self, point: &Vec3) -> Vec3 {
        self.linvel + self.angvel.cross(&(point - self.position))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Distance along the (unit) ray direction.
    pub toi: f32,
    pub collider: ColliderHandle,
    pub body: Option<RigidBodyHandle>,
    /// Present for casts made with `with_normal`.
    pub normal: Option<Vec3>,
}

#[derive(Clone, Copy, Debug)]
pub struct RayQuery {
    pub origin: Vec3,
    /// Unit direction.
    pub dir: Vec3,
    pub max_toi: f32,
    pub exclude_sensors: bool,
    pub exclude_body: Option<RigidBodyHandle>,
    /// Colliders carrying this tag are skipped.
    pub skip_tag: Option<ColliderTag>,
    pub with_normal: bool,
}

impl RayQuery {
    pub fn new(origin: Vec3, dir: Vec3, max_toi: f32) -> Self {
        Self {
            origin,
            dir,
            max_toi,
            exclude_sensors: true,
            exclude_body: None,
            skip_tag: None,
            with_normal: false,
        }
    }

    pub fn excluding(mut self, body: RigidBodyHandle) -> Self {
        self.exclude_body = Some(body);
        self
    }

    pub fn skipping(mut self, tag: ColliderTag) -> Self {
        self.skip_tag = Some(tag);
        self
    }

    pub fn with_normal(mut self) -> Self {
        self.with_normal = true;
        self
    }

    /// Whether a collider carrying `tags` may be hit by this query.
    pub fn accepts(&self, tags: ColliderTags) -> bool {
        self.skip_tag.is_none_or(|tag| !tags.has(tag))
    }
}

/// Operations the controller needs from a physics engine.
///
/// Mutating calls on a missing handle are no-ops; reads return `None`.
pub trait PhysicsWorld {
    fn body_state(&self, body: RigidBodyHandle) -> Option<BodyState>;

    fn apply_impulse(&mut self, body: RigidBodyHandle, impulse: Vec3);

    fn apply_impulse_at_point(&mut self, body: RigidBodyHandle, impulse: Vec3, point: Vec3);

    fn apply_torque_impulse(&mut self, body: RigidBodyHandle, torque: Vec3);

    fn set_linvel(&mut self, body: RigidBodyHandle, linvel: Vec3);

    fn set_gravity_scale(&mut self, body: RigidBodyHandle, scale: f32);

    fn set_rotation(&mut self, body: RigidBodyHandle, rotation: Quat);

    fn set_enabled_rotations(&mut self, body: RigidBodyHandle, x: bool, y: bool, z: bool);

    fn sleep(&mut self, body: RigidBodyHandle);

    fn wake_up(&mut self, body: RigidBodyHandle);

    fn cast_ray(&self, query: &RayQuery) -> Option<RayHit>;

    /// Distance to the first camera-blocking collider along the ray.
    fn cast_camera_ray(&self, origin: Vec3, dir: Vec3, max_toi: f32) -> Option<f32> {
        self.cast_ray(&RayQuery::new(origin, dir, max_toi).skipping(ColliderTag::ExcludeFromCamera))
            .map(|hit| hit.toi)
    }

    /// Whether `sensor` currently overlaps any non-sensor collider.
    fn sensor_intersecting(&self, sensor: ColliderHandle) -> bool;

    /// Total contact force acting on `body` during the last step.
    fn contact_force(&self, body: RigidBodyHandle) -> Vec3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_skips_tagged_colliders() {
        let query = RayQuery::new(Vec3::zeros(), -Vec3::y(), 1.0)
            .skipping(ColliderTag::ExcludeFromGroundRay);
        let tagged = ColliderTags::from_flags(&[ColliderTag::ExcludeFromGroundRay]);
        let camera_only = ColliderTags::from_flags(&[ColliderTag::ExcludeFromCamera]);
        assert!(!query.accepts(tagged));
        assert!(query.accepts(camera_only));
        assert!(RayQuery::new(Vec3::zeros(), Vec3::x(), 1.0).accepts(tagged));
    }

    #[test]
    fn point_velocity_includes_rotation() {
        let state = BodyState {
            kind: BodyKind::Kinematic,
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            linvel: Vec3::new(1.0, 0.0, 0.0),
            angvel: Vec3::new(0.0, 2.0, 0.0),
            mass: 1.0,
            gravity_scale: 1.0,
        };
        // w x r with w = 2 up and r = 1 along +x gives -2 along z.
        let v = state.velocity_at_point(&Vec3::new(1.0, 0.0, 0.0));
        assert!((v - Vec3::new(1.0, 0.0, -2.0)).norm() < 1.0e-6);
    }
}
