//! Ground and slope sensing.

use rapier3d::prelude::RigidBodyHandle;

use crate::{
    config::ControllerConfig,
    constants::{SLOPE_ANGLE_SCALE, SLOPE_SAMPLE_REACH},
    physics::{ColliderTag, PhysicsWorld, RayHit, RayQuery},
    types::{SlopeSample, Vec3},
    utils::{angle_between, round_to},
};

/// Thresholds deciding whether the character stands on walkable ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundRule {
    pub floating_distance: f32,
    pub hit_forgiveness: f32,
    pub slope_max_angle: f32,
}

impl GroundRule {
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            floating_distance: config.floating_distance(),
            hit_forgiveness: config.ray.hit_forgiveness,
            slope_max_angle: config.slope.max_angle,
        }
    }

    /// Grounded and allowed to jump: the ground ray hit within reach and the last measured
    /// surface ahead is walkable. A missing slope sample counts as not walkable.
    pub fn can_jump(&self, ground_toi: Option<f32>, slope_angle: Option<f32>) -> bool {
        match (ground_toi, slope_angle) {
            (Some(toi), Some(angle)) => {
                toi < self.floating_distance + self.hit_forgiveness
                    && angle < self.slope_max_angle
            }
            _ => false,
        }
    }
}

/// Cast the ground ray straight down from the bottom of the capsule's cylinder.
pub(crate) fn cast_ground<W: PhysicsWorld + ?Sized>(
    world: &W,
    body: RigidBodyHandle,
    ray_origin: Vec3,
    length: f32,
) -> Option<RayHit> {
    world.cast_ray(
        &RayQuery::new(ray_origin, -Vec3::y(), length)
            .excluding(body)
            .skipping(ColliderTag::ExcludeFromGroundRay),
    )
}

/// Cast the slope ray from a point ahead of the ground ray origin, returning the surface
/// normal.
pub(crate) fn cast_slope<W: PhysicsWorld + ?Sized>(
    world: &W,
    body: RigidBodyHandle,
    origin: Vec3,
    length: f32,
) -> Option<RayHit> {
    world.cast_ray(
        &RayQuery::new(origin, -Vec3::y(), length)
            .excluding(body)
            .skipping(ColliderTag::ExcludeFromGroundRay)
            .with_normal(),
    )
}

/// Slope of the surface under the slope ray, from its normal.
pub(crate) fn slope_sample(hit: &RayHit) -> Option<SlopeSample> {
    let normal = hit.normal?;
    if normal.norm_squared() <= f32::EPSILON {
        return None;
    }
    Some(SlopeSample {
        angle: angle_between(&normal, &Vec3::y()),
        normal: normal.normalize(),
    })
}

/// Rise angle of the ground ahead, from the height difference between the two rays.
///
/// Positive uphill. Only defined while grounded and while the slope ray lands close enough
/// to the float height.
pub(crate) fn slope_angle(
    can_jump: bool,
    ground_toi: Option<f32>,
    slope_toi: Option<f32>,
    floating_distance: f32,
    horizontal_offset: f32,
) -> Option<f32> {
    let (ground, slope) = (ground_toi?, slope_toi?);
    if !can_jump || slope >= floating_distance + SLOPE_SAMPLE_REACH || horizontal_offset <= 0.0 {
        return None;
    }
    Some(round_to(
        ((ground - slope) / horizontal_offset).atan(),
        SLOPE_ANGLE_SCALE,
    ))
}
