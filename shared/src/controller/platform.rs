//! Moving-platform coupling.
//!
//! While standing on a dynamic or kinematic body the character inherits that body's point
//! velocity as its frame of reference. Dynamic platforms also receive reaction impulses so
//! heavy characters push light platforms around.

use rapier3d::prelude::RigidBodyHandle;

use crate::{
    constants::MAX_PLATFORM_RELATIVE_SPEED,
    physics::{BodyKind, BodyState},
    types::Vec3,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlatformContact {
    pub body: RigidBodyHandle,
    pub kind: BodyKind,
    /// Reference velocity after mass scaling and clamping.
    pub velocity: Vec3,
    /// `min(1, platform_mass / character_mass)`.
    pub transfer: f32,
}

/// Share of platform motion and reaction that crosses between platform and character.
pub(crate) fn transfer_ratio(character_mass: f32, platform_mass: f32) -> f32 {
    if !(character_mass > 0.0) || !(platform_mass > 0.0) {
        return 1.0;
    }
    (platform_mass / character_mass).min(1.0)
}

/// Limit the platform velocity so it differs from the character's by at most
/// [`MAX_PLATFORM_RELATIVE_SPEED`].
pub(crate) fn clamp_relative(platform: Vec3, character: Vec3) -> Vec3 {
    let diff = platform - character;
    let speed = diff.norm();
    if speed > MAX_PLATFORM_RELATIVE_SPEED {
        character + diff * (MAX_PLATFORM_RELATIVE_SPEED / speed)
    } else {
        platform
    }
}

/// Build the coupling for a ground body, or `None` when it does not move.
pub(crate) fn sample(
    body: RigidBodyHandle,
    platform: &BodyState,
    character_position: &Vec3,
    character_velocity: &Vec3,
    character_mass: f32,
) -> Option<PlatformContact> {
    if platform.kind == BodyKind::Fixed {
        return None;
    }
    let transfer = if platform.kind == BodyKind::Dynamic {
        transfer_ratio(character_mass, platform.mass)
    } else {
        1.0
    };

    let point = platform.velocity_at_point(character_position);
    let raw = Vec3::new(point.x, platform.linvel.y, point.z) * transfer;
    Some(PlatformContact {
        body,
        kind: platform.kind,
        velocity: clamp_relative(raw, *character_velocity),
        transfer,
    })
}

/// Reaction impulse for a dynamic platform.
///
/// Idle: cancel the force the character exerted on the platform during the last step.
/// Moving: push back against the character's own move impulse.
pub(crate) fn reaction_impulse(
    contact: &PlatformContact,
    idle: bool,
    exerted_force: Vec3,
    move_impulse: Vec3,
    dt: f32,
) -> Option<Vec3> {
    if contact.kind != BodyKind::Dynamic {
        return None;
    }
    let impulse = if idle {
        -exerted_force * dt * contact.transfer
    } else {
        -move_impulse * contact.transfer
    };
    Some(impulse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quat;

    fn platform(kind: BodyKind, mass: f32) -> BodyState {
        BodyState {
            kind,
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            linvel: Vec3::new(0.5, 0.1, 0.0),
            angvel: Vec3::new(0.0, 1.0, 0.0),
            mass,
            gravity_scale: 1.0,
        }
    }

    #[test]
    fn kinematic_platform_velocity_is_point_velocity() {
        let handle = RigidBodyHandle::from_raw_parts(1, 0);
        let contact = sample(
            handle,
            &platform(BodyKind::Kinematic, 0.0),
            &Vec3::new(2.0, 1.0, 0.0),
            &Vec3::zeros(),
            1.0,
        )
        .unwrap();
        // w x r = (0,1,0) x (2,1,0) = (0,0,-2)
        assert!((contact.velocity - Vec3::new(0.5, 0.1, -2.0)).norm() < 1.0e-5);
        assert_eq!(contact.transfer, 1.0);
        assert!(reaction_impulse(&contact, true, Vec3::y(), Vec3::x(), 0.1).is_none());
    }

    #[test]
    fn fixed_ground_is_not_a_platform() {
        let handle = RigidBodyHandle::from_raw_parts(1, 0);
        assert!(
            sample(
                handle,
                &platform(BodyKind::Fixed, 0.0),
                &Vec3::zeros(),
                &Vec3::zeros(),
                1.0
            )
            .is_none()
        );
    }

    #[test]
    fn light_dynamic_platform_transfers_less() {
        let handle = RigidBodyHandle::from_raw_parts(1, 0);
        let contact = sample(
            handle,
            &platform(BodyKind::Dynamic, 0.5),
            &Vec3::zeros(),
            &Vec3::zeros(),
            2.0,
        )
        .unwrap();
        assert!((contact.transfer - 0.25).abs() < 1.0e-6);
        assert!((contact.velocity.x - 0.125).abs() < 1.0e-6);

        let idle = reaction_impulse(&contact, true, Vec3::new(0.0, 10.0, 0.0), Vec3::zeros(), 0.1)
            .unwrap();
        assert!((idle - Vec3::new(0.0, -0.25, 0.0)).norm() < 1.0e-6);

        let moving =
            reaction_impulse(&contact, false, Vec3::zeros(), Vec3::new(4.0, 0.0, 0.0), 0.1)
                .unwrap();
        assert!((moving - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1.0e-6);
    }

    #[test]
    fn relative_speed_is_clamped() {
        let v = clamp_relative(Vec3::new(100.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0));
        assert!((v.x - 40.0).abs() < 1.0e-4);
        let slow = clamp_relative(Vec3::new(5.0, 0.0, 0.0), Vec3::zeros());
        assert_eq!(slow, Vec3::new(5.0, 0.0, 0.0));
    }
}
