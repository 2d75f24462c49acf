//! Suspension, jump, balance, gravity and drag.

use crate::{
    config::{BalanceConfig, ControllerConfig},
    types::{FloatState, Quat, Vec3},
    utils::angle_between,
};

/// Spring-damper holding the capsule at the floating distance.
pub(crate) fn float_state(
    config: &ControllerConfig,
    ray_toi: f32,
    vertical_velocity: f32,
) -> FloatState {
    let rest_distance = config.floating_distance();
    FloatState {
        rest_distance,
        ray_distance: Some(ray_toi),
        spring_force: config.ray.spring_k * (rest_distance - ray_toi)
            - vertical_velocity * config.ray.damping_c,
    }
}

/// Reaction pushed onto the standing body. Only compression pushes down.
pub(crate) fn spring_reaction(spring_force: f32) -> Vec3 {
    Vec3::new(0.0, if spring_force > 0.0 { -spring_force } else { 0.0 }, 0.0)
}

/// Take-off velocity.
///
/// The vertical component is exactly the jump speed. On slopes a horizontal push along the
/// surface normal's planar part is added, scaled by `slope_jump_mult`.
pub(crate) fn jump_velocity(
    config: &ControllerConfig,
    current: &Vec3,
    run: bool,
    slope_normal: Option<&Vec3>,
) -> Vec3 {
    let jump = &config.jump;
    let speed = if run {
        jump.jump_vel * jump.sprint_jump_mult
    } else {
        jump.jump_vel
    };
    let mut velocity = Vec3::new(current.x, speed, current.z);
    if let Some(n) = slope_normal {
        let len_sq = n.norm_squared();
        if len_sq > f32::EPSILON {
            let k = speed * jump.slope_jump_mult * n.y / len_sq;
            velocity.x += n.x * k;
            velocity.z += n.z * k;
        }
    }
    velocity
}

/// Signed angle-spring torque keeping the body upright and turned toward `facing`.
pub(crate) fn balance_torque(
    balance: &BalanceConfig,
    rotation: &Quat,
    angvel: &Vec3,
    facing: &Vec3,
) -> Vec3 {
    let up = Vec3::y();
    let body_up = rotation * Vec3::y();
    let body_forward = rotation * Vec3::z();

    let up_on_x = Vec3::new(0.0, body_up.y, body_up.z);
    let up_on_z = Vec3::new(body_up.x, body_up.y, 0.0);
    let forward_on_y = Vec3::new(body_forward.x, 0.0, body_forward.z);

    let sign = |v: f32| if v < 0.0 { 1.0 } else { -1.0 };
    let cross_x = up.cross(&up_on_x).x;
    let cross_y = facing.cross(&forward_on_y).y;
    let cross_z = up.cross(&up_on_z).z;

    Vec3::new(
        sign(cross_x) * balance.spring_k * angle_between(&up_on_x, &up)
            - angvel.x * balance.damping_c,
        sign(cross_y) * balance.spring_on_y * angle_between(facing, &forward_on_y)
            - angvel.y * balance.damping_on_y,
        sign(cross_z) * balance.spring_k * angle_between(&up_on_z, &up)
            - angvel.z * balance.damping_c,
    )
}

/// Gravity scale for this tick, or `None` to keep the current one.
pub(crate) fn gravity_scale(
    config: &ControllerConfig,
    current_scale: f32,
    initial_scale: f32,
    vertical_velocity: f32,
    falling: bool,
) -> Option<f32> {
    let wanted = if vertical_velocity < config.gravity.falling_max_vel {
        0.0
    } else if falling {
        config.gravity.falling_gravity_scale
    } else {
        initial_scale
    };
    (wanted != current_scale).then_some(wanted)
}

/// Horizontal impulse bleeding the velocity relative to `reference` toward zero.
///
/// The factor is capped by the body's mass so one impulse never reverses the motion.
pub(crate) fn idle_drag(
    drag_damping_c: f32,
    mass: f32,
    velocity: &Vec3,
    reference: &Vec3,
) -> Vec3 {
    let k = if mass > 0.0 {
        drag_damping_c.min(mass)
    } else {
        drag_damping_c
    };
    Vec3::new(
        (reference.x - velocity.x) * k,
        0.0,
        (reference.z - velocity.z) * k,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::yaw_rotation;

    #[test]
    fn spring_pushes_up_when_compressed() {
        let config = ControllerConfig::default();
        let state = float_state(&config, 0.5, 0.0);
        assert!((state.spring_force - 1.2 * 0.1).abs() < 1.0e-6);
        assert!((spring_reaction(state.spring_force).y + 0.12).abs() < 1.0e-6);

        let stretched = float_state(&config, 0.7, 0.0);
        assert!(stretched.spring_force < 0.0);
        assert_eq!(spring_reaction(stretched.spring_force), Vec3::zeros());

        let damped = float_state(&config, 0.6, -1.0);
        assert!((damped.spring_force - 0.08).abs() < 1.0e-6);
    }

    #[test]
    fn flat_jump_is_exact() {
        let config = ControllerConfig::default();
        let flat = Vec3::y();
        let v = jump_velocity(&config, &Vec3::new(1.0, -0.3, 0.5), false, Some(&flat));
        assert_eq!(v, Vec3::new(1.0, 4.0, 0.5));

        let sprint = jump_velocity(&config, &Vec3::zeros(), true, None);
        assert!((sprint.y - 4.8).abs() < 1.0e-6);
    }

    #[test]
    fn slope_jump_pushes_along_normal() {
        let config = ControllerConfig::default();
        let n = Vec3::new(0.6, 0.8, 0.0);
        let v = jump_velocity(&config, &Vec3::zeros(), false, Some(&n));
        assert_eq!(v.y, 4.0);
        assert!((v.x - 4.0 * 0.25 * 0.8 * 0.6).abs() < 1.0e-6);
    }

    #[test]
    fn upright_and_aligned_body_gets_no_torque() {
        let balance = BalanceConfig::default();
        let t = balance_torque(&balance, &Quat::identity(), &Vec3::zeros(), &Vec3::z());
        assert!(t.norm() < 1.0e-6);
    }

    #[test]
    fn tilt_and_yaw_errors_are_corrected() {
        let balance = BalanceConfig::default();
        let tilted = Quat::from_axis_angle(&Vec3::x_axis(), 0.3);
        let t = balance_torque(&balance, &tilted, &Vec3::zeros(), &Vec3::z());
        assert!(t.x < 0.0);

        let rolled = Quat::from_axis_angle(&Vec3::z_axis(), 0.3);
        let t = balance_torque(&balance, &rolled, &Vec3::zeros(), &Vec3::z());
        assert!(t.z < 0.0);

        // Facing yawed ahead of the body: torque turns toward it.
        let facing = yaw_rotation(0.5) * Vec3::z();
        let t = balance_torque(&balance, &Quat::identity(), &Vec3::zeros(), &facing);
        assert!(t.y > 0.0);

        let spinning = balance_torque(
            &balance,
            &Quat::identity(),
            &Vec3::new(0.0, 2.0, 0.0),
            &Vec3::z(),
        );
        assert!((spinning.y + 2.0 * 0.015).abs() < 1.0e-6);
    }

    #[test]
    fn gravity_scale_switches() {
        let config = ControllerConfig::default();
        assert_eq!(gravity_scale(&config, 1.0, 1.0, -1.0, true), Some(2.5));
        assert_eq!(gravity_scale(&config, 2.5, 1.0, -1.0, true), None);
        assert_eq!(gravity_scale(&config, 2.5, 1.0, -25.0, true), Some(0.0));
        assert_eq!(gravity_scale(&config, 2.5, 1.0, 0.0, false), Some(1.0));
    }

    #[test]
    fn idle_drag_never_overshoots() {
        let drag = idle_drag(0.15, 1.0, &Vec3::new(2.0, 5.0, -1.0), &Vec3::zeros());
        assert!((drag - Vec3::new(-0.3, 0.0, 0.15)).norm() < 1.0e-6);

        let light = idle_drag(0.15, 0.05, &Vec3::new(2.0, 0.0, 0.0), &Vec3::zeros());
        assert!((light.x + 0.1).abs() < 1.0e-6);

        let riding = Vec3::new(1.0, 0.0, 0.0);
        let relative = idle_drag(0.15, 1.0, &riding, &riding);
        assert_eq!(relative, Vec3::zeros());
    }
}
