//! Facing resolution and the horizontal move impulse.

use crate::{
    config::ControllerConfig,
    constants::{SLOPE_TILT_MIN_ANGLE, STEEP_SLOPE_FORWARD_PUSH, TURN_COMPARE_SCALE},
    input::InputFrame,
    types::{Quat, Vec3},
    utils::{angle_between, facing_from_directions, project_on, round_to},
};

/// Desired facing yaw from the highest-priority active source.
///
/// Gamepad digital directions win over the analog stick, which wins over the keyboard.
/// Returns `None` when no source is steering.
pub(crate) fn desired_yaw(frame: &InputFrame, reference_yaw: f32) -> Option<f32> {
    let pad = frame.gamepad_directions;
    if pad.any() {
        return facing_from_directions(
            pad.forward,
            pad.backward,
            pad.leftward,
            pad.rightward,
            reference_yaw,
        );
    }
    if frame.joystick.is_active() {
        return Some(reference_yaw + frame.joystick.angle);
    }
    let keys = frame.directions;
    facing_from_directions(
        keys.forward,
        keys.backward,
        keys.leftward,
        keys.rightward,
        reference_yaw,
    )
}

/// Whether the facing indicator has caught up with the desired yaw.
pub(crate) fn is_rotated(indicator_yaw: f32, desired_yaw: f32) -> bool {
    round_to(indicator_yaw.sin(), TURN_COMPARE_SCALE)
        == round_to(desired_yaw.sin(), TURN_COMPARE_SCALE)
}

/// Unit move direction in world space, tilted along walkable slopes.
///
/// On ground steeper than the walkable limit only the downhill tilt is kept and forward push
/// almost vanishes, so the character slides instead of climbing.
pub(crate) fn moving_direction(
    slope_angle: Option<f32>,
    actual_slope: Option<f32>,
    slope_max_angle: f32,
    indicator: &Quat,
) -> Vec3 {
    let angle = slope_angle.unwrap_or(0.0);
    let walkable = actual_slope.is_none_or(|a| a < slope_max_angle);
    let local = if walkable && angle.abs() > SLOPE_TILT_MIN_ANGLE && angle.abs() < slope_max_angle
    {
        Vec3::new(0.0, angle.sin(), angle.cos())
    } else if !walkable {
        let rise = angle.sin();
        if rise > 0.0 {
            Vec3::new(0.0, 0.0, STEEP_SLOPE_FORWARD_PUSH)
        } else {
            Vec3::new(0.0, rise, 1.0)
        }
    } else {
        Vec3::z()
    };
    indicator * local
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct MoveState {
    pub velocity: Vec3,
    pub platform_velocity: Vec3,
    pub on_moving_object: bool,
    pub can_jump: bool,
    pub rotated: bool,
    pub run: bool,
    pub mass: f32,
    pub slope_angle: Option<f32>,
}

/// Impulse steering the velocity toward the target speed along `dir`.
pub(crate) fn move_impulse(config: &ControllerConfig, dir: &Vec3, state: &MoveState) -> Vec3 {
    let m = &config.movement;
    let sprint = if state.run { m.sprint_mult } else { 1.0 };
    let target_speed = m.max_vel_limit * sprint;

    let v = state.velocity;
    let p = state.platform_velocity;
    let p_along = project_on(&p, dir);
    let p_cross = angle_between(&p, dir).sin();

    let along = v.dot(dir);
    let reject = v - Vec3::new(dir.x * along, 0.0, dir.z * along);
    let reject_k = if state.on_moving_object {
        0.0
    } else {
        m.reject_vel_mult
    };

    let acc_x = (dir.x * (target_speed + p_along.x) - (v.x - p.x * p_cross + reject.x * reject_k))
        / m.acc_delta_time;
    let acc_z = (dir.z * (target_speed + p_along.z) - (v.z - p.z * p_cross + reject.z * reject_k))
        / m.acc_delta_time;

    let turn = if state.rotated {
        1.0
    } else {
        m.turn_vel_multiplier
    };
    let air = if state.can_jump {
        1.0
    } else {
        m.air_drag_multiplier
    };

    let vertical = match state.slope_angle {
        Some(angle) if angle != 0.0 => {
            let extra = if dir.y > 0.0 {
                config.slope.up_extra_force
            } else {
                config.slope.down_extra_force
            };
            dir.y * turn * extra * sprint
        }
        _ => 0.0,
    };

    Vec3::new(
        acc_x * state.mass * turn * air,
        vertical,
        acc_z * state.mass * turn * air,
    )
}
