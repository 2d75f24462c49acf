//! Click-to-move steering and FixedCamera pivot turning.

use std::f32::consts::PI;

use crate::{
    constants::{POINT_ARRIVAL_DISTANCE, POINT_FOLLOW_CAMERA_RATE},
    input::InputFrame,
    types::Vec3,
    utils::{planar_distance, yaw_from_xz},
};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct PointPlan {
    /// Facing toward the target, when one is set.
    pub yaw: Option<f32>,
    /// Keep walking toward the target this tick.
    pub moving: bool,
    /// Drop the target at the end of the tick.
    pub clear: bool,
}

/// Decide how to follow `target` from `position`.
///
/// Arrival, a triggered wall sensor or any manual input ends the trip.
pub(crate) fn plan(
    target: Option<Vec3>,
    position: &Vec3,
    wall_hit: bool,
    manual: bool,
) -> PointPlan {
    let Some(target) = target else {
        return PointPlan::default();
    };
    let yaw = yaw_from_xz(target.x - position.x, target.z - position.z);
    let moving =
        planar_distance(position, &target) > POINT_ARRIVAL_DISTANCE && !wall_hit && !manual;
    PointPlan {
        yaw,
        moving,
        clear: !moving,
    }
}

/// Ease the pivot yaw toward the travel yaw along the shorter arc.
pub(crate) fn follow_yaw(
    pivot_yaw: f32,
    travel_yaw: f32,
    fixed_cam_rot_mult: f32,
    dt: f32,
) -> f32 {
    let t = (fixed_cam_rot_mult * dt * POINT_FOLLOW_CAMERA_RATE).clamp(0.0, 1.0);
    let diff = (travel_yaw - pivot_yaw + PI).rem_euclid(2.0 * PI) - PI;
    pivot_yaw + diff * t
}

fn in_band(angle: f32, center: f32) -> bool {
    let diff = (angle - center + PI).rem_euclid(2.0 * PI) - PI;
    diff.abs() < PI / 3.0
}

/// Pivot yaw change for FixedCamera mode: steering left or right turns the camera instead of
/// the character. Stick angles within 60 degrees of straight left or right count.
pub(crate) fn fixed_camera_turn(
    frame: &InputFrame,
    run: bool,
    sprint_mult: f32,
    fixed_cam_rot_mult: f32,
    dt: f32,
) -> f32 {
    let stick = frame.joystick;
    let left =
        frame.directions.leftward || (stick.is_active() && in_band(stick.angle, PI / 2.0));
    let right =
        frame.directions.rightward || (stick.is_active() && in_band(stick.angle, 3.0 * PI / 2.0));
    let rate = dt * fixed_cam_rot_mult * if run { sprint_mult } else { 1.0 };
    if left {
        rate
    } else if right {
        -rate
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Polar;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn plan_walks_until_arrival() {
        let target = Some(Vec3::new(3.0, 0.0, 0.0));
        let walking = plan(target, &Vec3::zeros(), false, false);
        assert!(walking.moving && !walking.clear);
        assert!((walking.yaw.unwrap() - FRAC_PI_2).abs() < 1.0e-6);

        let arrived = plan(target, &Vec3::new(2.8, 1.0, 0.0), false, false);
        assert!(!arrived.moving && arrived.clear);

        assert!(plan(target, &Vec3::zeros(), true, false).clear);
        assert!(plan(target, &Vec3::zeros(), false, true).clear);
        assert_eq!(plan(None, &Vec3::zeros(), false, false), PointPlan::default());
    }

    #[test]
    fn follow_takes_the_short_way_round() {
        let yaw = follow_yaw(3.0, -3.0, 1.0, 0.1);
        assert!(yaw > 3.0);
        let done = follow_yaw(0.0, 1.0, 1.0, 10.0);
        assert!((done - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn fixed_camera_bands() {
        let mut frame = InputFrame::default();
        assert_eq!(fixed_camera_turn(&frame, false, 2.0, 1.0, 0.1), 0.0);

        frame.joystick = Polar::new(1.0, FRAC_PI_2 + 0.9);
        assert!((fixed_camera_turn(&frame, false, 2.0, 1.0, 0.1) - 0.1).abs() < 1.0e-6);

        frame.joystick = Polar::new(1.0, 3.0 * FRAC_PI_2 - 0.9);
        assert!((fixed_camera_turn(&frame, true, 2.0, 1.0, 0.1) + 0.2).abs() < 1.0e-6);

        frame.joystick = Polar::new(1.0, 0.0);
        assert_eq!(fixed_camera_turn(&frame, false, 2.0, 1.0, 0.1), 0.0);

        frame.joystick = Polar::ZERO;
        frame.directions.rightward = true;
        assert!(fixed_camera_turn(&frame, false, 2.0, 1.0, 0.1) < 0.0);
    }
}
