use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::types::{Quat, Vec3};

const EPS_SQ: f32 = 1.0e-12;

/// Yaw (radians about +Y) that faces along the planar vector `(x, z)`.
///
/// Yaw `0` faces +Z. Returns `None` for a degenerate vector.
pub fn yaw_from_xz(x: f32, z: f32) -> Option<f32> {
    if x * x + z * z > EPS_SQ {
        Some(x.atan2(z))
    } else {
        None
    }
}

/// Rotation about world up by `yaw`.
#[inline]
pub fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::y_axis(), yaw)
}

/// Planar forward (+Z rotated by `yaw`).
#[inline]
pub fn yaw_forward(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Eight-way facing from digital directions, relative to `reference_yaw`.
///
/// Opposite directions are not cancelled: forward wins over backward and left over right.
pub fn facing_from_directions(
    forward: bool,
    backward: bool,
    leftward: bool,
    rightward: bool,
    reference_yaw: f32,
) -> Option<f32> {
    let offset = match (forward, backward, leftward, rightward) {
        (false, false, false, false) => return None,
        (true, _, true, _) => FRAC_PI_4,
        (true, _, _, true) => -FRAC_PI_4,
        (true, _, _, _) => 0.0,
        (_, true, true, _) => PI - FRAC_PI_4,
        (_, true, _, true) => PI + FRAC_PI_4,
        (_, true, _, _) => PI,
        (_, _, true, _) => FRAC_PI_2,
        (_, _, _, true) => -FRAC_PI_2,
    };
    Some(reference_yaw + offset)
}

/// Rotate `from` toward `to` by at most `max_angle` radians.
pub fn rotate_towards(from: &Quat, to: &Quat, max_angle: f32) -> Quat {
    let angle = from.angle_to(to);
    if angle <= f32::EPSILON || max_angle <= 0.0 {
        return if angle <= f32::EPSILON { *to } else { *from };
    }
    let t = (max_angle / angle).min(1.0);
    from.try_slerp(to, t, 1.0e-6).unwrap_or(*to)
}

/// Project `v` onto the direction of `onto`. Zero when `onto` is degenerate.
pub fn project_on(v: &Vec3, onto: &Vec3) -> Vec3 {
    let len_sq = onto.norm_squared();
    if len_sq <= EPS_SQ {
        return Vec3::zeros();
    }
    onto * (v.dot(onto) / len_sq)
}

/// Angle between two vectors; a quarter turn when either is degenerate.
pub fn angle_between(a: &Vec3, b: &Vec3) -> f32 {
    let denom = (a.norm_squared() * b.norm_squared()).sqrt();
    if denom <= EPS_SQ {
        return FRAC_PI_2;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Frame-rate independent interpolation factor for an exponential approach at `rate`.
#[inline]
pub fn smoothing_factor(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

#[inline]
pub fn round_to(value: f32, scale: f32) -> f32 {
    (value * scale).round() / scale
}

/// Horizontal (XZ) distance between two points.
#[inline]
pub fn planar_distance(a: &Vec3, b: &Vec3) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    (dx * dx + dz * dz).sqrt()
}

/// Yaw extracted from a rotation's forward axis.
pub fn yaw_of(rotation: &Quat) -> f32 {
    let fwd = rotation * Vec3::z();
    yaw_from_xz(fwd.x, fwd.z).unwrap_or(0.0)
}

/// Wrap a tick interval so stalls never exceed [`crate::constants::MAX_TICK_DT`].
pub fn sanitize_dt(dt: f32) -> f32 {
    use crate::constants::MAX_TICK_DT;
    if !dt.is_finite() || dt < 0.0 {
        log::warn!("ignoring invalid tick interval {dt}");
        return 0.0;
    }
    if dt > MAX_TICK_DT { dt % MAX_TICK_DT } else { dt }
}
