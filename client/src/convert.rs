//! Conversions between bevy's glam types and the nalgebra types used by `hover_shared`.
//!
//! Both sides are foreign to this crate, so these are plain functions instead of `From` impls.

use bevy::prelude::*;
use hover_shared::types as na;

#[inline]
pub fn to_bevy_vec(v: &na::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub fn to_na_vec(v: Vec3) -> na::Vec3 {
    na::Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub fn to_bevy_quat(q: &na::Quat) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

#[inline]
pub fn to_na_quat(q: Quat) -> na::Quat {
    na::Quat::new_normalize(nalgebra::Quaternion::new(q.w, q.x, q.y, q.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quaternions_agree_on_rotated_axes() {
        let bevy_q = Quat::from_rotation_y(0.7);
        let na_q = to_na_quat(bevy_q);
        let rotated = na_q * na::Vec3::z();
        let expected = bevy_q * Vec3::Z;
        assert!((to_bevy_vec(&rotated) - expected).length() < 1.0e-5);
        assert!(to_bevy_quat(&na_q).angle_between(bevy_q) < 1.0e-4);
    }
}
