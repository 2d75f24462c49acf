/*!
Third-person follow camera.

The rig is a pivot that trails the character (yaw applied here) and an offset in pivot space
(pitch and distance applied here). The camera eye eases toward the offset's world position and
looks at the pivot. A ray from the pivot toward the nominal eye position pulls the offset in
when geometry blocks the view.

Distances are positive meters behind the pivot.
*/

use crate::{
    config::ControllerConfig,
    constants::{
        CAMERA_COLLISION_LERP_RATE, MIN_CAMERA_COLLISION_DISTANCE, MOUSE_ORBIT_SENSITIVITY,
        PINCH_ZOOM_SENSITIVITY, STICK_ORBIT_SENSITIVITY, TOUCH_ORBIT_SENSITIVITY,
        WHEEL_ZOOM_SENSITIVITY,
    },
    mode::ModeFlags,
    physics::PhysicsWorld,
    types::{Polar, Vec3},
    utils::{smoothing_factor, yaw_forward, yaw_rotation},
};

/// Where the render camera should be this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    pub pivot: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Distance requested by zoom input, before collision correction.
    pub distance: f32,
    /// Current eye offset in pivot space.
    pub offset: Vec3,
}

impl CameraRig {
    /// Eye offset direction in pivot space for `pitch`.
    fn offset_dir(pitch: f32) -> Vec3 {
        Vec3::new(0.0, pitch.sin(), -pitch.cos())
    }

    /// World position of the current offset.
    pub fn offset_world(&self) -> Vec3 {
        self.pivot + yaw_rotation(self.yaw) * self.offset
    }

    /// Planar forward of the pivot.
    pub fn forward(&self) -> Vec3 {
        yaw_forward(self.yaw)
    }
}

#[derive(Clone, Copy, Debug)]
struct CameraLimits {
    min_distance: f32,
    max_distance: f32,
    low_pitch: f32,
    up_pitch: f32,
    move_speed: f32,
    zoom_speed: f32,
    collision: bool,
    collision_offset: f32,
    follow_mult: f32,
    lerp_mult: f32,
}

#[derive(Debug)]
pub struct FollowCamera {
    rig: CameraRig,
    limits: CameraLimits,
    target_offset: Vec3,
    enabled: bool,
    pose: CameraPose,
    pointer_down: bool,
    pointer_locked: bool,
    last_touch: Option<(f32, f32)>,
    last_pinch: Option<f32>,
}

impl FollowCamera {
    pub fn new(config: &ControllerConfig, modes: ModeFlags, body_position: Vec3) -> Self {
        let cam = &config.camera;
        let fixed = modes.fixed_camera();
        let limits = CameraLimits {
            min_distance: cam.min_distance,
            max_distance: cam.max_distance.max(cam.min_distance),
            low_pitch: cam.low_limit.min(cam.up_limit),
            up_pitch: cam.up_limit.max(cam.low_limit),
            move_speed: if fixed { 0.0 } else { cam.move_speed },
            zoom_speed: if fixed { 0.0 } else { cam.zoom_speed },
            collision: cam.collision,
            collision_offset: cam.collision_offset,
            follow_mult: cam.follow_mult,
            lerp_mult: cam.lerp_mult,
        };

        let target_offset = config.camera_target_offset();
        let distance = cam
            .init_distance
            .clamp(limits.min_distance, limits.max_distance);
        let pitch = cam.init_pitch.clamp(limits.low_pitch, limits.up_pitch);
        let rig = CameraRig {
            pivot: body_position + target_offset,
            yaw: cam.init_yaw,
            pitch,
            distance,
            offset: CameraRig::offset_dir(pitch) * distance,
        };

        let pose = if cam.enabled {
            CameraPose {
                eye: rig.offset_world(),
                target: rig.pivot,
            }
        } else {
            CameraPose {
                eye: cam.fixed_position.map(Vec3::from).unwrap_or(rig.offset_world()),
                target: cam.fixed_target.map(Vec3::from).unwrap_or(rig.pivot),
            }
        };

        Self {
            rig,
            limits,
            target_offset,
            enabled: cam.enabled,
            pose,
            pointer_down: false,
            pointer_locked: false,
            last_touch: None,
            last_pinch: None,
        }
    }

    #[inline]
    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    #[inline]
    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Turn the pivot directly (FixedCamera steering, point-to-move follow).
    pub fn add_yaw(&mut self, delta: f32) {
        self.rig.yaw += delta;
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.rig.yaw = yaw;
    }

    pub fn pointer_down(&mut self) {
        self.pointer_down = true;
    }

    pub fn pointer_up(&mut self) {
        self.pointer_down = false;
    }

    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.pointer_locked = locked;
    }

    /// Mouse motion in pixels. Orbits only while a button is held or the pointer is locked.
    pub fn pointer_move(&mut self, dx: f32, dy: f32) {
        if self.pointer_down || self.pointer_locked {
            let k = MOUSE_ORBIT_SENSITIVITY * self.limits.move_speed;
            self.orbit(dx * k, dy * k);
        }
    }

    /// Wheel delta; positive moves the camera away.
    pub fn wheel(&mut self, delta: f32) {
        let d = self.rig.distance + delta * WHEEL_ZOOM_SENSITIVITY * self.limits.zoom_speed;
        self.zoom_to(d);
    }

    /// Touch positions (pixels) of the active fingers, in order.
    pub fn touch_move(&mut self, touches: &[(f32, f32)]) {
        match touches {
            [] => self.touch_end(),
            [one] => {
                if let (Some((px, py)), None) = (self.last_touch, self.last_pinch) {
                    let k = TOUCH_ORBIT_SENSITIVITY * self.limits.move_speed;
                    self.orbit((one.0 - px) * k, (one.1 - py) * k);
                }
                self.last_touch = Some(*one);
                self.last_pinch = None;
            }
            [a, b, ..] => {
                let spread = (a.0 - b.0).hypot(a.1 - b.1);
                if let Some(previous) = self.last_pinch {
                    let d = self.rig.distance
                        + (previous - spread) * PINCH_ZOOM_SENSITIVITY * self.limits.zoom_speed;
                    self.zoom_to(d);
                }
                self.last_touch = Some(*a);
                self.last_pinch = Some(spread);
            }
        }
    }

    pub fn touch_end(&mut self) {
        self.last_touch = None;
        self.last_pinch = None;
    }

    /// Gamepad right stick, applied once per poll.
    pub fn stick_look(&mut self, look: Polar) {
        if !look.is_active() {
            return;
        }
        let (x, y_up) = look.to_stick();
        let k = STICK_ORBIT_SENSITIVITY * self.limits.move_speed;
        self.orbit(x * k, -y_up * k);
    }

    fn orbit(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.rig.yaw -= yaw_delta;
        let pitch = (self.rig.pitch + pitch_delta).clamp(self.limits.low_pitch, self.limits.up_pitch);
        if pitch != self.rig.pitch {
            let length = self.rig.offset.norm();
            self.rig.pitch = pitch;
            self.rig.offset = CameraRig::offset_dir(pitch) * length;
        }
    }

    fn zoom_to(&mut self, distance: f32) {
        if !distance.is_finite() {
            return;
        }
        self.rig.distance = distance.clamp(self.limits.min_distance, self.limits.max_distance);
        self.rig.offset = CameraRig::offset_dir(self.rig.pitch) * self.rig.distance;
    }

    /// Corrected distance for a blocking hit at `hit`, or the nominal distance when clear.
    pub fn corrected_distance(&self, hit: Option<f32>) -> f32 {
        match hit {
            Some(d) if d <= self.rig.distance => {
                (d * self.limits.collision_offset).max(MIN_CAMERA_COLLISION_DISTANCE)
            }
            _ => self.rig.distance,
        }
    }

    /// Advance one tick: follow the body, ease the eye, correct for collisions.
    pub fn update<W: PhysicsWorld + ?Sized>(&mut self, dt: f32, body_position: Vec3, world: &W) {
        let goal = body_position + self.target_offset;
        self.rig.pivot += (goal - self.rig.pivot) * smoothing_factor(self.limits.follow_mult, dt);

        if !self.enabled {
            return;
        }

        let eye_goal = self.rig.offset_world();
        self.pose.eye += (eye_goal - self.pose.eye) * smoothing_factor(self.limits.lerp_mult, dt);
        self.pose.target = self.rig.pivot;

        if self.limits.collision {
            let dir = yaw_rotation(self.rig.yaw) * CameraRig::offset_dir(self.rig.pitch);
            let hit = world.cast_camera_ray(self.rig.pivot, dir, self.limits.max_distance);
            let radius = self.corrected_distance(hit);
            let goal_offset = CameraRig::offset_dir(self.rig.pitch) * radius;
            let t = (dt * CAMERA_COLLISION_LERP_RATE).min(1.0);
            self.rig.offset += (goal_offset - self.rig.offset) * t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> FollowCamera {
        FollowCamera::new(
            &ControllerConfig::default(),
            ModeFlags::default(),
            Vec3::zeros(),
        )
    }

    #[test]
    fn zoom_stays_within_bounds() {
        let mut cam = camera();
        for _ in 0..100 {
            cam.wheel(500.0);
        }
        assert_eq!(cam.rig().distance, 7.0);
        for _ in 0..100 {
            cam.wheel(-500.0);
        }
        assert_eq!(cam.rig().distance, 0.7);

        cam.touch_move(&[(0.0, 0.0), (400.0, 0.0)]);
        cam.touch_move(&[(0.0, 0.0), (0.0, 1.0)]);
        assert!(cam.rig().distance <= 7.0 && cam.rig().distance >= 0.7);
    }

    #[test]
    fn pitch_is_clamped_and_needs_drag() {
        let mut cam = camera();
        cam.pointer_move(0.0, 10_000.0);
        assert_eq!(cam.rig().pitch, 0.0);

        cam.pointer_down();
        cam.pointer_move(0.0, 10_000.0);
        assert_eq!(cam.rig().pitch, 1.5);
        cam.pointer_move(0.0, -100_000.0);
        assert_eq!(cam.rig().pitch, -1.3);

        cam.pointer_up();
        cam.set_pointer_locked(true);
        cam.pointer_move(100.0, 0.0);
        assert!((cam.rig().yaw + 0.2).abs() < 1.0e-5);
    }

    #[test]
    fn collision_correction_bounds() {
        let cam = camera();
        assert!((cam.corrected_distance(Some(3.0)) - 2.1).abs() < 1.0e-5);
        assert_eq!(cam.corrected_distance(Some(0.2)), 0.7);
        assert_eq!(cam.corrected_distance(Some(6.0)), 5.0);
        assert_eq!(cam.corrected_distance(None), 5.0);
    }

    #[test]
    fn fixed_mode_ignores_orbit_and_zoom() {
        let modes = ModeFlags::parse("FixedCamera").unwrap();
        let mut cam = FollowCamera::new(&ControllerConfig::default(), modes, Vec3::zeros());
        cam.pointer_down();
        cam.pointer_move(100.0, 100.0);
        cam.wheel(1000.0);
        assert_eq!(cam.rig().yaw, 0.0);
        assert_eq!(cam.rig().distance, 5.0);
    }

    #[test]
    fn default_eye_sits_behind_pivot() {
        let cam = camera();
        let pose = cam.pose();
        assert!((pose.eye.z + 5.0).abs() < 1.0e-5);
        assert!((pose.target.y - 0.5).abs() < 1.0e-5);
    }
}
