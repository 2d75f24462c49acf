//! Tunable controller parameters.
//!
//! Every group deserializes with `#[serde(default)]`, so a TOML file only needs the keys it
//! overrides. Defaults reproduce the stock floating-capsule tuning.

use serde::{Deserialize, Serialize};

use crate::{
    animation::AnimationSet, error::ConfigError, input::ButtonMap, mode::ModeFlags, types::Vec3,
};

/// Gamepad button indices above this are rejected by [`ControllerConfig::validate`].
pub const MAX_GAMEPAD_BUTTONS: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapsuleConfig {
    /// Half height of the cylindrical part (meters).
    pub half_height: f32,
    pub radius: f32,
    /// Gap held between the capsule bottom and the ground (meters).
    pub float_height: f32,
    /// Facing yaw at spawn (radians).
    pub initial_yaw: f32,
}

impl Default for CapsuleConfig {
    fn default() -> Self {
        Self {
            half_height: 0.35,
            radius: 0.3,
            float_height: 0.3,
            initial_yaw: 0.0,
        }
    }
}

/// Ground ray and suspension spring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RayConfig {
    pub hit_forgiveness: f32,
    /// Ray length; `radius + 2` when absent.
    pub length: Option<f32>,
    pub spring_k: f32,
    pub damping_c: f32,
}

impl Default for RayConfig {
    fn default() -> Self {
        Self {
            hit_forgiveness: 0.1,
            length: None,
            spring_k: 1.2,
            damping_c: 0.08,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeConfig {
    /// Steepest walkable surface (radians).
    pub max_angle: f32,
    /// Forward offset of the slope ray origin; `radius - 0.03` when absent.
    pub ray_origin_offset: Option<f32>,
    /// Slope ray length; `radius + 3` when absent.
    pub ray_length: Option<f32>,
    pub up_extra_force: f32,
    pub down_extra_force: f32,
}

impl Default for SlopeConfig {
    fn default() -> Self {
        Self {
            max_angle: 1.0,
            ray_origin_offset: None,
            ray_length: None,
            up_extra_force: 0.1,
            down_extra_force: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Target walking speed (meters/second).
    pub max_vel_limit: f32,
    /// Impulse scale while the model is still turning toward the desired facing.
    pub turn_vel_multiplier: f32,
    /// Facing turn rate (radians/second).
    pub turn_speed: f32,
    pub sprint_mult: f32,
    pub air_drag_multiplier: f32,
    pub drag_damping_c: f32,
    /// Time constant (seconds) used to turn a velocity error into an acceleration.
    pub acc_delta_time: f32,
    pub reject_vel_mult: f32,
    /// Height above the body center at which the move impulse is applied.
    pub move_impulse_point_y: f32,
    pub fixed_cam_rot_mult: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_vel_limit: 2.5,
            turn_vel_multiplier: 0.2,
            turn_speed: 15.0,
            sprint_mult: 2.0,
            air_drag_multiplier: 0.2,
            drag_damping_c: 0.15,
            acc_delta_time: 8.0,
            reject_vel_mult: 4.0,
            move_impulse_point_y: 0.5,
            fixed_cam_rot_mult: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    pub jump_vel: f32,
    pub jump_force_to_ground_mult: f32,
    pub slope_jump_mult: f32,
    pub sprint_jump_mult: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            jump_vel: 4.0,
            jump_force_to_ground_mult: 5.0,
            slope_jump_mult: 0.25,
            sprint_jump_mult: 1.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    pub falling_gravity_scale: f32,
    /// Vertical velocity (negative) at which gravity is switched off.
    pub falling_max_vel: f32,
    /// Delay before waking the body after the view becomes visible (seconds).
    pub wake_up_delay: f32,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            falling_gravity_scale: 2.5,
            falling_max_vel: -20.0,
            wake_up_delay: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub enabled: bool,
    pub spring_k: f32,
    pub damping_c: f32,
    pub spring_on_y: f32,
    pub damping_on_y: f32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spring_k: 0.3,
            damping_c: 0.03,
            spring_on_y: 0.5,
            damping_on_y: 0.015,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// When false the camera is placed once at `fixed_position` looking at `fixed_target`.
    pub enabled: bool,
    pub init_distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Highest pitch (radians).
    pub up_limit: f32,
    /// Lowest pitch (radians).
    pub low_limit: f32,
    pub init_pitch: f32,
    pub init_yaw: f32,
    /// Pivot offset above the body center; `(0, half_height + radius / 2, 0)` when absent.
    pub target_offset: Option<[f32; 3]>,
    pub move_speed: f32,
    pub zoom_speed: f32,
    pub collision: bool,
    pub collision_offset: f32,
    pub follow_mult: f32,
    pub lerp_mult: f32,
    pub fixed_position: Option<[f32; 3]>,
    pub fixed_target: Option<[f32; 3]>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            init_distance: 5.0,
            min_distance: 0.7,
            max_distance: 7.0,
            up_limit: 1.5,
            low_limit: -1.3,
            init_pitch: 0.0,
            init_yaw: 0.0,
            target_offset: None,
            move_speed: 1.0,
            zoom_speed: 1.0,
            collision: true,
            collision_offset: 0.7,
            follow_mult: 11.0,
            lerp_mult: 25.0,
            fixed_position: None,
            fixed_target: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub capsule: CapsuleConfig,
    pub ray: RayConfig,
    pub slope: SlopeConfig,
    pub movement: MovementConfig,
    pub jump: JumpConfig,
    pub gravity: GravityConfig,
    pub balance: BalanceConfig,
    pub camera: CameraConfig,
    /// Space separated mode tokens, see [`ModeFlags::parse`].
    pub mode: String,
    pub buttons: ButtonMap,
    pub animations: AnimationSet,
    /// Character scene to load. Empty selects the built-in capsule model.
    pub character_asset: String,
    pub animation_assets: Vec<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            capsule: CapsuleConfig::default(),
            ray: RayConfig::default(),
            slope: SlopeConfig::default(),
            movement: MovementConfig::default(),
            jump: JumpConfig::default(),
            gravity: GravityConfig::default(),
            balance: BalanceConfig::default(),
            camera: CameraConfig::default(),
            mode: "Default".to_owned(),
            buttons: ButtonMap::default(),
            animations: AnimationSet::default(),
            character_asset: String::new(),
            animation_assets: Vec::new(),
        }
    }
}

impl ControllerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("capsule.radius", self.capsule.radius)?;
        non_negative("capsule.half_height", self.capsule.half_height)?;
        non_negative("capsule.float_height", self.capsule.float_height)?;
        positive("movement.acc_delta_time", self.movement.acc_delta_time)?;

        let cam = &self.camera;
        non_negative("camera.min_distance", cam.min_distance)?;
        within(
            "camera.max_distance",
            cam.max_distance,
            cam.min_distance,
            f32::MAX,
        )?;
        within(
            "camera.init_distance",
            cam.init_distance,
            cam.min_distance,
            cam.max_distance,
        )?;
        if !(cam.low_limit < cam.up_limit) {
            return Err(ConfigError::InvalidRange {
                field: "camera.low_limit",
                min: f32::MIN,
                max: cam.up_limit,
                value: cam.low_limit,
            });
        }
        within(
            "camera.init_pitch",
            cam.init_pitch,
            cam.low_limit,
            cam.up_limit,
        )?;

        for (action, index) in self.buttons.entries() {
            if index >= MAX_GAMEPAD_BUTTONS {
                return Err(ConfigError::InvalidButtonIndex { action, index });
            }
        }

        self.modes().map(|_| ())
    }

    pub fn modes(&self) -> Result<ModeFlags, ConfigError> {
        ModeFlags::parse(&self.mode)
    }

    /// Rest distance between the ground ray origin and the ground.
    #[inline]
    pub fn floating_distance(&self) -> f32 {
        self.capsule.radius + self.capsule.float_height
    }

    #[inline]
    pub fn ray_length(&self) -> f32 {
        self.ray.length.unwrap_or(self.capsule.radius + 2.0)
    }

    #[inline]
    pub fn slope_ray_origin_offset(&self) -> f32 {
        self.slope
            .ray_origin_offset
            .unwrap_or(self.capsule.radius - 0.03)
    }

    #[inline]
    pub fn slope_ray_length(&self) -> f32 {
        self.slope.ray_length.unwrap_or(self.capsule.radius + 3.0)
    }

    /// Local-space origin of the ground ray, at the bottom of the cylindrical part.
    #[inline]
    pub fn ray_origin_offset(&self) -> Vec3 {
        Vec3::new(0.0, -self.capsule.half_height, 0.0)
    }

    pub fn camera_target_offset(&self) -> Vec3 {
        self.camera
            .target_offset
            .map(Vec3::from)
            .unwrap_or_else(|| {
                Vec3::new(0.0, self.capsule.half_height + self.capsule.radius / 2.0, 0.0)
            })
    }
}

fn within(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange {
            field,
            min,
            max,
            value,
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    within(field, value, 0.0, f32::MAX)
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    within(field, value, f32::MIN_POSITIVE, f32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_and_derive_ray_geometry() {
        let config = ControllerConfig::default();
        config.validate().unwrap();
        assert!((config.floating_distance() - 0.6).abs() < 1.0e-6);
        assert!((config.ray_length() - 2.3).abs() < 1.0e-6);
        assert!((config.slope_ray_origin_offset() - 0.27).abs() < 1.0e-6);
        assert!((config.slope_ray_length() - 3.3).abs() < 1.0e-6);
        assert!((config.camera_target_offset().y - 0.5).abs() < 1.0e-6);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = ControllerConfig::from_toml_str(
            r#"
            mode = "PointToMove"

            [movement]
            max_vel_limit = 4.0

            [buttons]
            jump = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.movement.max_vel_limit, 4.0);
        assert_eq!(config.movement.sprint_mult, 2.0);
        assert_eq!(config.buttons.jump, 0);
        assert_eq!(config.buttons.forward, 12);
        assert!(config.modes().unwrap().point_to_move());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = ControllerConfig::from_toml_str("[camera]\ninit_distance = 12.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidRange {
                field: "camera.init_distance",
                ..
            }
        ));

        let err = ControllerConfig::from_toml_str("[buttons]\naction4 = 40").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidButtonIndex {
                action: "action4",
                index: 40
            }
        ));

        let err = ControllerConfig::from_toml_str("mode = \"Hover\"").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMode(_)));

        let err = ControllerConfig::from_toml_str("mode = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
