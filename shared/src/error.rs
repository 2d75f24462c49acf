use rapier3d::prelude::RigidBodyHandle;
use thiserror::Error;

use crate::animation::AnimationSlot;

/// Failures detected while building a controller from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown controller mode token `{0}`")]
    UnknownMode(String),

    #[error("`{field}` = {value} is outside [{min}, {max}]")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },

    #[error("gamepad button index {index} for `{action}` is out of range")]
    InvalidButtonIndex { action: &'static str, index: usize },

    #[error("failed to parse controller config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Non-fatal runtime conditions. These are logged and degrade to a safe default;
/// the per-tick path never propagates them.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("rigid body {0:?} is not present in the physics world")]
    MissingBody(RigidBodyHandle),

    #[error("no clip is mapped for animation slot {0:?}")]
    AnimationClipNotFound(AnimationSlot),

    #[error("failed to load asset `{asset}`: {reason}")]
    AssetLoad { asset: String, reason: String },

    #[error("no keyboard control context is present")]
    InputSourceUnavailable,
}
