pub mod animation;
pub mod bitmask_flags;
pub mod camera;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod input;
pub mod mode;
pub mod physics;
pub mod rapier;
pub mod rapier_world;
pub mod store;
pub mod types;
pub mod utils;

pub use animation::{AnimationSet, AnimationSlot, AnimationStateMachine, ClipPlayback, GameState};
pub use camera::{CameraPose, CameraRig, FollowCamera};
pub use config::ControllerConfig;
pub use controller::{CharacterController, ControllerStatus, GroundRule, PlatformContact};
pub use error::{ConfigError, ControllerError};
pub use input::{
    ButtonMap, Directions, GamepadSnapshot, InputAggregator, InputFrame, JoystickState,
    JoystickStore, KeyboardState, TouchJoystick, VirtualButton,
};
pub use mode::{ModeFlag, ModeFlags};
pub use physics::{BodyKind, BodyState, ColliderTag, ColliderTags, PhysicsWorld, RayHit, RayQuery};
pub use rapier::{ColliderShapeDef, WorldStaticDef, collider_from_def};
pub use rapier_world::{CharacterBody, PlatformDef, PlatformKind, RapierWorld};
pub use store::{Store, SubscriptionId};
pub use types::{FloatState, Polar, Quat, SlopeSample, Vec3};
