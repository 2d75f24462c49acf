/// Elapsed time per tick is wrapped below this bound (seconds).
///
/// A render stall (tab switch, debugger pause) would otherwise feed a huge `dt`
/// into the force loop and launch the body.
pub const MAX_TICK_DT: f32 = 1.0;

/// Maximum speed (m/s) of the standing platform relative to the character that is
/// inherited as the movement frame of reference.
pub const MAX_PLATFORM_RELATIVE_SPEED: f32 = 30.0;

/// Closest the camera may be pulled toward the pivot by collision correction (meters).
pub const MIN_CAMERA_COLLISION_DISTANCE: f32 = 0.7;

/// Camera offset interpolation rate toward the collision-corrected radius (per second).
pub const CAMERA_COLLISION_LERP_RATE: f32 = 4.0;

/// Remaining planar distance (meters) under which a point-to-move target counts as reached.
pub const POINT_ARRIVAL_DISTANCE: f32 = 0.3;

/// Point-to-move pivot follow rate in FixedCamera mode (multiplied by `fixed_cam_rot_mult`).
pub const POINT_FOLLOW_CAMERA_RATE: f32 = 3.0;

/// Analog stick magnitude above which the gamepad stick reports a run.
pub const GAMEPAD_RUN_THRESHOLD: f32 = 0.7;

/// Slope angles (radians) at or below this magnitude do not tilt the move direction.
pub const SLOPE_TILT_MIN_ANGLE: f32 = 0.2;

/// Forward push kept when the surface ahead is steeper than the walkable limit.
pub const STEEP_SLOPE_FORWARD_PUSH: f32 = 0.1;

/// Extra reach (meters) past the floating distance within which the slope ray still
/// produces a slope sample.
pub const SLOPE_SAMPLE_REACH: f32 = 0.5;

/// Decimal places kept when comparing the facing indicator against the desired yaw.
pub const TURN_COMPARE_SCALE: f32 = 1000.0;

/// Decimal scale used to round slope angles before use.
pub const SLOPE_ANGLE_SCALE: f32 = 100.0;

/// Pointer drag orbit sensitivity (radians per pixel, before `move_speed`).
pub const MOUSE_ORBIT_SENSITIVITY: f32 = 2.0e-3;

/// Wheel zoom sensitivity (meters per wheel unit, before `zoom_speed`).
pub const WHEEL_ZOOM_SENSITIVITY: f32 = 2.0e-3;

/// Single-finger touch orbit sensitivity (radians per pixel, before `move_speed`).
pub const TOUCH_ORBIT_SENSITIVITY: f32 = 5.0e-3;

/// Pinch zoom sensitivity (meters per pixel of finger spread, before `zoom_speed`).
pub const PINCH_ZOOM_SENSITIVITY: f32 = 0.01;

/// Gamepad right-stick orbit sensitivity (radians per unit deflection, before `move_speed`).
pub const STICK_ORBIT_SENSITIVITY: f32 = 2.5e-2;

/// Number of edge-triggered virtual buttons shared by touch and gamepad input.
pub const BUTTON_COUNT: usize = 5;
