/*!
Floating-capsule character controller.

[`CharacterController::tick`] runs once per frame, before the physics step, and queues every
impulse for the step that follows. A tick never fails: missing bodies, ray misses and invalid
intervals degrade to an airborne no-op. While the view is hidden, and until the delayed wake-up
fires, ticks leave the sleeping body alone.

Order within a tick:

1. read the body
2. camera follow and collision
3. desired facing
4. ground and slope rays
5. moving-platform coupling
6. move impulse and facing indicator turn
7. suspension spring
8. jump
9. auto-balance torque
10. gravity shaping
11. idle drag
12. animation requests
13. point-to-move bookkeeping
14. fixed-camera turning
*/

mod forces;
mod movement;
mod platform;
mod point_to_move;
mod scratch;
mod sensing;
mod visibility;

pub use platform::PlatformContact;
pub use sensing::GroundRule;

use rapier3d::prelude::RigidBodyHandle;

use crate::{
    animation::{AnimationSlot, AnimationStateMachine},
    camera::{CameraPose, FollowCamera},
    config::ControllerConfig,
    error::ConfigError,
    input::{
        EdgeDetector, GamepadSnapshot, InputAggregator, InputFrame, JoystickStore, KeyboardState,
        VirtualButton,
    },
    mode::ModeFlags,
    physics::{BodyKind, BodyState, PhysicsWorld},
    rapier_world::CharacterBody,
    types::{FloatState, Quat, SlopeSample, Vec3},
    utils::{rotate_towards, sanitize_dt, yaw_of, yaw_rotation},
};

use point_to_move::PointPlan;
use scratch::Scratch;
use visibility::Visibility;

/// What the controller measured and decided during the last tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControllerStatus {
    /// Ground ray within reach on a walkable slope.
    pub can_jump: bool,
    /// The ground ray hit something within its length.
    pub ground_hit: bool,
    /// Rise angle of the ground ahead, while grounded.
    pub slope_angle: Option<f32>,
    pub slope: Option<SlopeSample>,
    pub float: Option<FloatState>,
    /// The facing indicator had caught up with the desired yaw.
    pub rotated: bool,
    pub on_moving_object: bool,
    /// Reference velocity inherited from the standing platform.
    pub platform_velocity: Vec3,
    pub point_moving: bool,
    pub falling: bool,
    pub jumped: bool,
}

#[derive(Debug)]
pub struct CharacterController {
    config: ControllerConfig,
    modes: ModeFlags,
    ground_rule: GroundRule,
    character: CharacterBody,
    camera: FollowCamera,
    input: InputAggregator,
    indicator: Quat,
    desired_yaw: f32,
    last_slope: Option<SlopeSample>,
    status: ControllerStatus,
    action_edges: EdgeDetector<AnimationSlot>,
    visibility: Visibility,
    initial_gravity_scale: f32,
    /// Set on take-off; the body counts as airborne until it leaves the ground band or
    /// stops rising.
    jump_latched: bool,
    missing_body_logged: bool,
    scratch: Scratch,
}

impl CharacterController {
    pub fn new<W: PhysicsWorld + ?Sized>(
        config: ControllerConfig,
        character: CharacterBody,
        world: &mut W,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let modes = config.modes()?;

        let state = world.body_state(character.body);
        if state.is_none() {
            log::warn!(
                "{}",
                crate::error::ControllerError::MissingBody(character.body)
            );
        }
        let position = state.map_or_else(Vec3::zeros, |s| s.position);
        let initial_gravity_scale = state.map_or(1.0, |s| s.gravity_scale);

        if !config.balance.enabled {
            world.set_enabled_rotations(character.body, false, false, false);
        }

        let yaw = config.capsule.initial_yaw;
        log::info!("controller attached to {:?}", character.body);
        Ok(Self {
            ground_rule: GroundRule::from_config(&config),
            camera: FollowCamera::new(&config, modes, position),
            input: InputAggregator::new(config.buttons),
            indicator: yaw_rotation(yaw),
            desired_yaw: yaw,
            last_slope: None,
            status: ControllerStatus::default(),
            action_edges: EdgeDetector::default(),
            visibility: Visibility::default(),
            initial_gravity_scale,
            jump_latched: false,
            missing_body_logged: false,
            scratch: Scratch::default(),
            config,
            modes,
            character,
        })
    }

    #[inline]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[inline]
    pub fn modes(&self) -> ModeFlags {
        self.modes
    }

    #[inline]
    pub fn body(&self) -> RigidBodyHandle {
        self.character.body
    }

    #[inline]
    pub fn status(&self) -> ControllerStatus {
        self.status
    }

    pub fn camera(&self) -> &FollowCamera {
        &self.camera
    }

    /// Pointer, wheel and touch events go straight to the camera.
    pub fn camera_mut(&mut self) -> &mut FollowCamera {
        &mut self.camera
    }

    pub fn camera_pose(&self) -> CameraPose {
        self.camera.pose()
    }

    pub fn input(&self) -> &InputAggregator {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputAggregator {
        &mut self.input
    }

    /// Facing the model is turning toward.
    pub fn indicator(&self) -> Quat {
        self.indicator
    }

    /// Rotation the character model should render with.
    ///
    /// With auto-balance the model follows the body; otherwise rotations are locked and the
    /// model shows the facing indicator (or the camera heading in camera-based movement).
    pub fn visual_rotation<W: PhysicsWorld + ?Sized>(&self, world: &W) -> Quat {
        if self.config.balance.enabled {
            world
                .body_state(self.character.body)
                .map_or(self.indicator, |s| s.rotation)
        } else if self.modes.camera_based() {
            yaw_rotation(self.camera.rig().yaw)
        } else {
            self.indicator
        }
    }

    /// Build this tick's input frame from whatever sources the host has.
    pub fn gather_input(
        &mut self,
        keyboard: Option<&KeyboardState>,
        gamepad: Option<&GamepadSnapshot>,
        joystick: &mut JoystickStore,
    ) -> InputFrame {
        self.input.frame(keyboard, gamepad, joystick)
    }

    /// Store a click-to-move target. Ignored unless point-to-move is enabled.
    pub fn set_move_target(&self, animation: &mut AnimationStateMachine, target: Vec3) -> bool {
        if !self.modes.point_to_move() {
            return false;
        }
        animation.set_move_to_point(Some(target))
    }

    pub fn on_visibility_change<W: PhysicsWorld + ?Sized>(&mut self, visible: bool, world: &mut W) {
        self.visibility.set_visible(
            visible,
            self.config.gravity.wake_up_delay,
            self.character.body,
            world,
        );
    }

    /// Detach from the body and input sources so the handle can be reused.
    pub fn despawn<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        joystick: &mut JoystickStore,
        animation: &mut AnimationStateMachine,
    ) {
        world.set_rotation(self.character.body, Quat::identity());
        self.indicator = Quat::identity();
        self.input.detach(joystick);
        self.action_edges.clear();
        self.jump_latched = false;
        animation.set_move_to_point(None);
        self.scratch.reset();
        self.status = ControllerStatus::default();
        log::info!("controller detached from {:?}", self.character.body);
    }

    /// Run one control tick. Impulses are consumed by the next physics step.
    pub fn tick<W: PhysicsWorld + ?Sized>(
        &mut self,
        dt: f32,
        frame: &InputFrame,
        world: &mut W,
        animation: &mut AnimationStateMachine,
    ) -> ControllerStatus {
        let dt = sanitize_dt(dt);
        let body = self.character.body;
        self.scratch.reset();
        self.visibility.advance(dt, body, world);
        // One-shot clips may finish while hidden.
        animation.poll_finished();
        if self.visibility.is_suspended() {
            return self.status;
        }

        // 1
        let Some(state) = world.body_state(body) else {
            if !self.missing_body_logged {
                log::warn!("{}", crate::error::ControllerError::MissingBody(body));
                self.missing_body_logged = true;
            }
            self.status = ControllerStatus::default();
            return self.status;
        };
        self.scratch.position = state.position;
        self.scratch.velocity = state.linvel;
        self.scratch.mass = state.mass;

        // 2
        self.camera.stick_look(frame.camera_look);
        self.camera.update(dt, state.position, &*world);
        let pivot_yaw = self.camera.rig().yaw;

        // 3
        let input_moving = frame.has_movement();
        let jump_pressed = frame.wants_jump();
        let point = self.plan_point(frame, world, animation, &state.position);
        let input_yaw = movement::desired_yaw(frame, pivot_yaw);
        if let Some(yaw) = input_yaw.or(point.yaw.filter(|_| point.moving)) {
            self.desired_yaw = yaw;
        } else if self.modes.camera_based() && self.config.balance.enabled {
            self.desired_yaw = pivot_yaw;
        }

        // 4
        let (ground, can_jump) = self.sense(world, &state);
        let ground_toi = ground.map(|(_, toi)| toi);
        let slope_angle = self.status.slope_angle;
        let actual_slope = self.last_slope.map(|s| s.angle);

        // 5
        let ground_body = ground
            .and_then(|(body, _)| body)
            .and_then(|b| world.body_state(b).map(|s| (b, s)));
        let contact = if can_jump {
            ground_body.and_then(|(b, s)| {
                platform::sample(b, &s, &state.position, &state.linvel, state.mass)
            })
        } else {
            None
        };
        if let Some(contact) = &contact {
            self.scratch.platform_velocity = contact.velocity;
        }

        // 6
        let run =
            input_moving && (frame.run || (frame.joystick.is_active() && frame.joystick_run));
        let rotated = movement::is_rotated(yaw_of(&self.indicator), self.desired_yaw);
        if input_moving || point.moving {
            self.scratch.moving_direction = movement::moving_direction(
                slope_angle,
                actual_slope,
                self.config.slope.max_angle,
                &self.indicator,
            );
            self.scratch.move_impulse = movement::move_impulse(
                &self.config,
                &self.scratch.moving_direction,
                &movement::MoveState {
                    velocity: state.linvel,
                    platform_velocity: self.scratch.platform_velocity,
                    on_moving_object: contact.is_some(),
                    can_jump,
                    rotated,
                    run,
                    mass: state.mass,
                    slope_angle,
                },
            );
            let point_y = state.position + Vec3::y() * self.config.movement.move_impulse_point_y;
            world.apply_impulse_at_point(body, self.scratch.move_impulse, point_y);
        }
        self.indicator = rotate_towards(
            &self.indicator,
            &yaw_rotation(self.desired_yaw),
            self.config.movement.turn_speed * dt,
        );

        let idle = !input_moving && !point.moving && can_jump;
        if let Some(contact) = &contact {
            let exerted = -world.contact_force(body);
            if let Some(reaction) = platform::reaction_impulse(
                contact,
                idle,
                exerted,
                self.scratch.move_impulse,
                dt,
            ) {
                world.apply_impulse_at_point(contact.body, reaction, self.scratch.standing_point);
            }
        }

        // 7
        let standing_on = ground_body.filter(|(_, s)| s.kind != BodyKind::Fixed);
        let mut float = None;
        if let (true, Some(toi)) = (can_jump, ground_toi) {
            let spring = forces::float_state(&self.config, toi, state.linvel.y);
            world.apply_impulse(body, Vec3::new(0.0, spring.spring_force, 0.0));
            self.scratch.mass_force = forces::spring_reaction(spring.spring_force);
            if let Some((standing, _)) = standing_on {
                world.apply_impulse_at_point(
                    standing,
                    self.scratch.mass_force,
                    self.scratch.standing_point,
                );
            }
            float = Some(spring);
        }

        // 8
        let jumped = jump_pressed && can_jump;
        if jumped {
            self.jump_latched = true;
            let current = world.body_state(body).map_or(state.linvel, |s| s.linvel);
            let normal = self.last_slope.map(|s| s.normal);
            let velocity =
                forces::jump_velocity(&self.config, &current, frame.run, normal.as_ref());
            world.set_linvel(body, velocity);
            if let Some((standing, _)) = standing_on {
                let push = Vec3::new(
                    0.0,
                    self.scratch.mass_force.y * self.config.jump.jump_force_to_ground_mult,
                    0.0,
                );
                world.apply_impulse_at_point(standing, push, self.scratch.standing_point);
            }
        }

        // 9
        if self.config.balance.enabled {
            let facing = if self.modes.camera_based() {
                self.camera.rig().forward()
            } else {
                self.indicator * Vec3::z()
            };
            let torque = forces::balance_torque(
                &self.config.balance,
                &state.rotation,
                &state.angvel,
                &facing,
            );
            world.apply_torque_impulse(body, torque);
        }

        // 10
        let falling = state.linvel.y < 0.0 && !can_jump;
        if let Some(scale) = forces::gravity_scale(
            &self.config,
            state.gravity_scale,
            self.initial_gravity_scale,
            state.linvel.y,
            falling,
        ) {
            world.set_gravity_scale(body, scale);
        }

        // 11
        if idle {
            let drag = forces::idle_drag(
                self.config.movement.drag_damping_c,
                state.mass,
                &state.linvel,
                &self.scratch.platform_velocity,
            );
            world.apply_impulse(body, drag);
        }

        // 12
        self.request_actions(frame, animation);
        if idle && !jump_pressed {
            animation.idle();
        } else if jump_pressed && can_jump {
            animation.jump();
        } else if can_jump && (input_moving || point.moving) {
            if run {
                animation.run();
            } else {
                animation.walk();
            }
        } else if !can_jump {
            animation.jump_idle();
        }
        if ground.is_none() && falling {
            animation.fall();
        }

        // 13
        if self.modes.point_to_move() {
            if point.clear {
                animation.set_move_to_point(None);
            }
            if let (true, Some(yaw)) = (self.modes.fixed_camera(), point.yaw) {
                let rig_yaw = self.camera.rig().yaw;
                self.camera.set_yaw(point_to_move::follow_yaw(
                    rig_yaw,
                    yaw,
                    self.config.movement.fixed_cam_rot_mult,
                    dt,
                ));
            }
        }

        // 14
        // Joystick angle 0 is forward, counter-clockwise positive: left is pi/2, right 3pi/2.
        if self.modes.fixed_camera() {
            self.camera.add_yaw(point_to_move::fixed_camera_turn(
                frame,
                frame.run,
                self.config.movement.sprint_mult,
                self.config.movement.fixed_cam_rot_mult,
                dt,
            ));
        }

        self.status = ControllerStatus {
            float,
            rotated,
            on_moving_object: contact.is_some(),
            platform_velocity: self.scratch.platform_velocity,
            point_moving: point.moving,
            falling,
            jumped,
            ..self.status
        };
        self.status
    }

    fn plan_point<W: PhysicsWorld + ?Sized>(
        &self,
        frame: &InputFrame,
        world: &W,
        animation: &AnimationStateMachine,
        position: &Vec3,
    ) -> PointPlan {
        if !self.modes.point_to_move() {
            return PointPlan::default();
        }
        let wall_hit = self
            .character
            .wall_sensor
            .is_some_and(|sensor| world.sensor_intersecting(sensor));
        let manual = frame.has_movement() || frame.wants_jump();
        point_to_move::plan(animation.move_to_point(), position, wall_hit, manual)
    }

    /// Cast the ground and slope rays, refreshing `can_jump`, the slope sample and the slope
    /// angle in `status`. Returns the ground hit's body and distance, and whether the body is
    /// supported this tick.
    ///
    /// Right after a jump the ground ray still lands inside the forgiveness band, so the
    /// published `can_jump` stays true. The jump latch withholds support until the body stops
    /// rising, which keeps the spring from pulling it back down and blocks a second jump.
    fn sense<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &W,
        state: &BodyState,
    ) -> (Option<(Option<RigidBodyHandle>, f32)>, bool) {
        let body = self.character.body;
        let ray_origin = state.position + self.config.ray_origin_offset();
        self.scratch.ray_origin = ray_origin;

        let ground = sensing::cast_ground(world, body, ray_origin, self.config.ray_length());
        let ground_toi = ground.map(|hit| hit.toi);

        let offset = self.config.slope_ray_origin_offset();
        let ahead = self.slope_ray_heading(state);
        let slope_hit = sensing::cast_slope(
            world,
            body,
            ray_origin + ahead * offset,
            self.config.slope_ray_length(),
        );
        self.last_slope = slope_hit.as_ref().and_then(sensing::slope_sample);

        let grounded = self
            .ground_rule
            .can_jump(ground_toi, self.last_slope.map(|s| s.angle));
        if self.jump_latched && (!grounded || state.linvel.y <= 0.0) {
            self.jump_latched = false;
        }
        let supported = grounded && !self.jump_latched;
        let slope_angle = sensing::slope_angle(
            supported,
            ground_toi,
            slope_hit.map(|hit| hit.toi),
            self.ground_rule.floating_distance,
            offset,
        );

        if let Some(toi) = ground_toi {
            self.scratch.standing_point = ray_origin - Vec3::y() * toi;
        }
        self.status.can_jump = grounded;
        self.status.ground_hit = ground.is_some();
        self.status.slope = self.last_slope;
        self.status.slope_angle = slope_angle;
        (ground.map(|hit| (hit.body, hit.toi)), supported)
    }

    /// Planar unit heading the slope ray is pushed along.
    fn slope_ray_heading(&self, state: &BodyState) -> Vec3 {
        let indicator = self.indicator * Vec3::z();
        let forward = if self.config.balance.enabled && !self.modes.camera_based() {
            state.rotation * Vec3::z()
        } else {
            indicator
        };
        let planar = Vec3::new(forward.x, 0.0, forward.z);
        planar
            .try_normalize(f32::EPSILON)
            .or_else(|| Vec3::new(indicator.x, 0.0, indicator.z).try_normalize(f32::EPSILON))
            .unwrap_or_else(Vec3::z)
    }

    /// Rising edges of action keys and virtual buttons request their action slot.
    fn request_actions(&mut self, frame: &InputFrame, animation: &mut AnimationStateMachine) {
        let actions = [
            (
                AnimationSlot::Action1,
                frame.action1 || frame.button(VirtualButton::Button5),
            ),
            (
                AnimationSlot::Action2,
                frame.action2 || frame.button(VirtualButton::Button3),
            ),
            (
                AnimationSlot::Action3,
                frame.action3 || frame.button(VirtualButton::Button4),
            ),
            (
                AnimationSlot::Action4,
                frame.action4 || frame.button(VirtualButton::Button2),
            ),
        ];
        for (slot, down) in actions {
            if self.action_edges.pressed(slot, down) {
                animation.request(slot);
            }
        }
    }
}
