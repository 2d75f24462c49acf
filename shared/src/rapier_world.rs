//! rapier3d implementation of [`PhysicsWorld`].
//!
//! Owns the full simulation state (bodies, colliders, phases, solver) and exposes helpers to
//! build a scene: fixed statics from [`WorldStaticDef`]s, moving platforms and the floating
//! character capsule.
//!
//! Colliders become visible to ray queries after [`RapierWorld::refresh_queries`] or the next
//! [`RapierWorld::step`]; the scene builders refresh on their own.
//!
//! Camera collision uses a precomputed set of blocking colliders that is refreshed whenever a
//! collider is inserted or removed.

use std::collections::HashSet;

use rapier3d::na::{Isometry3, Translation3};
use rapier3d::prelude::*;

use crate::{
    config::ControllerConfig,
    physics::{BodyKind, BodyState, ColliderTag, ColliderTags, PhysicsWorld, RayHit, RayQuery},
    rapier::{ColliderShapeDef, WorldStaticDef, collider_from_def, collider_from_shape},
    types::{Quat, Vec3},
};

pub const DEFAULT_GRAVITY: f32 = -9.81;

/// Handles of a spawned character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacterBody {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
    /// Front wall sensor, present when point-to-move is enabled.
    pub wall_sensor: Option<ColliderHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlatformKind {
    Dynamic,
    Kinematic,
}

/// A moving or pushable box.
#[derive(Clone, Debug)]
pub struct PlatformDef {
    pub kind: PlatformKind,
    pub position: Vec3,
    pub half_extents: Vec3,
    /// Initial velocity; kinematic platforms keep it.
    pub linvel: Vec3,
    pub angvel: Vec3,
    pub density: f32,
}

pub struct RapierWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    islands: IslandManager,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    pipeline: PhysicsPipeline,
    integration: IntegrationParameters,
    gravity: Vector<f32>,
    camera_blockers: HashSet<ColliderHandle>,
    last_dt: f32,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, DEFAULT_GRAVITY, 0.0))
    }
}

impl RapierWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            islands: IslandManager::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            pipeline: PhysicsPipeline::new(),
            integration: IntegrationParameters::default(),
            gravity,
            camera_blockers: HashSet::new(),
            last_dt: 0.0,
        }
    }

    /// Build a world from static definitions, inserted in `id` order.
    pub fn with_statics(mut defs: Vec<WorldStaticDef>) -> Self {
        defs.sort_by_key(|d| d.id);
        let mut world = Self::default();
        for def in defs {
            world.add_static(&def);
        }
        world.refresh_queries();
        world
    }

    /// Make colliders inserted since the last step visible to ray queries.
    pub fn refresh_queries(&mut self) {
        let handles: Vec<ColliderHandle> = self.colliders.iter().map(|(h, _)| h).collect();
        let mut events = Vec::new();
        self.broad_phase.update(
            &self.integration,
            &self.colliders,
            &self.bodies,
            &handles,
            &[],
            &mut events,
        );
    }

    pub fn add_static(&mut self, def: &WorldStaticDef) -> ColliderHandle {
        let iso = Isometry3::from_parts(Translation3::from(def.translation), def.rotation);
        let rb = self.bodies.insert(RigidBodyBuilder::fixed().pose(iso).build());
        self.insert_collider(collider_from_def(def), rb)
    }

    pub fn spawn_platform(&mut self, def: &PlatformDef) -> RigidBodyHandle {
        let builder = match def.kind {
            PlatformKind::Dynamic => RigidBodyBuilder::dynamic(),
            PlatformKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
        };
        let rb = self.bodies.insert(
            builder
                .translation(def.position)
                .linvel(def.linvel)
                .angvel(def.angvel)
                .build(),
        );
        let collider = collider_from_shape(&ColliderShapeDef::Cuboid {
            half_extents: def.half_extents,
        })
        .density(def.density)
        .build();
        self.insert_collider(collider, rb);
        self.refresh_queries();
        rb
    }

    /// Spawn the floating capsule. The capsule is hidden from the camera ray.
    pub fn spawn_character(
        &mut self,
        position: Vec3,
        config: &ControllerConfig,
        wall_sensor: bool,
    ) -> CharacterBody {
        let capsule = &config.capsule;
        let body = self.bodies.insert(
            RigidBodyBuilder::dynamic()
                .translation(position)
                .rotation(Vector::y() * capsule.initial_yaw)
                .build(),
        );

        let tags = ColliderTags::from_flags(&[ColliderTag::ExcludeFromCamera]);
        let collider = ColliderBuilder::capsule_y(capsule.half_height, capsule.radius)
            .friction(0.0)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .user_data(tags.bits)
            .build();
        let collider = self.insert_collider(collider, body);

        let wall_sensor = wall_sensor.then(|| {
            let sensor = ColliderBuilder::cylinder(capsule.half_height / 2.0, capsule.radius)
                .sensor(true)
                .translation(Vector::new(0.0, 0.0, capsule.radius / 2.0))
                .user_data(tags.bits)
                .build();
            self.insert_collider(sensor, body)
        });

        self.refresh_queries();
        log::info!("spawned character body {body:?} at {position:?}");
        CharacterBody {
            body,
            collider,
            wall_sensor,
        }
    }

    pub fn remove_body(&mut self, body: RigidBodyHandle) {
        if let Some(rb) = self.bodies.get(body) {
            for collider in rb.colliders() {
                self.camera_blockers.remove(collider);
            }
        }
        self.bodies.remove(
            body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn insert_collider(&mut self, collider: Collider, parent: RigidBodyHandle) -> ColliderHandle {
        let blocks_camera =
            !collider.is_sensor() && !tags_of(&collider).has(ColliderTag::ExcludeFromCamera);
        let handle = self
            .colliders
            .insert_with_parent(collider, parent, &mut self.bodies);
        if blocks_camera {
            self.camera_blockers.insert(handle);
        }
        handle
    }

    /// Advance the simulation, consuming impulses queued since the last step.
    pub fn step(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        self.integration.dt = dt;
        self.last_dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    pub fn camera_blockers(&self) -> impl Iterator<Item = &ColliderHandle> {
        self.camera_blockers.iter()
    }

    fn with_body(&mut self, body: RigidBodyHandle, f: impl FnOnce(&mut RigidBody)) {
        match self.bodies.get_mut(body) {
            Some(rb) => f(rb),
            None => log::warn!("{}", crate::error::ControllerError::MissingBody(body)),
        }
    }
}

fn tags_of(collider: &Collider) -> ColliderTags {
    ColliderTags::new(collider.user_data)
}

impl PhysicsWorld for RapierWorld {
    fn body_state(&self, body: RigidBodyHandle) -> Option<BodyState> {
        let rb = self.bodies.get(body)?;
        let kind = if rb.is_dynamic() {
            BodyKind::Dynamic
        } else if rb.is_kinematic() {
            BodyKind::Kinematic
        } else {
            BodyKind::Fixed
        };
        Some(BodyState {
            kind,
            position: *rb.translation(),
            rotation: *rb.rotation(),
            linvel: *rb.linvel(),
            angvel: *rb.angvel(),
            mass: rb.mass(),
            gravity_scale: rb.gravity_scale(),
        })
    }

    fn apply_impulse(&mut self, body: RigidBodyHandle, impulse: Vec3) {
        self.with_body(body, |rb| rb.apply_impulse(impulse, true));
    }

    fn apply_impulse_at_point(&mut self, body: RigidBodyHandle, impulse: Vec3, point: Vec3) {
        self.with_body(body, |rb| {
            rb.apply_impulse_at_point(impulse, point.into(), true)
        });
    }

    fn apply_torque_impulse(&mut self, body: RigidBodyHandle, torque: Vec3) {
        self.with_body(body, |rb| rb.apply_torque_impulse(torque, true));
    }

    fn set_linvel(&mut self, body: RigidBodyHandle, linvel: Vec3) {
        self.with_body(body, |rb| rb.set_linvel(linvel, true));
    }

    fn set_gravity_scale(&mut self, body: RigidBodyHandle, scale: f32) {
        self.with_body(body, |rb| {
            if rb.gravity_scale() != scale {
                rb.set_gravity_scale(scale, true);
            }
        });
    }

    fn set_rotation(&mut self, body: RigidBodyHandle, rotation: Quat) {
        self.with_body(body, |rb| rb.set_rotation(rotation, true));
    }

    fn set_enabled_rotations(&mut self, body: RigidBodyHandle, x: bool, y: bool, z: bool) {
        self.with_body(body, |rb| rb.set_enabled_rotations(x, y, z, true));
    }

    fn sleep(&mut self, body: RigidBodyHandle) {
        self.with_body(body, |rb| rb.sleep());
    }

    fn wake_up(&mut self, body: RigidBodyHandle) {
        self.with_body(body, |rb| rb.wake_up(true));
    }

    fn cast_ray(&self, query: &RayQuery) -> Option<RayHit> {
        let predicate = |_: ColliderHandle, c: &Collider| query.accepts(tags_of(c));
        let mut filter = QueryFilter::default().predicate(&predicate);
        if query.exclude_sensors {
            filter = filter.exclude_sensors();
        }
        if let Some(body) = query.exclude_body {
            filter = filter.exclude_rigid_body(body);
        }

        let pipeline = self.query_pipeline(filter);
        let ray = Ray::new(query.origin.into(), query.dir);
        let (collider, toi, normal) = if query.with_normal {
            let (handle, hit) = pipeline.cast_ray_and_get_normal(&ray, query.max_toi, true)?;
            (handle, hit.time_of_impact, Some(hit.normal))
        } else {
            let (handle, toi) = pipeline.cast_ray(&ray, query.max_toi, true)?;
            (handle, toi, None)
        };

        Some(RayHit {
            toi,
            collider,
            body: self.colliders.get(collider).and_then(|c| c.parent()),
            normal,
        })
    }

    fn cast_camera_ray(&self, origin: Vec3, dir: Vec3, max_toi: f32) -> Option<f32> {
        let predicate = |handle: ColliderHandle, _: &Collider| self.camera_blockers.contains(&handle);
        let filter = QueryFilter::default().predicate(&predicate);
        let ray = Ray::new(origin.into(), dir);
        self.query_pipeline(filter)
            .cast_ray(&ray, max_toi, true)
            .map(|(_, toi)| toi)
    }

    fn sensor_intersecting(&self, sensor: ColliderHandle) -> bool {
        self.narrow_phase
            .intersection_pairs_with(sensor)
            .any(|(a, b, intersecting)| {
                let other = if a == sensor { b } else { a };
                intersecting && self.colliders.get(other).is_some_and(|c| !c.is_sensor())
            })
    }

    fn contact_force(&self, body: RigidBodyHandle) -> Vec3 {
        let Some(rb) = self.bodies.get(body) else {
            return Vec3::zeros();
        };
        if self.last_dt <= 0.0 {
            return Vec3::zeros();
        }

        let mut total = Vec3::zeros();
        for &collider in rb.colliders() {
            for pair in self.narrow_phase.contact_pairs_with(collider) {
                if !pair.has_any_active_contact {
                    continue;
                }
                // Pair impulses push collider2 along the contact normal.
                let impulse = pair.total_impulse();
                total += if pair.collider2 == collider {
                    impulse
                } else {
                    -impulse
                };
            }
        }
        total / self.last_dt
    }
}
