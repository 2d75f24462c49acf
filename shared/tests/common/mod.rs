//! Scripted physics world for controller tests.
//!
//! Flat ground at `y = 0`, optionally a disk platform on top of it. Impulses change velocity
//! immediately, `step` integrates gravity and position with explicit Euler. Rotation never
//! changes, so torques are only recorded. The ground may report a tilted normal and the camera
//! ray may be blocked at a fixed distance.

#![allow(dead_code)]

use std::collections::HashMap;

use hover_shared::{
    BodyKind, BodyState, CharacterBody, PhysicsWorld, Quat, RayHit, RayQuery, Vec3,
};
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

pub const GRAVITY: f32 = -9.81;

/// Body center height at which the ground ray sits exactly at the default floating distance.
pub const REST_HEIGHT: f32 = 0.95;

#[derive(Clone, Copy, Debug)]
pub struct Disk {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Clone, Debug)]
pub struct MockBody {
    pub state: BodyState,
    pub asleep: bool,
    pub rotations_enabled: bool,
    pub torque: Vec3,
}

pub struct MockWorld {
    pub bodies: HashMap<RigidBodyHandle, MockBody>,
    pub ground_body: RigidBodyHandle,
    pub ground_collider: ColliderHandle,
    pub disk: Option<Disk>,
    /// Normal reported by rays that ask for one.
    pub ground_normal: Vec3,
    /// Distance at which every camera ray is blocked.
    pub camera_blocker: Option<f32>,
    /// Contact force reported per body for the last step.
    pub contact_forces: HashMap<RigidBodyHandle, Vec3>,
}

fn body(kind: BodyKind, position: Vec3, mass: f32) -> MockBody {
    MockBody {
        state: BodyState {
            kind,
            position,
            rotation: Quat::identity(),
            linvel: Vec3::zeros(),
            angvel: Vec3::zeros(),
            mass,
            gravity_scale: 1.0,
        },
        asleep: false,
        rotations_enabled: true,
        torque: Vec3::zeros(),
    }
}

impl MockWorld {
    pub fn flat() -> Self {
        let ground_body = RigidBodyHandle::from_raw_parts(0, 0);
        let mut bodies = HashMap::new();
        bodies.insert(ground_body, body(BodyKind::Fixed, Vec3::zeros(), 0.0));
        Self {
            bodies,
            ground_body,
            ground_collider: ColliderHandle::from_raw_parts(0, 0),
            disk: None,
            ground_normal: Vec3::y(),
            camera_blocker: None,
            contact_forces: HashMap::new(),
        }
    }

    fn add_disk(&mut self, disk: MockBody, radius: f32) -> RigidBodyHandle {
        let handle = RigidBodyHandle::from_raw_parts(1, 0);
        self.bodies.insert(handle, disk);
        self.disk = Some(Disk {
            body: handle,
            collider: ColliderHandle::from_raw_parts(1, 0),
            center: Vec3::zeros(),
            radius,
        });
        handle
    }

    /// Flat ground plus a kinematic disk centered at the origin spinning at `angvel`.
    pub fn with_spinning_disk(radius: f32, angvel: Vec3) -> Self {
        let mut world = Self::flat();
        let mut disk = body(BodyKind::Kinematic, Vec3::zeros(), 0.0);
        disk.state.angvel = angvel;
        world.add_disk(disk, radius);
        world
    }

    /// Flat ground plus a resting dynamic disk of `mass`. The disk ignores gravity so only
    /// impulses move it.
    pub fn with_dynamic_disk(radius: f32, mass: f32) -> Self {
        let mut world = Self::flat();
        let mut disk = body(BodyKind::Dynamic, Vec3::zeros(), mass);
        disk.state.gravity_scale = 0.0;
        world.add_disk(disk, radius);
        world
    }

    pub fn spawn_character(&mut self, position: Vec3, mass: f32) -> CharacterBody {
        let handle = RigidBodyHandle::from_raw_parts(10, 0);
        self.bodies
            .insert(handle, body(BodyKind::Dynamic, position, mass));
        CharacterBody {
            body: handle,
            collider: ColliderHandle::from_raw_parts(10, 0),
            wall_sensor: None,
        }
    }

    pub fn state(&self, handle: RigidBodyHandle) -> BodyState {
        self.bodies[&handle].state
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> &mut MockBody {
        self.bodies.get_mut(&handle).unwrap()
    }

    pub fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if body.state.kind != BodyKind::Dynamic || body.asleep {
                continue;
            }
            body.state.linvel.y += GRAVITY * body.state.gravity_scale * dt;
            body.state.position += body.state.linvel * dt;
        }
    }
}

impl PhysicsWorld for MockWorld {
    fn body_state(&self, body: RigidBodyHandle) -> Option<BodyState> {
        self.bodies.get(&body).map(|b| b.state)
    }

    fn apply_impulse(&mut self, body: RigidBodyHandle, impulse: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            if b.state.kind == BodyKind::Dynamic && b.state.mass > 0.0 {
                b.state.linvel += impulse / b.state.mass;
            }
        }
    }

    fn apply_impulse_at_point(&mut self, body: RigidBodyHandle, impulse: Vec3, _point: Vec3) {
        self.apply_impulse(body, impulse);
    }

    fn apply_torque_impulse(&mut self, body: RigidBodyHandle, torque: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.torque += torque;
        }
    }

    fn set_linvel(&mut self, body: RigidBodyHandle, linvel: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.state.linvel = linvel;
        }
    }

    fn set_gravity_scale(&mut self, body: RigidBodyHandle, scale: f32) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.state.gravity_scale = scale;
        }
    }

    fn set_rotation(&mut self, body: RigidBodyHandle, rotation: Quat) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.state.rotation = rotation;
        }
    }

    fn set_enabled_rotations(&mut self, body: RigidBodyHandle, x: bool, y: bool, z: bool) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.rotations_enabled = x || y || z;
        }
    }

    fn sleep(&mut self, body: RigidBodyHandle) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.asleep = true;
        }
    }

    fn wake_up(&mut self, body: RigidBodyHandle) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.asleep = false;
        }
    }

    fn cast_ray(&self, query: &RayQuery) -> Option<RayHit> {
        if query.dir.y >= 0.0 || query.origin.y < 0.0 {
            return None;
        }
        let toi = query.origin.y / -query.dir.y;
        if toi > query.max_toi {
            return None;
        }
        let point = query.origin + query.dir * toi;
        let (collider, body) = match self.disk {
            Some(disk)
                if Vec3::new(point.x - disk.center.x, 0.0, point.z - disk.center.z).norm()
                    < disk.radius =>
            {
                (disk.collider, disk.body)
            }
            _ => (self.ground_collider, self.ground_body),
        };
        Some(RayHit {
            toi,
            collider,
            body: Some(body),
            normal: query.with_normal.then_some(self.ground_normal),
        })
    }

    fn cast_camera_ray(&self, _origin: Vec3, _dir: Vec3, max_toi: f32) -> Option<f32> {
        self.camera_blocker.filter(|d| *d <= max_toi)
    }

    fn sensor_intersecting(&self, _sensor: ColliderHandle) -> bool {
        false
    }

    fn contact_force(&self, body: RigidBodyHandle) -> Vec3 {
        self.contact_forces
            .get(&body)
            .copied()
            .unwrap_or_else(Vec3::zeros)
    }
}
