use bevy::prelude::*;
use hover_shared::{
    ColliderShapeDef, PlatformDef, PlatformKind, RapierWorld, WorldStaticDef, types as na,
};
use nalgebra::UnitQuaternion;
use rapier3d::prelude::RigidBodyHandle;

use crate::{
    AppSystems,
    convert::{to_bevy_quat, to_bevy_vec},
};

/// Longest physics step taken in one frame (seconds).
const MAX_STEP_DT: f32 = 1.0 / 30.0;

/// The rapier scene shared by the controller and the renderer.
#[derive(Resource, Deref, DerefMut, Default)]
pub struct Physics(pub RapierWorld);

/// Render entity mirroring a rapier body.
#[derive(Component, Clone, Copy, Debug)]
pub struct PhysicsBody(pub RigidBodyHandle);

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<Physics>();
    app.add_systems(Startup, setup);
    app.add_systems(
        Update,
        (step, sync_bodies).chain().in_set(AppSystems::Physics),
    );
}

/// Frame time clamped for both the control tick and the physics step.
pub fn step_dt(time: &Time) -> f32 {
    time.delta_secs().min(MAX_STEP_DT)
}

fn setup(
    mut commands: Commands,
    mut physics: ResMut<Physics>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    info!("World setup");

    physics.add_static(&WorldStaticDef::new(
        0,
        na::Vec3::zeros(),
        ColliderShapeDef::Plane {
            offset_along_normal: 0.0,
        },
    ));
    commands.spawn((
        // Ground,
        Pickable::default(),
        Transform::from_xyz(0., 0., 0.),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(50., 50.).build())),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::linear_rgb(0.2, 0.3, 0.25),
            perceptual_roughness: 1.0,
            metallic: 0.0,
            ..default()
        })),
    ));

    let stone = materials.add(Color::srgb_u8(124, 144, 255));
    let ramp_tilt = UnitQuaternion::from_axis_angle(&na::Vec3::x_axis(), -0.35);
    let blocks = [
        block(1, [-6.0, 0.6, 6.0], [2.0, 0.1, 4.0]).rotated(ramp_tilt),
        block(2, [5.0, 0.15, 0.0], [1.0, 0.15, 1.0]),
        block(3, [5.0, 0.3, 2.0], [1.0, 0.3, 1.0]),
        block(4, [0.0, 1.5, 12.0], [6.0, 1.5, 0.5]),
    ];
    for def in blocks {
        let ColliderShapeDef::Cuboid { half_extents } = &def.shape else {
            continue;
        };
        physics.add_static(&def);
        commands.spawn((
            Pickable::default(),
            Mesh3d(meshes.add(cuboid(half_extents))),
            MeshMaterial3d(stone.clone()),
            Transform::from_translation(to_bevy_vec(&def.translation))
                .with_rotation(to_bevy_quat(&def.rotation)),
        ));
    }
    physics.refresh_queries();

    let platforms = [
        (
            PlatformDef {
                kind: PlatformKind::Kinematic,
                position: na::Vec3::new(-5.0, 0.25, -5.0),
                half_extents: na::Vec3::new(2.5, 0.25, 2.5),
                linvel: na::Vec3::zeros(),
                angvel: na::Vec3::new(0.0, 0.5, 0.0),
                density: 1.0,
            },
            Color::srgb_u8(220, 170, 90),
        ),
        (
            PlatformDef {
                kind: PlatformKind::Dynamic,
                position: na::Vec3::new(3.0, 0.5, -4.0),
                half_extents: na::Vec3::new(0.5, 0.5, 0.5),
                linvel: na::Vec3::zeros(),
                angvel: na::Vec3::zeros(),
                density: 0.5,
            },
            Color::srgb_u8(150, 100, 60),
        ),
    ];
    for (def, color) in platforms {
        let body = physics.spawn_platform(&def);
        commands.spawn((
            PhysicsBody(body),
            Pickable::default(),
            Mesh3d(meshes.add(cuboid(&def.half_extents))),
            MeshMaterial3d(materials.add(color)),
            Transform::from_translation(to_bevy_vec(&def.position)),
        ));
    }

    // light
    commands.spawn((
        PointLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0),
    ));
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 20.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn block(id: u32, center: [f32; 3], half: [f32; 3]) -> WorldStaticDef {
    WorldStaticDef::new(
        id,
        na::Vec3::from(center),
        ColliderShapeDef::Cuboid {
            half_extents: na::Vec3::from(half),
        },
    )
}

fn cuboid(half: &na::Vec3) -> Cuboid {
    Cuboid::new(half.x * 2.0, half.y * 2.0, half.z * 2.0)
}

fn step(time: Res<Time>, mut physics: ResMut<Physics>) {
    physics.step(step_dt(&time));
}

fn sync_bodies(physics: Res<Physics>, mut bodies: Query<(&PhysicsBody, &mut Transform)>) {
    for (body, mut transform) in &mut bodies {
        let Some(rb) = physics.bodies.get(body.0) else {
            continue;
        };
        transform.translation = to_bevy_vec(rb.translation());
        transform.rotation = to_bevy_quat(rb.rotation());
    }
}
