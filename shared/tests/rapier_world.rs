use hover_shared::{
    AnimationSet, AnimationStateMachine, CharacterController, ColliderShapeDef, ControllerConfig,
    InputFrame, PhysicsWorld, RapierWorld, Vec3, WorldStaticDef,
};

const DT: f32 = 1.0 / 60.0;

fn ground() -> WorldStaticDef {
    WorldStaticDef::new(
        0,
        Vec3::new(0.0, -0.5, 0.0),
        ColliderShapeDef::Cuboid {
            half_extents: Vec3::new(30.0, 0.5, 30.0),
        },
    )
}

#[test]
fn capsule_floats_above_rapier_ground() {
    let config = ControllerConfig::default();
    let mut world = RapierWorld::with_statics(vec![ground()]);
    let character = world.spawn_character(Vec3::new(0.0, 0.95, 0.0), &config, false);
    let mut controller = CharacterController::new(config.clone(), character, &mut world).unwrap();
    let mut animation = AnimationStateMachine::with_seed(AnimationSet::default(), 1);

    let frame = InputFrame::default();
    let mut status = controller.status();
    for _ in 0..180 {
        status = controller.tick(DT, &frame, &mut world, &mut animation);
        world.step(DT);
    }

    let state = world.body_state(character.body).unwrap();
    assert!(status.can_jump);
    let float = status.float.unwrap();
    let ray_distance = float.ray_distance.unwrap();
    assert!(ray_distance > 0.3 && ray_distance < config.floating_distance() + 0.1);
    assert!(state.position.y > 0.7 && state.position.y < 1.2);
    // Upright within a few degrees.
    let up = state.rotation * Vec3::y();
    assert!(up.y > 0.99);
}

#[test]
fn jump_lifts_off_rapier_ground() {
    let config = ControllerConfig::default();
    let mut world = RapierWorld::with_statics(vec![ground()]);
    let character = world.spawn_character(Vec3::new(0.0, 0.95, 0.0), &config, false);
    let mut controller = CharacterController::new(config.clone(), character, &mut world).unwrap();
    let mut animation = AnimationStateMachine::with_seed(AnimationSet::default(), 1);

    let idle = InputFrame::default();
    for _ in 0..60 {
        controller.tick(DT, &idle, &mut world, &mut animation);
        world.step(DT);
    }

    let jump = InputFrame {
        jump: true,
        ..Default::default()
    };
    let status = controller.tick(DT, &jump, &mut world, &mut animation);
    assert!(status.jumped);
    let vy = world.body_state(character.body).unwrap().linvel.y;
    assert!((vy - config.jump.jump_vel).abs() < 1.0e-4);

    let before = world.body_state(character.body).unwrap().position.y;
    for _ in 0..10 {
        controller.tick(DT, &idle, &mut world, &mut animation);
        world.step(DT);
    }
    assert!(world.body_state(character.body).unwrap().position.y > before + 0.2);
    assert!(!controller.status().can_jump);
}
