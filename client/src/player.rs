//! The local character: spawning, per-frame control and the rendered model.
//!
//! The controller core lives in a non-send resource because its stores hold plain closures.
//! Spawning waits in [`Phase::Loading`] until the configured character scene is ready; a failed
//! load is logged and the character is never spawned.

use bevy::{
    asset::LoadState, picking::pointer::PointerInteraction, prelude::*, window::WindowFocused,
};
use hover_shared::{
    AnimationStateMachine, CharacterController, ControllerError, JoystickStore, PhysicsWorld,
};
use leafwing_input_manager::prelude::ActionState;

use crate::{
    AppSystems,
    config::Settings,
    convert::{to_bevy_quat, to_bevy_vec, to_na_vec},
    input::{GamepadInput, InputAction, KeyboardInput},
    world::{Physics, step_dt},
};

const SPAWN_POINT: Vec3 = Vec3::new(0.0, 1.5, 0.0);

#[derive(States, Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Loading,
    Playing,
}

pub struct PlayerRig {
    pub controller: CharacterController,
    pub animation: AnimationStateMachine,
    pub joystick: JoystickStore,
}

/// Spawned character, if any.
#[derive(Default)]
pub struct Rig(pub Option<PlayerRig>);

/// Root of the rendered character.
#[derive(Component)]
pub struct Player;

#[derive(Resource)]
struct CharacterScene {
    path: String,
    handle: Handle<Scene>,
}

pub(super) fn plugin(app: &mut App) {
    app.init_state::<Phase>();
    app.insert_non_send_resource(Rig::default());

    app.add_systems(Startup, request_character);
    app.add_systems(
        Update,
        wait_for_character.run_if(in_state(Phase::Loading)),
    );
    app.add_systems(OnEnter(Phase::Playing), spawn_player);

    app.add_systems(
        Update,
        (on_window_focus, click_to_move, respawn)
            .in_set(AppSystems::GatherInput)
            .run_if(in_state(Phase::Playing)),
    );
    app.add_systems(
        Update,
        control
            .in_set(AppSystems::Control)
            .run_if(in_state(Phase::Playing)),
    );
    app.add_systems(
        Update,
        sync_visual
            .in_set(AppSystems::Present)
            .run_if(in_state(Phase::Playing)),
    );
}

fn request_character(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<Settings>,
) {
    if settings.character_asset.is_empty() {
        return;
    }
    let path = settings.character_asset.clone();
    let handle = asset_server.load(GltfAssetLabel::Scene(0).from_asset(path.clone()));
    commands.insert_resource(CharacterScene { path, handle });
}

fn wait_for_character(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<Settings>,
    scene: Option<Res<CharacterScene>>,
    mut next: ResMut<NextState<Phase>>,
) {
    if settings.character_asset.is_empty() {
        next.set(Phase::Playing);
        return;
    }
    let Some(scene) = scene else {
        return;
    };
    match asset_server.load_state(scene.handle.id()) {
        LoadState::Loaded => next.set(Phase::Playing),
        LoadState::Failed(err) => {
            error!(
                "{}",
                ControllerError::AssetLoad {
                    asset: scene.path.clone(),
                    reason: err.to_string(),
                }
            );
            commands.remove_resource::<CharacterScene>();
        }
        _ => {}
    }
}

fn spawn_player(
    mut commands: Commands,
    mut physics: ResMut<Physics>,
    mut player: NonSendMut<Rig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<Settings>,
    scene: Option<Res<CharacterScene>>,
) {
    let config = settings.0.clone();
    let wall_sensor = config.modes().is_ok_and(|m| m.point_to_move());
    let character = physics.spawn_character(to_na_vec(SPAWN_POINT), &config, wall_sensor);
    let animation = AnimationStateMachine::new(config.animations.clone());
    let capsule = config.capsule.clone();
    let controller = match CharacterController::new(config, character, &mut **physics) {
        Ok(controller) => controller,
        Err(err) => {
            error!("cannot attach controller: {err}");
            physics.remove_body(character.body);
            return;
        }
    };
    player.0 = Some(PlayerRig {
        controller,
        animation,
        joystick: JoystickStore::new(),
    });

    let root = commands
        .spawn((
            Player,
            Name::new("Player"),
            Transform::from_translation(SPAWN_POINT),
            Visibility::default(),
        ))
        .id();

    if let Some(scene) = scene {
        // Scene origin sits at the feet; the capsule floats above the ground.
        let feet = -(capsule.half_height + capsule.radius + capsule.float_height);
        commands.entity(root).with_child((
            SceneRoot(scene.handle.clone()),
            Transform::from_xyz(0.0, feet, 0.0),
        ));
        return;
    }

    let body = materials.add(Color::srgb_u8(235, 120, 80));
    let eye = materials.add(Color::srgb_u8(30, 30, 40));
    let eye_mesh = meshes.add(Sphere::new(capsule.radius * 0.18));
    let eye_y = capsule.half_height * 0.6;
    let eye_z = capsule.radius * 0.9;
    commands.entity(root).with_children(|parent| {
        parent.spawn((
            Pickable::IGNORE,
            Mesh3d(meshes.add(Capsule3d::new(capsule.radius, capsule.half_height * 2.0))),
            MeshMaterial3d(body),
        ));
        for side in [-1.0, 1.0] {
            parent.spawn((
                Pickable::IGNORE,
                Mesh3d(eye_mesh.clone()),
                MeshMaterial3d(eye.clone()),
                Transform::from_xyz(side * capsule.radius * 0.4, eye_y, eye_z),
            ));
        }
    });
}

/// Losing window focus is treated like the page being hidden.
fn on_window_focus(
    mut messages: MessageReader<WindowFocused>,
    mut physics: ResMut<Physics>,
    mut player: NonSendMut<Rig>,
) {
    let Some(rig) = player.0.as_mut() else {
        return;
    };
    for message in messages.read() {
        rig.controller
            .on_visibility_change(message.focused, &mut **physics);
    }
}

fn click_to_move(
    actions: Res<ActionState<InputAction>>,
    interactions: Query<&PointerInteraction>,
    mut player: NonSendMut<Rig>,
) {
    if !actions.just_pressed(&InputAction::LeftClick) {
        return;
    }
    let Some(rig) = player.0.as_mut() else {
        return;
    };
    let Ok(interaction) = interactions.single() else {
        return;
    };
    let Some((_entity, hit)) = interaction.get_nearest_hit() else {
        return;
    };
    let Some(pos) = hit.position else {
        return;
    };

    if rig
        .controller
        .set_move_target(&mut rig.animation, to_na_vec(pos))
    {
        debug!("move target set to {pos}");
    }
}

/// Tear the character down and spawn it again at the spawn point.
fn respawn(
    keys: Res<ButtonInput<KeyCode>>,
    mut commands: Commands,
    mut physics: ResMut<Physics>,
    mut player: NonSendMut<Rig>,
    visuals: Query<Entity, With<Player>>,
    mut next: ResMut<NextState<Phase>>,
) {
    if !keys.just_pressed(KeyCode::KeyR) {
        return;
    }
    let Some(mut rig) = player.0.take() else {
        return;
    };
    rig.controller
        .despawn(&mut **physics, &mut rig.joystick, &mut rig.animation);
    physics.remove_body(rig.controller.body());
    for entity in &visuals {
        commands.entity(entity).despawn();
    }
    next.set(Phase::Loading);
}

fn control(
    time: Res<Time>,
    keyboard: Res<KeyboardInput>,
    gamepad: Res<GamepadInput>,
    mut physics: ResMut<Physics>,
    mut player: NonSendMut<Rig>,
) {
    let Some(rig) = player.0.as_mut() else {
        return;
    };
    let PlayerRig {
        controller,
        animation,
        joystick,
    } = rig;

    match (&gamepad.0, controller.input().gamepad_connected()) {
        (Some(_), false) => {
            info!("gamepad connected");
            controller.input_mut().connect_gamepad();
        }
        (None, true) => {
            info!("gamepad disconnected");
            controller.input_mut().disconnect_gamepad();
            joystick.release_all();
            joystick.reset_stick();
        }
        _ => {}
    }

    let frame = controller.gather_input(keyboard.0.as_ref(), gamepad.0.as_ref(), joystick);
    controller.tick(step_dt(&time), &frame, &mut **physics, animation);
}

fn sync_visual(
    physics: Res<Physics>,
    player: NonSend<Rig>,
    mut visual: Single<&mut Transform, With<Player>>,
) {
    let Some(rig) = player.0.as_ref() else {
        return;
    };
    let Some(state) = physics.body_state(rig.controller.body()) else {
        return;
    };
    visual.translation = to_bevy_vec(&state.position);
    visual.rotation = to_bevy_quat(&rig.controller.visual_rotation(&**physics));
}
