use bevy::{
    camera::Exposure,
    input::{
        mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit},
        touch::Touches,
    },
    pbr::{AtmosphereMode, AtmosphereSettings},
    prelude::*,
    window::PrimaryWindow,
};
use hover_shared::TouchJoystick;

use crate::{
    AppSystems,
    convert::to_bevy_vec,
    player::{Phase, Rig},
};

/// Pixels per scroll line, so line and pixel wheels zoom alike.
const SCROLL_LINE_PIXELS: f32 = 100.0;
/// Drag length (pixels) for full touch-stick deflection.
const TOUCH_STICK_RADIUS: f32 = 60.0;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_camera);
    app.add_systems(
        Update,
        (mouse_input, touch_input)
            .in_set(AppSystems::GatherInput)
            .run_if(in_state(Phase::Playing)),
    );
    app.add_systems(
        Update,
        follow_player
            .in_set(AppSystems::Present)
            .run_if(in_state(Phase::Playing)),
    );
}

fn add_camera(mut commands: Commands) {
    commands.spawn((
        Exposure { ev100: 16.0 },
        bevy::core_pipeline::tonemapping::Tonemapping::AcesFitted,
        Camera3d::default(),
        Transform::from_xyz(0.0, 3.0, -6.0).looking_at(Vec3::ZERO, Vec3::Y),
        DistanceFog {
            color: Color::srgba(0.35, 0.48, 0.66, 1.0),
            directional_light_color: Color::srgba(1.0, 0.95, 0.85, 0.5),
            directional_light_exponent: 30.0,
            falloff: FogFalloff::from_visibility_colors(
                1000.0, // Fog distance
                Color::srgb(0.35, 0.5, 0.66),
                Color::srgb(0.8, 0.8, 0.7),
            ),
        },
        AtmosphereSettings {
            rendering_method: AtmosphereMode::Raymarched,
            ..default()
        },
    ));
}

fn mouse_input(
    buttons: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    mut player: NonSendMut<Rig>,
) {
    let Some(rig) = player.0.as_mut() else {
        return;
    };
    let camera = rig.controller.camera_mut();

    let orbit_buttons = [MouseButton::Left, MouseButton::Right];
    if buttons.any_just_pressed(orbit_buttons) {
        camera.pointer_down();
    }
    if !buttons.any_pressed(orbit_buttons) {
        camera.pointer_up();
    }
    if motion.delta != Vec2::ZERO {
        camera.pointer_move(motion.delta.x, motion.delta.y);
    }

    if scroll.delta.y != 0.0 {
        let pixels = match scroll.unit {
            MouseScrollUnit::Line => scroll.delta.y * SCROLL_LINE_PIXELS,
            MouseScrollUnit::Pixel => scroll.delta.y,
        };
        // Scrolling up pulls the camera in.
        camera.wheel(-pixels);
    }
}

/// Touches that start on the left third of the screen steer; the rest orbit and pinch.
fn touch_input(
    touches: Res<Touches>,
    window: Single<&Window, With<PrimaryWindow>>,
    mut stick: Local<Option<TouchJoystick>>,
    mut player: NonSendMut<Rig>,
) {
    let Some(rig) = player.0.as_mut() else {
        return;
    };
    let stick = stick.get_or_insert_with(|| TouchJoystick::new(TOUCH_STICK_RADIUS));
    let split = window.width() / 3.0;

    let steering = touches.iter().find(|t| t.start_position().x < split);
    match steering {
        Some(touch) => {
            if !stick.is_active() {
                let start = touch.start_position();
                stick.begin(start.x, start.y);
            }
            let at = touch.position();
            stick.drag(at.x, at.y, &mut rig.joystick);
        }
        None => {
            if stick.is_active() {
                stick.end(&mut rig.joystick);
            }
        }
    }

    let orbiting: Vec<(f32, f32)> = touches
        .iter()
        .filter(|t| t.start_position().x >= split)
        .map(|t| (t.position().x, t.position().y))
        .collect();
    rig.controller.camera_mut().touch_move(&orbiting);
}

fn follow_player(mut camera: Single<&mut Transform, With<Camera3d>>, player: NonSend<Rig>) {
    let Some(rig) = player.0.as_ref() else {
        return;
    };
    let pose = rig.controller.camera_pose();
    **camera = Transform::from_translation(to_bevy_vec(&pose.eye))
        .looking_at(to_bevy_vec(&pose.target), Vec3::Y);
}
