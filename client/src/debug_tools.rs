//! Debug/performance tooling for native dev builds.
//!
//! This plugin is compiled/used only when the caller gates it behind `dev_native`
//! (`#[cfg(feature = "dev_native")] mod debug_tools;` in `main.rs`).

use bevy::diagnostic::{
    DiagnosticsStore, EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin,
    SystemInformationDiagnosticsPlugin,
};
use bevy::prelude::*;
use hover_shared::PhysicsWorld;

use crate::{
    convert::{to_bevy_quat, to_bevy_vec},
    player::{Phase, Rig},
    world::Physics,
};

/// Seconds between controller status lines.
const REPORT_INTERVAL: f32 = 2.0;

/// Add debug/perf tooling (intended for `dev_native` builds only).
pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        SystemInformationDiagnosticsPlugin::default(),
    ));

    app.add_systems(
        Update,
        (draw_ground_ray, report).run_if(in_state(Phase::Playing)),
    );
}

/// Ground ray, float rest point and facing indicator.
fn draw_ground_ray(mut gizmos: Gizmos, physics: Res<Physics>, player: NonSend<Rig>) {
    let Some(rig) = player.0.as_ref() else {
        return;
    };
    let controller = &rig.controller;
    let Some(state) = physics.body_state(controller.body()) else {
        return;
    };
    let config = controller.config();
    let center = to_bevy_vec(&state.position);
    let origin = center - Vec3::Y * config.capsule.half_height;
    let status = controller.status();
    let color = if status.can_jump {
        Color::srgb(0.2, 0.9, 0.3)
    } else {
        Color::srgb(0.9, 0.3, 0.2)
    };
    gizmos.line(origin, origin - Vec3::Y * config.ray_length(), color);
    if let Some(distance) = status.float.and_then(|f| f.ray_distance) {
        gizmos.sphere(origin - Vec3::Y * distance, 0.05, color);
    }

    let facing = to_bevy_quat(&controller.indicator()) * Vec3::Z;
    gizmos.arrow(center, center + facing, Color::srgb(0.3, 0.5, 1.0));
}

fn report(
    time: Res<Time>,
    mut since: Local<f32>,
    diagnostics: Res<DiagnosticsStore>,
    player: NonSend<Rig>,
) {
    *since += time.delta_secs();
    if *since < REPORT_INTERVAL {
        return;
    }
    *since = 0.0;

    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|d| d.smoothed())
        .unwrap_or(0.0);
    let Some(rig) = player.0.as_ref() else {
        return;
    };
    let status = rig.controller.status();
    debug!(
        "fps {fps:.0} | {:?} | grounded {} slope {:.2} platform {}",
        rig.animation.current(),
        status.can_jump,
        status.slope_angle.unwrap_or(0.0),
        status.on_moving_object,
    );
}
