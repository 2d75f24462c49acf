// Support configuring Bevy lints within code.
#![cfg_attr(bevy_lint, feature(register_tool), register_tool(bevy))]
// Disable console on Windows for non-dev builds.
#![cfg_attr(not(feature = "dev"), windows_subsystem = "windows")]

#[cfg(feature = "dev_native")]
mod debug_tools;

mod animation;
mod camera;
mod config;
mod convert;
mod input;
mod player;
mod world;

#[cfg(any(target_os = "macos", target_os = "linux"))]
use bevy::window::CompositeAlphaMode;

use bevy::picking::prelude::*;
use bevy::prelude::*;

fn main() -> AppExit {
    App::new().add_plugins(AppPlugin).run()
}

/// Per-frame ordering: read devices, run the controller, step physics, then render state.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppSystems {
    GatherInput,
    Control,
    Physics,
    Present,
}

pub struct AppPlugin;
impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Window {
                    title: "Hover".to_string(),
                    fit_canvas_to_parent: true,
                    transparent: true,
                    #[cfg(target_os = "macos")]
                    composite_alpha_mode: CompositeAlphaMode::PostMultiplied,
                    #[cfg(target_os = "linux")]
                    composite_alpha_mode: CompositeAlphaMode::PreMultiplied,
                    ..default()
                }
                .into(),
                ..default()
            }),
            MeshPickingPlugin,
        ));

        app.configure_sets(
            Update,
            (
                AppSystems::GatherInput,
                AppSystems::Control,
                AppSystems::Physics,
                AppSystems::Present,
            )
                .chain(),
        );

        app.add_plugins((
            config::plugin,
            world::plugin,
            input::plugin,
            player::plugin,
            camera::plugin,
            animation::plugin,
        ));

        #[cfg(feature = "dev_native")]
        app.add_plugins(debug_tools::plugin);
    }
}
