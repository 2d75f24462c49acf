use bevy::prelude::*;
use hover_shared::ControllerConfig;

const CONFIG_PATH: &str = "assets/controller.toml";

/// Controller tuning loaded once at startup.
#[derive(Resource, Deref, Clone, Debug)]
pub struct Settings(pub ControllerConfig);

pub(super) fn plugin(app: &mut App) {
    app.insert_resource(Settings(load(CONFIG_PATH)));
}

fn load(path: &str) -> ControllerConfig {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            warn!("no controller config at {path} ({err}), using defaults");
            return ControllerConfig::default();
        }
    };
    match ControllerConfig::from_toml_str(&source) {
        Ok(config) => {
            info!("loaded controller config from {path} (mode `{}`)", config.mode);
            config
        }
        Err(err) => {
            error!("invalid controller config {path}: {err}");
            ControllerConfig::default()
        }
    }
}
