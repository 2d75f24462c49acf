//! Clip driver for the animation state machine.
//!
//! Clips are timed rather than sampled: a one-shot clip reports completion after its
//! nominal length, which hands control back to the state machine.

use bevy::prelude::*;
use hover_shared::{AnimationSlot, ClipPlayback};

use crate::{
    AppSystems,
    player::{Phase, Rig},
};

/// One-shot clip in flight.
#[derive(Resource, Default)]
struct ActiveClip(Option<(Timer, ClipPlayback)>);

/// On-screen readout of the current clip.
#[derive(Component)]
struct ClipLabel;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<ActiveClip>();
    app.add_systems(Startup, spawn_label);
    app.add_systems(
        Update,
        drive_clips
            .in_set(AppSystems::Present)
            .run_if(in_state(Phase::Playing)),
    );
}

/// Nominal play time of a one-shot clip (seconds).
fn clip_seconds(slot: AnimationSlot) -> f32 {
    match slot {
        AnimationSlot::Jump => 0.35,
        AnimationSlot::JumpLand => 0.3,
        AnimationSlot::Action4 => 1.2,
        _ => 2.5,
    }
}

fn spawn_label(mut commands: Commands) {
    commands.spawn((
        ClipLabel,
        Text::new(""),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
    ));
}

fn drive_clips(
    time: Res<Time>,
    mut active: ResMut<ActiveClip>,
    mut player: NonSendMut<Rig>,
    mut labels: Query<&mut Text, With<ClipLabel>>,
) {
    let Some(rig) = player.0.as_mut() else {
        return;
    };

    if let Some(playback) = rig.animation.take_playback() {
        debug!("clip {} for {:?}", playback.clip, playback.slot);
        for mut label in &mut labels {
            label.0 = format!("{:?}: {}", playback.slot, playback.clip);
        }
        // A new clip replaces whatever was playing, finished or not.
        active.0 = if playback.one_shot {
            let timer = Timer::from_seconds(clip_seconds(playback.slot), TimerMode::Once);
            Some((timer, playback))
        } else {
            None
        };
    }

    let Some((timer, playback)) = active.0.as_mut() else {
        return;
    };
    if timer.tick(time.delta()).just_finished() {
        if let Some(finished) = playback.finished.take() {
            // The machine may have moved on; a closed channel is fine.
            let _ = finished.send(());
        }
    }
}
