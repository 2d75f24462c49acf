//! Host input sources: leafwing keyboard actions and gamepad polling.
//!
//! Each frame the raw devices are folded into the core's [`KeyboardState`] and
//! [`GamepadSnapshot`]; the controller merges them with the shared joystick store.

use bevy::prelude::*;
use hover_shared::{Directions, GamepadSnapshot, KeyboardState};
use leafwing_input_manager::prelude::*;

use crate::AppSystems;

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    Forward,
    Backward,
    Leftward,
    Rightward,
    Jump,
    Run,
    Action1,
    Action2,
    Action3,
    Action4,
    LeftClick,
}

/// Keyboard state for this frame. `None` while the window has no keyboard focus.
#[derive(Resource, Default, Debug)]
pub struct KeyboardInput(pub Option<KeyboardState>);

/// First connected gamepad, polled this frame.
#[derive(Resource, Default, Debug)]
pub struct GamepadInput(pub Option<GamepadSnapshot>);

/// Gamepad buttons in standard layout order, so config indices match a browser gamepad.
const STANDARD_BUTTONS: [GamepadButton; 17] = [
    GamepadButton::South,
    GamepadButton::East,
    GamepadButton::West,
    GamepadButton::North,
    GamepadButton::LeftTrigger,
    GamepadButton::RightTrigger,
    GamepadButton::LeftTrigger2,
    GamepadButton::RightTrigger2,
    GamepadButton::Select,
    GamepadButton::Start,
    GamepadButton::LeftThumb,
    GamepadButton::RightThumb,
    GamepadButton::DPadUp,
    GamepadButton::DPadDown,
    GamepadButton::DPadLeft,
    GamepadButton::DPadRight,
    GamepadButton::Mode,
];

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<InputAction>::default());

    app.register_type::<InputAction>();

    let mut input_map = InputMap::<InputAction>::default();
    input_map.insert(InputAction::Forward, KeyCode::KeyW);
    input_map.insert(InputAction::Forward, KeyCode::ArrowUp);
    input_map.insert(InputAction::Backward, KeyCode::KeyS);
    input_map.insert(InputAction::Backward, KeyCode::ArrowDown);
    input_map.insert(InputAction::Leftward, KeyCode::KeyA);
    input_map.insert(InputAction::Leftward, KeyCode::ArrowLeft);
    input_map.insert(InputAction::Rightward, KeyCode::KeyD);
    input_map.insert(InputAction::Rightward, KeyCode::ArrowRight);
    input_map.insert(InputAction::Jump, KeyCode::Space);
    input_map.insert(InputAction::Run, KeyCode::ShiftLeft);
    input_map.insert(InputAction::Action1, KeyCode::KeyF);
    input_map.insert(InputAction::Action2, KeyCode::KeyG);
    input_map.insert(InputAction::Action3, KeyCode::KeyH);
    input_map.insert(InputAction::Action4, KeyCode::KeyJ);
    input_map.insert(InputAction::LeftClick, MouseButton::Left);
    app.insert_resource(input_map);
    app.insert_resource(ActionState::<InputAction>::default());

    app.init_resource::<KeyboardInput>();
    app.init_resource::<GamepadInput>();
    app.add_systems(
        Update,
        (read_keyboard, read_gamepad).in_set(AppSystems::GatherInput),
    );
}

fn read_keyboard(
    actions: Res<ActionState<InputAction>>,
    windows: Query<&Window>,
    mut keyboard: ResMut<KeyboardInput>,
) {
    if !windows.iter().any(|w| w.focused) {
        keyboard.0 = None;
        return;
    }
    let held = |action: InputAction| actions.pressed(&action);
    keyboard.0 = Some(KeyboardState {
        directions: Directions {
            forward: held(InputAction::Forward),
            backward: held(InputAction::Backward),
            leftward: held(InputAction::Leftward),
            rightward: held(InputAction::Rightward),
        },
        jump: held(InputAction::Jump),
        run: held(InputAction::Run),
        action1: held(InputAction::Action1),
        action2: held(InputAction::Action2),
        action3: held(InputAction::Action3),
        action4: held(InputAction::Action4),
    });
}

fn read_gamepad(gamepads: Query<&Gamepad>, mut gamepad: ResMut<GamepadInput>) {
    gamepad.0 = gamepads.iter().next().map(snapshot);
}

/// Axes use screen-down positive y, like the standard gamepad layout.
fn snapshot(pad: &Gamepad) -> GamepadSnapshot {
    let axis = |a: GamepadAxis| pad.get(a).unwrap_or(0.0);
    GamepadSnapshot {
        axes: [
            axis(GamepadAxis::LeftStickX),
            -axis(GamepadAxis::LeftStickY),
            axis(GamepadAxis::RightStickX),
            -axis(GamepadAxis::RightStickY),
        ],
        buttons: STANDARD_BUTTONS.iter().map(|b| pad.pressed(*b)).collect(),
    }
}
