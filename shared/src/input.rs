//! Input aggregation.
//!
//! Keyboard, touch joystick and gamepad are folded into one [`InputFrame`] per tick. Analog
//! stick state and the five virtual buttons live in a [`JoystickStore`] shared with on-screen
//! controls.

use std::{collections::HashSet, hash::Hash};

use serde::{Deserialize, Serialize};

use crate::{
    constants::{BUTTON_COUNT, GAMEPAD_RUN_THRESHOLD},
    store::{Store, SubscriptionId},
    types::Polar,
};

/// Four digital movement directions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Directions {
    pub forward: bool,
    pub backward: bool,
    pub leftward: bool,
    pub rightward: bool,
}

impl Directions {
    #[inline]
    pub fn any(&self) -> bool {
        self.forward || self.backward || self.leftward || self.rightward
    }

    pub fn or(self, other: Self) -> Self {
        Self {
            forward: self.forward || other.forward,
            backward: self.backward || other.backward,
            leftward: self.leftward || other.leftward,
            rightward: self.rightward || other.rightward,
        }
    }
}

/// Keyboard state as reported by the host's key mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyboardState {
    pub directions: Directions,
    pub jump: bool,
    pub run: bool,
    pub action1: bool,
    pub action2: bool,
    pub action3: bool,
    pub action4: bool,
}

/// Shared analog stick and virtual button state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JoystickState {
    pub stick: Polar,
    pub run: bool,
    pub buttons: [bool; BUTTON_COUNT],
}

/// Virtual buttons. `Button1` doubles as jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VirtualButton {
    Button1,
    Button2,
    Button3,
    Button4,
    Button5,
}

impl VirtualButton {
    pub const ALL: [Self; BUTTON_COUNT] = [
        Self::Button1,
        Self::Button2,
        Self::Button3,
        Self::Button4,
        Self::Button5,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Default)]
pub struct JoystickStore(Store<JoystickState>);

impl JoystickStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> JoystickState {
        *self.0.get()
    }

    pub fn set_stick(&mut self, distance: f32, angle: f32, run: bool) -> bool {
        let stick = Polar::new(distance, angle);
        self.0.update(|s| {
            s.stick = stick;
            s.run = run;
        })
    }

    pub fn reset_stick(&mut self) -> bool {
        self.0.update(|s| {
            s.stick = Polar::ZERO;
            s.run = false;
        })
    }

    /// Latch a button. It stays pressed until released.
    pub fn press(&mut self, button: VirtualButton) -> bool {
        self.0.update(|s| s.buttons[button.index()] = true)
    }

    pub fn release(&mut self, button: VirtualButton) -> bool {
        self.0.update(|s| s.buttons[button.index()] = false)
    }

    pub fn release_all(&mut self) -> bool {
        self.0.update(|s| s.buttons = [false; BUTTON_COUNT])
    }

    pub fn reset(&mut self) -> bool {
        self.0.set(JoystickState::default())
    }

    pub fn subscribe<T, Sel, L>(&mut self, select: Sel, listener: L) -> SubscriptionId
    where
        T: PartialEq + 'static,
        Sel: Fn(&JoystickState) -> T + 'static,
        L: FnMut(&T) + 'static,
    {
        self.0.subscribe(select, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.0.unsubscribe(id)
    }
}

/// Rising/falling edge tracking keyed by button identity.
#[derive(Debug, Clone)]
pub struct EdgeDetector<K> {
    held: HashSet<K>,
}

impl<K> Default for EdgeDetector<K> {
    fn default() -> Self {
        Self {
            held: HashSet::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> EdgeDetector<K> {
    /// Record the current level of `key`. Returns true only on the press edge.
    pub fn pressed(&mut self, key: K, down: bool) -> bool {
        if down {
            self.held.insert(key)
        } else {
            self.held.remove(&key);
            false
        }
    }

    pub fn is_held(&self, key: K) -> bool {
        self.held.contains(&key)
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}

/// Gamepad button indices for each logical action.
///
/// Partial tables deserialize over the standard-layout defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonMap {
    pub forward: usize,
    pub backward: usize,
    pub leftward: usize,
    pub rightward: usize,
    pub jump: usize,
    pub action1: usize,
    pub action2: usize,
    pub action3: usize,
    pub action4: usize,
}

impl Default for ButtonMap {
    fn default() -> Self {
        Self {
            forward: 12,
            backward: 13,
            leftward: 14,
            rightward: 15,
            jump: 2,
            action1: 11,
            action2: 3,
            action3: 1,
            action4: 0,
        }
    }
}

impl ButtonMap {
    pub fn entries(&self) -> [(&'static str, usize); 9] {
        [
            ("forward", self.forward),
            ("backward", self.backward),
            ("leftward", self.leftward),
            ("rightward", self.rightward),
            ("jump", self.jump),
            ("action1", self.action1),
            ("action2", self.action2),
            ("action3", self.action3),
            ("action4", self.action4),
        ]
    }
}

/// One gamepad poll: four axes (left x/y, right x/y, screen-down positive) and button levels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GamepadSnapshot {
    pub axes: [f32; 4],
    pub buttons: Vec<bool>,
}

impl GamepadSnapshot {
    #[inline]
    fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }
}

/// Canonical per-tick input.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
    /// Keyboard or gamepad digital directions, merged.
    pub directions: Directions,
    /// Gamepad digital directions alone; they take facing priority.
    pub gamepad_directions: Directions,
    pub jump: bool,
    pub run: bool,
    pub action1: bool,
    pub action2: bool,
    pub action3: bool,
    pub action4: bool,
    pub joystick: Polar,
    pub joystick_run: bool,
    /// Gamepad right stick.
    pub camera_look: Polar,
    pub buttons: [bool; BUTTON_COUNT],
}

impl InputFrame {
    #[inline]
    pub fn button(&self, button: VirtualButton) -> bool {
        self.buttons[button.index()]
    }

    /// Any input that steers the character this tick.
    pub fn has_movement(&self) -> bool {
        self.directions.any() || self.joystick.is_active()
    }

    pub fn wants_jump(&self) -> bool {
        self.jump || self.button(VirtualButton::Button1)
    }
}

/// Touch-drag joystick mapping screen drags to a polar stick.
#[derive(Clone, Copy, Debug)]
pub struct TouchJoystick {
    /// Drag length (pixels) that maps to full deflection.
    pub radius: f32,
    origin: Option<(f32, f32)>,
}

impl TouchJoystick {
    pub fn new(radius: f32) -> Self {
        Self {
            radius: radius.max(1.0),
            origin: None,
        }
    }

    pub fn begin(&mut self, x: f32, y: f32) {
        self.origin = Some((x, y));
    }

    /// Update the stick from the current touch position (screen space, y down).
    pub fn drag(&mut self, x: f32, y: f32, store: &mut JoystickStore) {
        let Some((ox, oy)) = self.origin else {
            return;
        };
        let polar = Polar::from_stick((x - ox) / self.radius, (oy - y) / self.radius);
        if polar.is_active() {
            store.set_stick(
                polar.distance,
                polar.angle,
                polar.distance > GAMEPAD_RUN_THRESHOLD,
            );
        } else {
            store.reset_stick();
        }
    }

    pub fn end(&mut self, store: &mut JoystickStore) {
        self.origin = None;
        store.reset_stick();
    }

    pub fn is_active(&self) -> bool {
        self.origin.is_some()
    }
}

/// Merges input sources into [`InputFrame`]s.
#[derive(Debug)]
pub struct InputAggregator {
    buttons: ButtonMap,
    gamepad_connected: bool,
    gamepad_edges: EdgeDetector<VirtualButton>,
    keyboard_missing_logged: bool,
}

impl InputAggregator {
    pub fn new(buttons: ButtonMap) -> Self {
        Self {
            buttons,
            gamepad_connected: false,
            gamepad_edges: EdgeDetector::default(),
            keyboard_missing_logged: false,
        }
    }

    pub fn button_map(&self) -> &ButtonMap {
        &self.buttons
    }

    pub fn connect_gamepad(&mut self) {
        self.gamepad_connected = true;
    }

    pub fn disconnect_gamepad(&mut self) {
        self.gamepad_connected = false;
        self.gamepad_edges.clear();
    }

    #[inline]
    pub fn gamepad_connected(&self) -> bool {
        self.gamepad_connected
    }

    /// Build this tick's frame.
    ///
    /// `keyboard` is `None` when the host has no keyboard context; the frame then carries no
    /// keyboard input and joystick/gamepad remain usable. Gamepad polling writes its stick and
    /// buttons into `joystick` before the frame is read back.
    pub fn frame(
        &mut self,
        keyboard: Option<&KeyboardState>,
        gamepad: Option<&GamepadSnapshot>,
        joystick: &mut JoystickStore,
    ) -> InputFrame {
        let keys = match keyboard {
            Some(keys) => *keys,
            None => {
                if !self.keyboard_missing_logged {
                    log::warn!("{}", crate::error::ControllerError::InputSourceUnavailable);
                    self.keyboard_missing_logged = true;
                }
                KeyboardState::default()
            }
        };

        let (gamepad_directions, camera_look) = match gamepad {
            Some(pad) if self.gamepad_connected => self.poll_gamepad(pad, joystick),
            _ => (Directions::default(), Polar::ZERO),
        };

        let shared = joystick.state();
        InputFrame {
            directions: keys.directions.or(gamepad_directions),
            gamepad_directions,
            jump: keys.jump,
            run: keys.run,
            action1: keys.action1,
            action2: keys.action2,
            action3: keys.action3,
            action4: keys.action4,
            joystick: shared.stick,
            joystick_run: shared.run,
            camera_look,
            buttons: shared.buttons,
        }
    }

    /// Apply one gamepad poll to the joystick store.
    ///
    /// Only the highest-priority held action button is pressed per poll; with none held all
    /// virtual buttons are released.
    fn poll_gamepad(
        &mut self,
        pad: &GamepadSnapshot,
        joystick: &mut JoystickStore,
    ) -> (Directions, Polar) {
        let map = self.buttons;
        let directions = Directions {
            forward: pad.button(map.forward),
            backward: pad.button(map.backward),
            leftward: pad.button(map.leftward),
            rightward: pad.button(map.rightward),
        };

        let held = [
            (map.action4, VirtualButton::Button2),
            (map.action3, VirtualButton::Button4),
            (map.jump, VirtualButton::Button1),
            (map.action2, VirtualButton::Button3),
            (map.action1, VirtualButton::Button5),
        ]
        .into_iter()
        .find(|(index, _)| pad.button(*index))
        .map(|(_, button)| button);

        match held {
            Some(button) => {
                for other in VirtualButton::ALL {
                    if other != button {
                        self.gamepad_edges.pressed(other, false);
                    }
                }
                if self.gamepad_edges.pressed(button, true) {
                    joystick.press(button);
                }
            }
            None => {
                self.gamepad_edges.clear();
                joystick.release_all();
            }
        }

        let [lx, ly, rx, ry] = pad.axes;
        if lx != 0.0 || ly != 0.0 {
            let stick = Polar::from_stick(lx, -ly);
            joystick.set_stick(
                stick.distance,
                stick.angle,
                stick.distance > GAMEPAD_RUN_THRESHOLD,
            );
        } else {
            joystick.reset_stick();
        }

        let look = if rx != 0.0 || ry != 0.0 {
            Polar::from_stick(rx, -ry)
        } else {
            Polar::ZERO
        };
        (directions, look)
    }

    /// Stop reading every source and clear shared stick/button state.
    pub fn detach(&mut self, joystick: &mut JoystickStore) {
        self.disconnect_gamepad();
        joystick.reset();
        log::info!("input detached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn pad_with(buttons: &[usize], axes: [f32; 4]) -> GamepadSnapshot {
        let mut levels = vec![false; 17];
        for &b in buttons {
            levels[b] = true;
        }
        GamepadSnapshot {
            axes,
            buttons: levels,
        }
    }

    #[test]
    fn missing_keyboard_falls_back_to_idle_frame() {
        let mut agg = InputAggregator::new(ButtonMap::default());
        let mut store = JoystickStore::new();
        let frame = agg.frame(None, None, &mut store);
        assert_eq!(frame, InputFrame::default());
        assert!(!frame.has_movement());
    }

    #[test]
    fn keyboard_and_gamepad_directions_merge() {
        let mut agg = InputAggregator::new(ButtonMap::default());
        agg.connect_gamepad();
        let mut store = JoystickStore::new();
        let keys = KeyboardState {
            directions: Directions {
                forward: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let pad = pad_with(&[14], [0.0; 4]);
        let frame = agg.frame(Some(&keys), Some(&pad), &mut store);
        assert!(frame.directions.forward && frame.directions.leftward);
        assert!(frame.gamepad_directions.leftward && !frame.gamepad_directions.forward);
    }

    #[test]
    fn gamepad_buttons_follow_priority_and_latch() {
        let mut agg = InputAggregator::new(ButtonMap::default());
        agg.connect_gamepad();
        let mut store = JoystickStore::new();

        // jump (2) and action4 (0) held: action4 wins.
        let frame = agg.frame(None, Some(&pad_with(&[2, 0], [0.0; 4])), &mut store);
        assert!(frame.button(VirtualButton::Button2));
        assert!(!frame.button(VirtualButton::Button1));

        // still held: no new press, flag stays latched
        let frame = agg.frame(None, Some(&pad_with(&[0], [0.0; 4])), &mut store);
        assert!(frame.button(VirtualButton::Button2));

        let frame = agg.frame(None, Some(&pad_with(&[], [0.0; 4])), &mut store);
        assert_eq!(frame.buttons, [false; BUTTON_COUNT]);
    }

    #[test]
    fn custom_button_map_is_honored() {
        let map = ButtonMap {
            jump: 7,
            ..ButtonMap::default()
        };
        let mut agg = InputAggregator::new(map);
        agg.connect_gamepad();
        let mut store = JoystickStore::new();
        let frame = agg.frame(None, Some(&pad_with(&[7], [0.0; 4])), &mut store);
        assert!(frame.wants_jump());
    }

    #[test]
    fn left_stick_drives_shared_joystick() {
        let mut agg = InputAggregator::new(ButtonMap::default());
        agg.connect_gamepad();
        let mut store = JoystickStore::new();

        // Stick pushed fully left (screen axes: x right, y down).
        let frame = agg.frame(None, Some(&pad_with(&[], [-1.0, 0.0, 0.0, 0.0])), &mut store);
        assert!((frame.joystick.distance - 1.0).abs() < 1.0e-6);
        assert!((frame.joystick.angle - FRAC_PI_2).abs() < 1.0e-5);
        assert!(frame.joystick_run);

        let frame = agg.frame(None, Some(&pad_with(&[], [0.0, -0.5, 0.0, 0.0])), &mut store);
        assert!(frame.joystick.angle.abs() < 1.0e-5);
        assert!(!frame.joystick_run);

        let frame = agg.frame(None, Some(&pad_with(&[], [0.0; 4])), &mut store);
        assert!(!frame.joystick.is_active());
    }

    #[test]
    fn disconnected_gamepad_is_ignored() {
        let mut agg = InputAggregator::new(ButtonMap::default());
        let mut store = JoystickStore::new();
        let frame = agg.frame(None, Some(&pad_with(&[12, 2], [1.0; 4])), &mut store);
        assert!(!frame.has_movement());
        assert!(!frame.wants_jump());
    }

    #[test]
    fn touch_joystick_clamps_and_resets() {
        let mut touch = TouchJoystick::new(50.0);
        let mut store = JoystickStore::new();
        touch.drag(10.0, 10.0, &mut store);
        assert!(!store.state().stick.is_active());

        touch.begin(100.0, 100.0);
        touch.drag(100.0, 0.0, &mut store);
        let state = store.state();
        assert_eq!(state.stick.distance, 1.0);
        assert!(state.stick.angle.abs() < 1.0e-5);
        assert!(state.run);

        touch.end(&mut store);
        assert_eq!(store.state(), JoystickState::default());
    }

    #[test]
    fn edge_detector_emits_once_per_press() {
        let mut edges = EdgeDetector::default();
        assert!(edges.pressed(1u8, true));
        assert!(!edges.pressed(1u8, true));
        assert!(!edges.pressed(1u8, false));
        assert!(edges.pressed(1u8, true));
    }
}
