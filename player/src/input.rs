//! Input manager handling keyboard and gamepad
//!
//! Gamepads take player slots in connection order. The keyboard drives slot 0
//! whenever no gamepad holds it. Key state is fed by the window host through
//! a shared [`KeyboardState`] handle.

use std::cell::RefCell;
use std::rc::Rc;

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, Gilrs};
use hashbrown::HashMap;
use ringpace_core::config::InputConfig;
#[cfg(feature = "gamepad")]
use ringpace_core::input::{apply_stick_deadzone, axis_to_i16};
use ringpace_core::{Buttons, ControllerState, InputSource, MAX_CONTROLLERS};
use winit::keyboard::KeyCode;

/// Pressed state of every key seen so far.
#[derive(Debug, Default)]
pub struct KeyboardState {
    keys: HashMap<KeyCode, bool>,
}

impl KeyboardState {
    pub fn update(&mut self, key: KeyCode, pressed: bool) {
        self.keys.insert(key, pressed);
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.keys.get(&key).copied().unwrap_or(false)
    }

    /// Releases every key (focus lost)
    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

/// Handle shared between the window host (writer) and the input manager.
pub type SharedKeyboard = Rc<RefCell<KeyboardState>>;

const BUTTON_KEYS: [(KeyCode, Buttons); 10] = [
    (KeyCode::ArrowUp, Buttons::DPAD_UP),
    (KeyCode::ArrowDown, Buttons::DPAD_DOWN),
    (KeyCode::ArrowLeft, Buttons::DPAD_LEFT),
    (KeyCode::ArrowRight, Buttons::DPAD_RIGHT),
    (KeyCode::Enter, Buttons::START),
    (KeyCode::Backspace, Buttons::BACK),
    (KeyCode::KeyQ, Buttons::LEFT_SHOULDER),
    (KeyCode::KeyE, Buttons::RIGHT_SHOULDER),
    (KeyCode::Space, Buttons::A),
    (KeyCode::KeyJ, Buttons::B),
];

const STICK_KEYS: [KeyCode; 4] = [KeyCode::KeyW, KeyCode::KeyA, KeyCode::KeyS, KeyCode::KeyD];

/// Maps the keyboard onto one controller.
///
/// WASD drive the left stick at full deflection, opposite keys cancel. The
/// controller only reads as connected while a mapped key is held, so an idle
/// keyboard leaves the tone where it is.
pub fn keyboard_controls(keyboard: &KeyboardState) -> ControllerState {
    let axis = |negative: KeyCode, positive: KeyCode| -> i16 {
        match (keyboard.is_pressed(negative), keyboard.is_pressed(positive)) {
            (true, false) => -i16::MAX,
            (false, true) => i16::MAX,
            _ => 0,
        }
    };

    let buttons = BUTTON_KEYS
        .iter()
        .filter(|(key, _)| keyboard.is_pressed(*key))
        .fold(Buttons::empty(), |acc, (_, button)| acc | *button);
    let held = !buttons.is_empty() || STICK_KEYS.iter().any(|&key| keyboard.is_pressed(key));

    if !held {
        return ControllerState::DISCONNECTED;
    }
    ControllerState {
        buttons,
        left_stick_x: axis(KeyCode::KeyA, KeyCode::KeyD),
        left_stick_y: axis(KeyCode::KeyS, KeyCode::KeyW),
        connected: true,
    }
}

pub struct InputManager {
    /// Gilrs context for gamepad handling (None if initialization failed)
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    keyboard: SharedKeyboard,

    config: InputConfig,

    /// Last polled state of every player slot
    slots: [ControllerState; MAX_CONTROLLERS],

    /// Gamepad ID to player slot mapping
    #[cfg(feature = "gamepad")]
    gamepad_to_player: HashMap<gilrs::GamepadId, usize>,
}

impl InputManager {
    pub fn new(config: InputConfig, keyboard: SharedKeyboard) -> Self {
        #[cfg(feature = "gamepad")]
        let gilrs = match Gilrs::new() {
            Ok(g) => Some(g),
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize gamepad support: {}. Gamepads will not be available.",
                    e
                );
                None
            }
        };

        Self {
            #[cfg(feature = "gamepad")]
            gilrs,
            keyboard,
            config,
            slots: [ControllerState::DISCONNECTED; MAX_CONTROLLERS],
            #[cfg(feature = "gamepad")]
            gamepad_to_player: HashMap::new(),
        }
    }

    #[cfg(feature = "gamepad")]
    fn keyboard_slot_free(&self) -> bool {
        !self.gamepad_to_player.values().any(|&slot| slot == 0)
    }

    #[cfg(not(feature = "gamepad"))]
    fn keyboard_slot_free(&self) -> bool {
        true
    }

    #[cfg(feature = "gamepad")]
    fn poll_gamepads(&mut self) {
        let events: Vec<_> = if let Some(ref mut gilrs) = self.gilrs {
            std::iter::from_fn(|| gilrs.next_event())
                .map(|e| (e.id, e.event))
                .collect()
        } else {
            Vec::new()
        };

        for (id, event) in events {
            match event {
                gilrs::EventType::Connected => {
                    if let Some(slot) = self.find_free_player_slot() {
                        self.gamepad_to_player.insert(id, slot);
                        tracing::info!("Gamepad {} connected as player {}", id, slot);
                    } else {
                        tracing::warn!("Gamepad {} connected but no free player slots", id);
                    }
                }
                gilrs::EventType::Disconnected => {
                    if let Some(slot) = self.gamepad_to_player.remove(&id) {
                        tracing::info!("Gamepad {} (player {}) disconnected", id, slot);
                        self.slots[slot] = ControllerState::DISCONNECTED;
                    }
                }
                _ => {}
            }
        }

        if let Some(ref gilrs) = self.gilrs {
            for (gamepad_id, &player_slot) in &self.gamepad_to_player {
                let gamepad = gilrs.gamepad(*gamepad_id);
                self.slots[player_slot] = read_gamepad(&gamepad, self.config.stick_deadzone);
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn find_free_player_slot(&self) -> Option<usize> {
        (0..MAX_CONTROLLERS).find(|&slot| !self.gamepad_to_player.values().any(|&s| s == slot))
    }
}

impl InputSource for InputManager {
    fn poll(&mut self) {
        #[cfg(feature = "gamepad")]
        self.poll_gamepads();

        if self.keyboard_slot_free() {
            self.slots[0] = if self.config.keyboard {
                keyboard_controls(&self.keyboard.borrow())
            } else {
                ControllerState::DISCONNECTED
            };
        }
    }

    fn controls(&self, slot: usize) -> ControllerState {
        self.slots
            .get(slot)
            .copied()
            .unwrap_or(ControllerState::DISCONNECTED)
    }
}

#[cfg(feature = "gamepad")]
fn read_gamepad(gamepad: &gilrs::Gamepad, deadzone: f32) -> ControllerState {
    let axis =
        |axis: Axis| -> i16 { axis_to_i16(apply_stick_deadzone(gamepad.value(axis), deadzone)) };

    let mapping = [
        (Button::DPadUp, Buttons::DPAD_UP),
        (Button::DPadDown, Buttons::DPAD_DOWN),
        (Button::DPadLeft, Buttons::DPAD_LEFT),
        (Button::DPadRight, Buttons::DPAD_RIGHT),
        (Button::Start, Buttons::START),
        (Button::Select, Buttons::BACK),
        (Button::LeftTrigger, Buttons::LEFT_SHOULDER),
        (Button::RightTrigger, Buttons::RIGHT_SHOULDER),
        // South=A, East=B, West=X, North=Y in Xbox layout
        (Button::South, Buttons::A),
        (Button::East, Buttons::B),
        (Button::West, Buttons::X),
        (Button::North, Buttons::Y),
    ];
    let buttons = mapping
        .iter()
        .filter(|(button, _)| gamepad.is_pressed(*button))
        .fold(Buttons::empty(), |acc, (_, flag)| acc | *flag);

    ControllerState {
        buttons,
        left_stick_x: axis(Axis::LeftStickX),
        left_stick_y: -axis(Axis::LeftStickY), // Invert Y (up = positive)
        connected: gamepad.is_connected(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed(keys: &[KeyCode]) -> KeyboardState {
        let mut state = KeyboardState::default();
        for &key in keys {
            state.update(key, true);
        }
        state
    }

    #[test]
    fn test_idle_keyboard_is_disconnected() {
        let state = KeyboardState::default();
        assert_eq!(keyboard_controls(&state), ControllerState::DISCONNECTED);

        // Unmapped keys do not count.
        let state = pressed(&[KeyCode::KeyZ]);
        assert_eq!(keyboard_controls(&state), ControllerState::DISCONNECTED);
    }

    #[test]
    fn test_wasd_drives_left_stick() {
        let controls = keyboard_controls(&pressed(&[KeyCode::KeyW, KeyCode::KeyD]));
        assert!(controls.connected);
        assert_eq!(controls.left_stick_x, i16::MAX);
        assert_eq!(controls.left_stick_y, i16::MAX);

        let controls = keyboard_controls(&pressed(&[KeyCode::KeyS, KeyCode::KeyA]));
        assert_eq!(controls.left_stick_x, -i16::MAX);
        assert_eq!(controls.left_stick_y, -i16::MAX);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let controls = keyboard_controls(&pressed(&[KeyCode::KeyA, KeyCode::KeyD]));
        assert!(controls.connected);
        assert_eq!(controls.left_stick_x, 0);
    }

    #[test]
    fn test_buttons_map_to_flags() {
        let controls = keyboard_controls(&pressed(&[KeyCode::ArrowUp, KeyCode::Space]));
        assert_eq!(controls.buttons, Buttons::DPAD_UP | Buttons::A);
        assert_eq!(controls.left_stick_x, 0);
    }

    #[test]
    fn test_released_key_clears() {
        let mut state = pressed(&[KeyCode::KeyW]);
        state.update(KeyCode::KeyW, false);
        assert_eq!(keyboard_controls(&state), ControllerState::DISCONNECTED);

        let mut state = pressed(&[KeyCode::KeyW, KeyCode::Enter]);
        state.clear();
        assert!(!state.is_pressed(KeyCode::Enter));
    }
}
