//! Controller state and the input boundary

use bitflags::bitflags;

/// Number of controller slots polled every tick
pub const MAX_CONTROLLERS: usize = 4;

bitflags! {
    /// Digital buttons of one controller
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Buttons: u16 {
        const DPAD_UP = 1 << 0;
        const DPAD_DOWN = 1 << 1;
        const DPAD_LEFT = 1 << 2;
        const DPAD_RIGHT = 1 << 3;
        const START = 1 << 4;
        const BACK = 1 << 5;
        const LEFT_SHOULDER = 1 << 6;
        const RIGHT_SHOULDER = 1 << 7;
        const A = 1 << 8;
        const B = 1 << 9;
        const X = 1 << 10;
        const Y = 1 << 11;
    }
}

/// Snapshot of one controller slot for a tick.
///
/// Stick axes use the full signed 16-bit range, positive Y pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerState {
    pub buttons: Buttons,
    pub left_stick_x: i16,
    pub left_stick_y: i16,
    pub connected: bool,
}

impl ControllerState {
    /// Neutral reading for an empty slot
    pub const DISCONNECTED: Self = Self {
        buttons: Buttons::empty(),
        left_stick_x: 0,
        left_stick_y: 0,
        connected: false,
    };
}

/// Zeroes an analog value inside `deadzone` and rescales the rest to the
/// full range.
pub fn apply_stick_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        let magnitude = (value.abs() - deadzone) / (1.0 - deadzone);
        value.signum() * magnitude.clamp(0.0, 1.0)
    }
}

/// Converts a normalized axis (-1.0..=1.0) to the signed 16-bit range.
pub fn axis_to_i16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Source of controller readings, polled once per tick.
pub trait InputSource {
    /// Refresh every slot from the underlying devices
    fn poll(&mut self);

    /// Last polled state of a slot; out-of-range slots read as disconnected
    fn controls(&self, slot: usize) -> ControllerState;
}

/// Input source with no controllers attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInput;

impl InputSource for NullInput {
    fn poll(&mut self) {}

    fn controls(&self, _slot: usize) -> ControllerState {
        ControllerState::DISCONNECTED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stick_deadzone() {
        assert_eq!(apply_stick_deadzone(0.1, 0.15), 0.0);
        assert_eq!(apply_stick_deadzone(-0.1, 0.15), 0.0);
        assert_eq!(apply_stick_deadzone(1.0, 0.15), 1.0);
        assert_eq!(apply_stick_deadzone(-1.0, 0.15), -1.0);

        let scaled = apply_stick_deadzone(0.6, 0.2);
        assert!((scaled - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_axis_to_i16() {
        assert_eq!(axis_to_i16(0.0), 0);
        assert_eq!(axis_to_i16(1.0), i16::MAX);
        assert_eq!(axis_to_i16(-1.0), -i16::MAX);
        assert_eq!(axis_to_i16(2.0), i16::MAX);
    }

    #[test]
    fn test_null_input_is_disconnected() {
        let mut input = NullInput;
        input.poll();
        for slot in 0..MAX_CONTROLLERS {
            assert_eq!(input.controls(slot), ControllerState::DISCONNECTED);
        }
    }
}
