//! Minimal game state driven by the controllers

use crate::audio::Tone;
use crate::input::ControllerState;

/// Offsets of the scrolling gradient and the steered tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub x_offset: i32,
    pub y_offset: i32,
    pub tone_hz: u32,
    pub tone_volume: i16,
}

impl GameState {
    pub fn new(tone_hz: u32, tone_volume: i16) -> Self {
        Self {
            x_offset: 0,
            y_offset: 0,
            tone_hz,
            tone_volume,
        }
    }

    /// Applies one controller reading; disconnected controllers change nothing.
    ///
    /// The stick's Y axis steers the tone around 512 Hz, and both axes nudge
    /// the gradient offsets.
    pub fn apply_controls(&mut self, controls: &ControllerState) {
        if !controls.connected {
            return;
        }
        let stick_x = controls.left_stick_x as i32;
        let stick_y = controls.left_stick_y as i32;
        let bend = (256.0 * stick_y as f64 / 30000.0) as i32;
        self.tone_hz = (512 + bend).max(1) as u32;
        self.x_offset = self.x_offset.wrapping_add(stick_x / 4096);
        self.y_offset = self.y_offset.wrapping_add(stick_y / 4096);
    }

    /// Per-frame scroll of the gradient
    pub fn advance_frame(&mut self) {
        self.x_offset = self.x_offset.wrapping_add(1);
    }

    pub fn tone(&self) -> Tone {
        Tone::new(self.tone_hz, self.tone_volume)
    }
}
