//! Shared test utilities for unit tests
//!
//! Simulated collaborators whose state stays inspectable after they have been
//! boxed into a [`Session`](crate::session::Session): each one shares its
//! state with the handle kept by the test.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::audio::{AudioFormat, LockedRegions, PlaybackPosition, SoundDevice};
use crate::error::{DeviceError, PresentError};
use crate::host::{HostWindow, PumpStatus};
use crate::input::{ControllerState, InputSource};
use crate::timing::Clock;
use crate::video::PixelFrame;

// ============================================================================
// Simulated Sound Device
// ============================================================================

/// Ring state behind a [`SimulatedSoundDevice`].
#[derive(Debug)]
pub struct SimulatedRing {
    pub bytes: Vec<u8>,
    pub play_cursor: u32,
    /// Bytes the play cursor moves on every `position()` call
    pub advance_per_read: u32,
    pub playing: bool,
    pub looping: bool,
    /// Every successful commit as `(offset, len)`
    pub commits: Vec<(u32, u32)>,
    pub locks: u32,
    pub fail_position: u32,
    pub fail_lock: u32,
    pub fail_unlock: u32,
    pub absent: bool,
}

/// In-memory ring device with a playback engine the test drives.
#[derive(Debug, Clone)]
pub struct SimulatedSoundDevice {
    format: AudioFormat,
    ring: Rc<RefCell<SimulatedRing>>,
}

impl SimulatedSoundDevice {
    pub fn new(format: AudioFormat) -> Self {
        let ring = SimulatedRing {
            bytes: vec![0xAA; format.buffer_size_bytes() as usize],
            play_cursor: 0,
            advance_per_read: 0,
            playing: false,
            looping: false,
            commits: Vec::new(),
            locks: 0,
            fail_position: 0,
            fail_lock: 0,
            fail_unlock: 0,
            absent: false,
        };
        Self {
            format,
            ring: Rc::new(RefCell::new(ring)),
        }
    }

    /// 48 kHz stereo with a one-second ring
    pub fn standard() -> Self {
        Self::new(AudioFormat::stereo_i16(48_000, 48_000))
    }

    /// Another handle onto the same ring
    pub fn handle(&self) -> Self {
        self.clone()
    }

    pub fn ring(&self) -> std::cell::RefMut<'_, SimulatedRing> {
        self.ring.borrow_mut()
    }

    /// Moves the play cursor forward, wrapping at the ring end.
    pub fn advance_play_cursor(&self, bytes: u32) {
        let mut ring = self.ring.borrow_mut();
        let size = ring.bytes.len() as u64;
        ring.play_cursor = ((ring.play_cursor as u64 + bytes as u64) % size) as u32;
    }

    pub fn set_play_cursor(&self, play_cursor: u32) {
        self.ring.borrow_mut().play_cursor = play_cursor;
    }

    pub fn commits(&self) -> Vec<(u32, u32)> {
        self.ring.borrow().commits.clone()
    }

    /// Frame `index` of the ring decoded as `[left, right]`
    pub fn frame_at(&self, index: u32) -> [i16; 2] {
        let ring = self.ring.borrow();
        let at = (index * self.format.bytes_per_sample()) as usize;
        let bytes = &ring.bytes[at..at + 4];
        [
            i16::from_le_bytes([bytes[0], bytes[1]]),
            i16::from_le_bytes([bytes[2], bytes[3]]),
        ]
    }
}

impl SoundDevice for SimulatedSoundDevice {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn position(&self) -> Result<PlaybackPosition, DeviceError> {
        let mut ring = self.ring.borrow_mut();
        if ring.absent {
            return Err(DeviceError::Unavailable("simulated device removed".into()));
        }
        if ring.fail_position > 0 {
            ring.fail_position -= 1;
            return Err(DeviceError::PositionUnavailable("simulated".into()));
        }
        let size = ring.bytes.len() as u64;
        let play_cursor = ring.play_cursor;
        ring.play_cursor = ((play_cursor as u64 + ring.advance_per_read as u64) % size) as u32;
        // Hardware keeps a small guard region past the play cursor.
        let write_cursor = ((play_cursor as u64 + 64) % size) as u32;
        Ok(PlaybackPosition {
            play_cursor,
            write_cursor,
        })
    }

    fn lock(&mut self, offset: u32, len: u32) -> Result<LockedRegions, DeviceError> {
        let mut ring = self.ring.borrow_mut();
        if ring.fail_lock > 0 {
            ring.fail_lock -= 1;
            return Err(DeviceError::LockFailed {
                offset,
                len,
                reason: "simulated".into(),
            });
        }
        ring.locks += 1;
        LockedRegions::new(offset, len, ring.bytes.len() as u32)
    }

    fn unlock(&mut self, regions: LockedRegions) -> Result<(), DeviceError> {
        let mut ring = self.ring.borrow_mut();
        if ring.fail_unlock > 0 {
            ring.fail_unlock -= 1;
            return Err(DeviceError::UnlockFailed("simulated".into()));
        }
        regions.copy_into(&mut ring.bytes);
        ring.commits.push((regions.offset(), regions.len()));
        Ok(())
    }

    fn play(&mut self, looping: bool) -> Result<(), DeviceError> {
        let mut ring = self.ring.borrow_mut();
        ring.playing = true;
        ring.looping = looping;
        Ok(())
    }
}

// ============================================================================
// Fake Clock
// ============================================================================

/// Manually driven clock; `sleep` advances it instead of blocking.
#[derive(Debug, Clone)]
pub struct FakeClock {
    frequency: u64,
    ticks: Rc<Cell<u64>>,
    cycles: Option<Rc<Cell<u64>>>,
    /// Ticks added on every `now()` read
    step: u64,
    slept: Rc<Cell<Duration>>,
}

impl FakeClock {
    pub fn new(frequency: u64) -> Self {
        Self {
            frequency,
            ticks: Rc::new(Cell::new(0)),
            cycles: Some(Rc::new(Cell::new(0))),
            step: 0,
            slept: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn without_cycles(mut self) -> Self {
        self.cycles = None;
        self
    }

    /// Advances by `step` ticks every time the clock is read.
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    pub fn advance_ticks(&self, ticks: u64) {
        self.ticks.set(self.ticks.get() + ticks);
    }

    pub fn advance_cycles(&self, cycles: u64) {
        if let Some(counter) = &self.cycles {
            counter.set(counter.get() + cycles);
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.get()
    }

    /// Total time passed to `sleep`
    pub fn slept(&self) -> Duration {
        self.slept.get()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> u64 {
        let now = self.ticks.get();
        self.ticks.set(now + self.step);
        now
    }

    fn frequency(&self) -> u64 {
        self.frequency
    }

    fn cycles(&self) -> Option<u64> {
        self.cycles.as_ref().map(|counter| counter.get())
    }

    fn sleep(&mut self, duration: Duration) {
        self.slept.set(self.slept.get() + duration);
        let ticks = (duration.as_secs_f64() * self.frequency as f64).round() as u64;
        self.advance_ticks(ticks);
    }
}

// ============================================================================
// Scripted Input
// ============================================================================

/// Input source replaying one slot-0 reading per poll.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    script: VecDeque<ControllerState>,
    current: ControllerState,
    pub polls: u32,
}

impl ScriptedInput {
    pub fn new(script: impl IntoIterator<Item = ControllerState>) -> Self {
        Self {
            script: script.into_iter().collect(),
            current: ControllerState::DISCONNECTED,
            polls: 0,
        }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) {
        self.polls += 1;
        self.current = self
            .script
            .pop_front()
            .unwrap_or(ControllerState::DISCONNECTED);
    }

    fn controls(&self, slot: usize) -> ControllerState {
        if slot == 0 {
            self.current
        } else {
            ControllerState::DISCONNECTED
        }
    }
}

// ============================================================================
// Recording Host
// ============================================================================

/// Host window that records what it was shown.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub pumps: u32,
    /// Pump call (1-based) that reports `Quit`
    pub quit_on_pump: Option<u32>,
    /// First pixel of every presented frame
    pub presented: Vec<u32>,
    pub fail_present: u32,
}

impl RecordingHost {
    pub fn quitting_on(pump: u32) -> Self {
        Self {
            quit_on_pump: Some(pump),
            ..Self::default()
        }
    }
}

impl HostWindow for RecordingHost {
    fn pump_events(&mut self) -> PumpStatus {
        self.pumps += 1;
        if self.quit_on_pump == Some(self.pumps) {
            PumpStatus::Quit
        } else {
            PumpStatus::Continue
        }
    }

    fn present(&mut self, frame: &PixelFrame) -> Result<(), PresentError> {
        if self.fail_present > 0 {
            self.fail_present -= 1;
            return Err(PresentError::SurfaceLost);
        }
        self.presented.push(frame.pixel(0, 0).unwrap_or_default());
        Ok(())
    }
}
