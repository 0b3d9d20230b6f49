//! Host window boundary
//!
//! The host owns the OS event queue and the presentation surface. The
//! scheduler drains its events once per tick and hands it each frame.

use tracing::debug;

use crate::error::PresentError;
use crate::video::PixelFrame;

/// Result of draining the host's pending events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpStatus {
    Continue,
    /// The user asked to close; the loop stops before its next iteration
    Quit,
}

/// Window-like collaborator: event drain plus frame presentation.
pub trait HostWindow {
    /// Drains all pending events without blocking
    fn pump_events(&mut self) -> PumpStatus;

    /// Displays a frame, scaling it to the window as needed
    fn present(&mut self, frame: &PixelFrame) -> Result<(), PresentError>;
}

/// Host without a window: discards frames and quits after a frame budget.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    max_frames: Option<u64>,
    presented: u64,
}

impl HeadlessHost {
    /// Host that never asks to quit
    pub fn new() -> Self {
        Self::default()
    }

    /// Host that asks to quit once `frames` frames have been presented
    pub fn with_frame_limit(frames: u64) -> Self {
        Self {
            max_frames: Some(frames),
            presented: 0,
        }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl HostWindow for HeadlessHost {
    fn pump_events(&mut self) -> PumpStatus {
        match self.max_frames {
            Some(max) if self.presented >= max => {
                debug!("Headless frame limit of {} reached", max);
                PumpStatus::Quit
            }
            _ => PumpStatus::Continue,
        }
    }

    fn present(&mut self, _frame: &PixelFrame) -> Result<(), PresentError> {
        self.presented += 1;
        Ok(())
    }
}
