//! ringpace core - audio ring-buffer synchronization and frame pacing
//!
//! This crate owns everything with real invariants in the interactive loop:
//! where to write the next audio samples in a circular device buffer that is
//! consumed asynchronously, how many to write, and how to pace and measure
//! each iteration. Windows, GPUs, gamepads and sound cards are reached
//! only through the boundary traits defined here.
//!
//! # Architecture
//!
//! - [`SoundRingWriter`] - Computes the safe write window and fills it
//! - [`ToneGenerator`] - Phase-continuous sine wave source
//! - [`PixelFrame`] - Generated frame handed to the host for presentation
//! - [`FrameScheduler`] - The per-tick loop: events, input, generate, present, measure
//! - [`Session`] - Owns every device capability for the lifetime of the loop

pub mod audio;
pub mod config;
pub mod error;
pub mod game;
pub mod host;
pub mod input;
pub mod runtime;
pub mod session;
#[cfg(test)]
pub mod test_utils;
pub mod timing;
pub mod video;

pub use audio::{
    AudioFormat, AudioTickOutcome, LockedRegions, NullSoundDevice, PlaybackPosition, Region,
    SoundDevice, SoundRingWriter, Tone, ToneGenerator, WriteWindow, WriterStats,
};
pub use config::Config;
pub use error::{ConfigError, DeviceError, PresentError};
pub use game::GameState;
pub use host::{HeadlessHost, HostWindow, PumpStatus};
pub use input::{Buttons, ControllerState, InputSource, MAX_CONTROLLERS, NullInput};
pub use runtime::{FrameScheduler, RunSummary, SchedulerConfig, TickReport};
pub use session::Session;
pub use timing::{Clock, FrameMeasurement, FrameTimer, FrameTiming, SystemClock};
pub use video::PixelFrame;
