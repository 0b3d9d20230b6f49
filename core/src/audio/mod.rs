//! Audio generation and ring-buffer synchronization
//!
//! Architecture:
//! - The device owns a circular byte buffer that its playback engine consumes
//!   on its own schedule; all we can do is read its cursors
//! - Each tick, [`SoundRingWriter`] computes the window between its logical
//!   write cursor and a target a fixed latency ahead of the play cursor
//! - The window is locked as one or two regions, filled from [`ToneGenerator`],
//!   and committed in a single unlock
//! - Any failure skips the tick without touching writer state
//!
//! Audio specs:
//! - 16-bit signed little-endian PCM
//! - Stereo, interleaved
//! - Sample rate fixed at session start (48 kHz default)

mod device;
mod format;
mod ring_writer;
mod waveform;


pub use device::{
    LockedRegions, NullSoundDevice, PlaybackPosition, Region, SoundDevice, split_window,
};
pub use format::{AudioFormat, BITS_PER_SAMPLE, CHANNELS, MAX_BUFFER_FRAMES};
pub use ring_writer::{
    AudioTickOutcome, SoundRingWriter, WriteWindow, WriterStats, bytes_to_write, fill_regions,
};
pub use waveform::{Phase, Tone, ToneFrames, ToneGenerator, generate, wave_period};
