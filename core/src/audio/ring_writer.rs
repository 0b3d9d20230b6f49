//! Ring-buffer writer that keeps generated audio a fixed latency ahead of
//! the device's play cursor.

use std::time::Duration;

use tracing::{debug, trace, warn};

use super::{AudioFormat, LockedRegions, PlaybackPosition, SoundDevice, Tone, ToneGenerator};
use crate::error::DeviceError;

/// Bytes from `byte_to_lock` forward to `target_cursor` around a ring.
///
/// Equal cursors mean the writer has caught up and returns 0.
pub fn bytes_to_write(byte_to_lock: u32, target_cursor: u32, buffer_size: u32) -> u32 {
    if byte_to_lock > target_cursor {
        (buffer_size - byte_to_lock) + target_cursor
    } else {
        target_cursor - byte_to_lock
    }
}

/// Byte window claimed for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteWindow {
    /// Where the writer's logical cursor points in the ring
    pub byte_to_lock: u32,
    /// Play cursor plus the latency budget
    pub target_cursor: u32,
    /// Window size, possibly wrapping the ring end
    pub bytes_to_write: u32,
}

impl WriteWindow {
    pub fn new(byte_to_lock: u32, target_cursor: u32, buffer_size: u32) -> Self {
        Self {
            byte_to_lock,
            target_cursor,
            bytes_to_write: bytes_to_write(byte_to_lock, target_cursor, buffer_size),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes_to_write == 0
    }
}

/// What the writer did on a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioTickOutcome {
    /// The window was generated and committed
    Written { window: WriteWindow, frames: u32 },
    /// The logical cursor already sits on the target; nothing generated
    CaughtUp { window: WriteWindow },
    /// No device or no cursors; the phase free-ran by this many frames
    DeviceAbsent { free_run_frames: u64 },
    /// Lock or unlock failed; nothing written, state unchanged
    Skipped {
        window: WriteWindow,
        error: DeviceError,
    },
}

/// Running totals for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub frames_written: u64,
    pub ticks_written: u64,
    pub ticks_caught_up: u64,
    pub ticks_skipped: u64,
    pub ticks_absent: u64,
}

/// Fills every region of a lock in order, continuing the generator's phase
/// from one region into the next.
///
/// Each region receives `len / bytes_per_sample` whole frames encoded as
/// little-endian 16-bit interleaved samples. Returns the frames generated.
pub fn fill_regions(
    locked: &mut LockedRegions,
    generator: &mut ToneGenerator,
    tone: Tone,
    bytes_per_sample: u32,
) -> u32 {
    let mut total = 0;
    for region in locked.regions_mut() {
        let sample_count = region.len() / bytes_per_sample;
        let destination = region.bytes_mut().chunks_exact_mut(bytes_per_sample as usize);
        for (dest, frame) in destination.zip(generator.frames(sample_count as usize, tone)) {
            dest[0..2].copy_from_slice(&frame[0].to_le_bytes());
            dest[2..4].copy_from_slice(&frame[1].to_le_bytes());
        }
        total += sample_count;
    }
    total
}

/// Owns the logical write cursor and tone phase of the audio path.
pub struct SoundRingWriter {
    format: AudioFormat,
    latency_frames: u32,
    /// Sample frames committed this session
    write_cursor_samples: u64,
    generator: ToneGenerator,
    /// Fractional frames carried between free-running ticks
    free_run_remainder: f64,
    stats: WriterStats,
    reported_transient: bool,
    reported_absent: bool,
}

impl SoundRingWriter {
    pub fn new(format: AudioFormat, latency_frames: u32) -> Self {
        Self {
            format,
            latency_frames,
            write_cursor_samples: 0,
            generator: ToneGenerator::new(format.sample_rate()),
            free_run_remainder: 0.0,
            stats: WriterStats::default(),
            reported_transient: false,
            reported_absent: false,
        }
    }

    /// Starts from an existing logical cursor instead of zero.
    pub fn with_write_cursor(mut self, write_cursor_samples: u64) -> Self {
        self.write_cursor_samples = write_cursor_samples;
        self
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn latency_frames(&self) -> u32 {
        self.latency_frames
    }

    pub fn write_cursor_samples(&self) -> u64 {
        self.write_cursor_samples
    }

    pub fn generator(&self) -> &ToneGenerator {
        &self.generator
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    /// Ring offset of the logical write cursor
    pub fn byte_to_lock(&self) -> u32 {
        let bytes = self.write_cursor_samples * self.format.bytes_per_sample() as u64;
        (bytes % self.format.buffer_size_bytes() as u64) as u32
    }

    /// Latency budget ahead of `play_cursor`, aligned down to a whole frame
    pub fn target_cursor(&self, play_cursor: u32) -> u32 {
        let block = self.format.bytes_per_sample();
        let size = self.format.buffer_size_bytes() as u64;
        let play = (play_cursor - play_cursor % block) as u64;
        let ahead = self.latency_frames as u64 * block as u64;
        ((play + ahead) % size) as u32
    }

    /// Window for a cursor snapshot
    pub fn window(&self, position: PlaybackPosition) -> WriteWindow {
        WriteWindow::new(
            self.byte_to_lock(),
            self.target_cursor(position.play_cursor),
            self.format.buffer_size_bytes(),
        )
    }

    /// Fills the whole ring with silence and starts looping playback.
    pub fn prime(&mut self, device: &mut dyn SoundDevice) -> Result<(), DeviceError> {
        let locked = device.lock(0, device.buffer_size())?;
        device.unlock(locked)?;
        device.play(true)?;
        debug!(
            "Audio ring primed: {} bytes, latency {} frames",
            device.buffer_size(),
            self.latency_frames
        );
        Ok(())
    }

    /// Runs one tick of the audio path.
    ///
    /// `elapsed` is the previous frame's duration; it only matters when the
    /// device is absent and the phase free-runs.
    pub fn tick(
        &mut self,
        device: &mut dyn SoundDevice,
        tone: Tone,
        elapsed: Duration,
    ) -> AudioTickOutcome {
        // Without cursors there is no safe window; treat the device as absent.
        let position = match device.position() {
            Ok(position) => position,
            Err(error) => return self.free_run(tone, elapsed, &error),
        };
        self.reported_absent = false;

        let window = self.window(position);
        if window.is_empty() {
            self.stats.ticks_caught_up += 1;
            trace!("Audio caught up at byte {}", window.byte_to_lock);
            return AudioTickOutcome::CaughtUp { window };
        }

        let mut locked = match device.lock(window.byte_to_lock, window.bytes_to_write) {
            Ok(locked) => locked,
            Err(error) => return self.skip(window, error),
        };

        // Generate on a copy so a failed commit leaves the phase untouched.
        let mut generator = self.generator.clone();
        let frames = fill_regions(
            &mut locked,
            &mut generator,
            tone,
            self.format.bytes_per_sample(),
        );

        if let Err(error) = device.unlock(locked) {
            return self.skip(window, error);
        }

        self.generator = generator;
        self.write_cursor_samples += frames as u64;
        self.reported_transient = false;
        self.stats.frames_written += frames as u64;
        self.stats.ticks_written += 1;
        trace!(
            "Audio wrote {} frames at byte {} (target {})",
            frames, window.byte_to_lock, window.target_cursor
        );
        AudioTickOutcome::Written { window, frames }
    }

    fn skip(&mut self, window: WriteWindow, error: DeviceError) -> AudioTickOutcome {
        self.stats.ticks_skipped += 1;
        if self.reported_transient && error.is_transient() {
            debug!("Audio write skipped: {}", error);
        } else {
            warn!("Audio write skipped: {}; retrying next tick", error);
            self.reported_transient = true;
        }
        AudioTickOutcome::Skipped { window, error }
    }

    fn free_run(&mut self, tone: Tone, elapsed: Duration, error: &DeviceError) -> AudioTickOutcome {
        if self.reported_absent {
            trace!("Audio device absent: {}", error);
        } else {
            warn!("{}; audio is silent, tone phase keeps running", error);
            self.reported_absent = true;
        }
        let exact =
            elapsed.as_secs_f64() * self.format.sample_rate() as f64 + self.free_run_remainder;
        let frames = exact.floor();
        self.free_run_remainder = exact - frames;
        self.generator.skip(frames as u64, tone);
        self.stats.ticks_absent += 1;
        AudioTickOutcome::DeviceAbsent {
            free_run_frames: frames as u64,
        }
    }
}
