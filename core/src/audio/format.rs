//! Sample format of the device ring

/// Interleaved output channels (left, right)
pub const CHANNELS: u16 = 2;

/// Bits per channel sample (signed 16-bit PCM)
pub const BITS_PER_SAMPLE: u16 = 16;

/// Largest ring whose byte size still fits in a `u32` cursor
pub const MAX_BUFFER_FRAMES: u32 = u32::MAX / (CHANNELS as u32 * BITS_PER_SAMPLE as u32 / 8);

/// Fixed format of a device ring, chosen once per session.
///
/// A "sample" here is one interleaved stereo frame, so `bytes_per_sample`
/// is `channels * bits / 8` = 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    buffer_frames: u32,
}

impl AudioFormat {
    /// 16-bit stereo format with a ring of `buffer_frames` sample frames.
    ///
    /// The ring is clamped to `1..=MAX_BUFFER_FRAMES` so byte offsets never
    /// overflow and never reduce modulo zero.
    pub fn stereo_i16(sample_rate: u32, buffer_frames: u32) -> Self {
        Self {
            sample_rate,
            channels: CHANNELS,
            bits_per_sample: BITS_PER_SAMPLE,
            buffer_frames: buffer_frames.clamp(1, MAX_BUFFER_FRAMES),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// Bytes in one interleaved frame (block align)
    pub fn bytes_per_sample(&self) -> u32 {
        self.channels as u32 * self.bits_per_sample as u32 / 8
    }

    /// Ring capacity in sample frames
    pub fn buffer_frames(&self) -> u32 {
        self.buffer_frames
    }

    /// Ring capacity in bytes
    pub fn buffer_size_bytes(&self) -> u32 {
        let block = self.bytes_per_sample();
        self.buffer_frames
            .checked_mul(block)
            .unwrap_or(u32::MAX - u32::MAX % block)
    }

    /// Average byte rate, as a wave header would report it (saturating)
    pub fn bytes_per_second(&self) -> u32 {
        self.sample_rate.saturating_mul(self.bytes_per_sample())
    }
}
