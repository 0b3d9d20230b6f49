//! Phase-continuous sine tone source
//!
//! The phase survives between calls so that chunk boundaries are inaudible:
//! generating N frames in any number of pieces yields exactly the samples of
//! one N-frame call.

use std::f64::consts::TAU;

/// Tone phase in radians, always within `[0, TAU)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Phase(f64);

impl Phase {
    pub fn new(radians: f64) -> Self {
        Self(radians.rem_euclid(TAU))
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    #[inline]
    fn step(self, increment: f64) -> Self {
        let next = self.0 + increment;
        if next >= TAU { Self(next - TAU) } else { Self(next) }
    }
}

/// Frequency and peak magnitude for one tick of generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub hz: u32,
    pub amplitude: i16,
}

impl Tone {
    pub fn new(hz: u32, amplitude: i16) -> Self {
        Self { hz, amplitude }
    }
}

/// Sample frames per tone cycle (integer, at least 1).
///
/// 256 Hz at 48 kHz gives 187.
pub fn wave_period(sample_rate: u32, tone_hz: u32) -> u32 {
    (sample_rate / tone_hz.max(1)).max(1)
}

/// Sine generator owning the phase that carries over between ticks.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    sample_rate: u32,
    phase: Phase,
}

impl ToneGenerator {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            phase: Phase::default(),
        }
    }

    pub fn with_phase(sample_rate: u32, phase: Phase) -> Self {
        Self { sample_rate, phase }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Lazily yields `count` stereo frames; the phase advances only for
    /// frames actually pulled from the iterator.
    pub fn frames(&mut self, count: usize, tone: Tone) -> ToneFrames<'_> {
        let period = wave_period(self.sample_rate, tone.hz);
        ToneFrames {
            phase: &mut self.phase,
            increment: TAU / period as f64,
            amplitude: tone.amplitude as f64,
            remaining: count,
        }
    }

    /// Advances the phase as if `count` frames had been generated.
    pub fn skip(&mut self, count: u64, tone: Tone) {
        if count == 0 {
            return;
        }
        let period = wave_period(self.sample_rate, tone.hz) as u64;
        // Whole cycles return to the same phase, only the remainder moves it.
        let leftover = count % period;
        let increment = TAU / period as f64;
        self.phase = Phase::new(self.phase.0 + leftover as f64 * increment);
    }
}

/// Iterator over generated `[left, right]` frames.
pub struct ToneFrames<'a> {
    phase: &'a mut Phase,
    increment: f64,
    amplitude: f64,
    remaining: usize,
}

impl Iterator for ToneFrames<'_> {
    type Item = [i16; 2];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let value = (self.amplitude * self.phase.0.sin()).round() as i16;
        *self.phase = self.phase.step(self.increment);
        self.remaining -= 1;
        Some([value, value])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ToneFrames<'_> {}

/// Generates `sample_count` interleaved frames starting at `phase`.
///
/// Returns `2 * sample_count` samples and the phase to continue from.
pub fn generate(
    sample_count: usize,
    tone_hz: u32,
    amplitude: i16,
    sample_rate: u32,
    phase: Phase,
) -> (Vec<i16>, Phase) {
    let mut generator = ToneGenerator::with_phase(sample_rate, phase);
    let samples = generator
        .frames(sample_count, Tone::new(tone_hz, amplitude))
        .flatten()
        .collect();
    (samples, generator.phase())
}
