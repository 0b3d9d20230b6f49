//! cpal-backed circular sound device
//!
//! The device ring lives in memory shared with the cpal callback. The callback
//! plays it back frame by frame from the play cursor and loops at the end;
//! the main thread only ever writes through `lock`/`unlock`, which copy the
//! staged regions into the ring under one mutex acquisition. The callback
//! never waits on that mutex: while a commit holds it, the callback outputs
//! silence and leaves the play cursor where it was.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use cpal::Sample;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringpace_core::{AudioFormat, DeviceError, LockedRegions, PlaybackPosition, SoundDevice};
use tracing::{debug, error, info};

/// Ring memory and cursors shared between the main thread and the callback.
pub(crate) struct SharedRing {
    bytes: Mutex<Vec<u8>>,
    /// Byte offset of the next frame the callback will play
    play_cursor: AtomicU32,
    /// Bytes consumed by the most recent callback
    chunk_bytes: AtomicU32,
    playing: AtomicBool,
    failed: AtomicBool,
}

impl SharedRing {
    pub(crate) fn new(buffer_size: u32) -> Self {
        Self {
            bytes: Mutex::new(vec![0; buffer_size as usize]),
            play_cursor: AtomicU32::new(0),
            chunk_bytes: AtomicU32::new(0),
            playing: AtomicBool::new(false),
            failed: AtomicBool::new(false),
        }
    }

    /// Fills one callback buffer from the ring, advancing the play cursor.
    ///
    /// Ring frames are 16-bit stereo. Mono outputs get the average of both
    /// channels and any channel past the second is silent.
    pub(crate) fn render<T>(&self, data: &mut [T], channels: usize)
    where
        T: Sample + cpal::FromSample<i16>,
    {
        if channels == 0 || !self.playing.load(Ordering::Acquire) {
            data.fill(T::EQUILIBRIUM);
            return;
        }
        let Ok(ring) = self.bytes.try_lock() else {
            data.fill(T::EQUILIBRIUM);
            return;
        };
        if ring.is_empty() {
            data.fill(T::EQUILIBRIUM);
            return;
        }

        let len = ring.len();
        let mut cursor = self.play_cursor.load(Ordering::Acquire) as usize % len;
        let mut consumed = 0u32;
        for frame in data.chunks_mut(channels) {
            let left = i16::from_le_bytes([ring[cursor], ring[cursor + 1]]);
            let right = i16::from_le_bytes([ring[cursor + 2], ring[cursor + 3]]);
            cursor = (cursor + 4) % len;
            consumed += 4;

            match frame {
                [mono] => {
                    let mixed = ((left as i32 + right as i32) / 2) as i16;
                    *mono = T::from_sample(mixed);
                }
                [l, r, rest @ ..] => {
                    *l = T::from_sample(left);
                    *r = T::from_sample(right);
                    rest.fill(T::EQUILIBRIUM);
                }
                [] => {}
            }
        }
        drop(ring);

        self.play_cursor.store(cursor as u32, Ordering::Release);
        self.chunk_bytes.store(consumed, Ordering::Release);
    }

    pub(crate) fn position(&self, buffer_size: u32) -> Result<PlaybackPosition, DeviceError> {
        if self.failed.load(Ordering::Acquire) {
            return Err(DeviceError::Unavailable("audio stream reported an error".to_string()));
        }
        let play_cursor = self.play_cursor.load(Ordering::Acquire);
        let chunk = self.chunk_bytes.load(Ordering::Acquire).min(buffer_size);
        Ok(PlaybackPosition {
            play_cursor,
            write_cursor: (play_cursor + chunk) % buffer_size,
        })
    }

    pub(crate) fn commit(&self, regions: &LockedRegions) -> Result<(), DeviceError> {
        let mut ring = self
            .bytes
            .lock()
            .map_err(|_| DeviceError::UnlockFailed("ring mutex poisoned".to_string()))?;
        regions.copy_into(&mut ring);
        Ok(())
    }

    fn start(&self) {
        self.playing.store(true, Ordering::Release);
    }

    fn mark_failed(&self) {
        self.failed.store(true, Ordering::Release);
    }
}

/// Sound device playing a ring through the default cpal output.
pub struct CpalSoundDevice {
    format: AudioFormat,
    shared: Arc<SharedRing>,
    /// The cpal stream (kept alive for the duration)
    stream: cpal::Stream,
}

impl CpalSoundDevice {
    /// Opens the default output device at the format's sample rate.
    ///
    /// The stream is built paused; nothing is audible until `play`.
    pub fn open(format: AudioFormat) -> Result<Self, DeviceError> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| DeviceError::Unavailable("no audio output device available".into()))?;

        let supported = pick_config(&device, format.sample_rate())?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.config();

        let shared = Arc::new(SharedRing::new(format.buffer_size_bytes()));
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, &shared),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, &shared),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, &shared),
            other => {
                return Err(DeviceError::Unavailable(format!(
                    "unsupported sample format: {:?}",
                    other
                )));
            }
        }
        .map_err(|e| DeviceError::Unavailable(format!("failed to build audio stream: {}", e)))?;

        info!(
            "Opened audio output: {} Hz, {} channels, {:?}, ring of {} bytes",
            config.sample_rate.0,
            config.channels,
            sample_format,
            format.buffer_size_bytes()
        );

        Ok(Self {
            format,
            shared,
            stream,
        })
    }
}

impl SoundDevice for CpalSoundDevice {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn position(&self) -> Result<PlaybackPosition, DeviceError> {
        self.shared.position(self.format.buffer_size_bytes())
    }

    fn lock(&mut self, offset: u32, len: u32) -> Result<LockedRegions, DeviceError> {
        LockedRegions::new(offset, len, self.format.buffer_size_bytes())
    }

    fn unlock(&mut self, regions: LockedRegions) -> Result<(), DeviceError> {
        self.shared.commit(&regions)
    }

    fn play(&mut self, looping: bool) -> Result<(), DeviceError> {
        if !looping {
            debug!("Ring playback always loops");
        }
        self.stream
            .play()
            .map_err(|e| DeviceError::PlayFailed(e.to_string()))?;
        self.shared.start();
        debug!("Audio stream started");
        Ok(())
    }
}

/// Finds an output config running at exactly `sample_rate`, preferring stereo.
fn pick_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<cpal::SupportedStreamConfig, DeviceError> {
    let rate = cpal::SampleRate(sample_rate);
    let ranges: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| DeviceError::Unavailable(format!("failed to query output configs: {}", e)))?
        .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
        .collect();

    ranges
        .iter()
        .find(|range| range.channels() == 2)
        .or_else(|| ranges.first())
        .map(|range| range.with_sample_rate(rate))
        .ok_or_else(|| {
            DeviceError::Unavailable(format!("output device does not support {} Hz", sample_rate))
        })
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    shared: &Arc<SharedRing>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<i16>,
{
    let channels = config.channels as usize;
    let ring = Arc::clone(shared);
    let on_error = Arc::clone(shared);
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| ring.render(data, channels),
        move |err| {
            error!("Audio stream error: {}", err);
            on_error.mark_failed();
        },
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_with_frames(frames: &[[i16; 2]]) -> SharedRing {
        let ring = SharedRing::new(frames.len() as u32 * 4);
        {
            let mut bytes = ring.bytes.lock().unwrap();
            for (i, [l, r]) in frames.iter().enumerate() {
                bytes[i * 4..i * 4 + 2].copy_from_slice(&l.to_le_bytes());
                bytes[i * 4 + 2..i * 4 + 4].copy_from_slice(&r.to_le_bytes());
            }
        }
        ring
    }

    #[test]
    fn test_render_is_silent_until_started() {
        let ring = ring_with_frames(&[[100, -100], [200, -200]]);
        let mut out = [7i16; 4];
        ring.render(&mut out, 2);
        assert_eq!(out, [0; 4]);
        assert_eq!(ring.position(8).unwrap().play_cursor, 0);
    }

    #[test]
    fn test_render_outputs_silence_while_ring_is_locked() {
        let ring = ring_with_frames(&[[100, -100], [200, -200]]);
        ring.start();

        let held = ring.bytes.lock().unwrap();
        let mut out = [7i16; 4];
        ring.render(&mut out, 2);
        drop(held);

        assert_eq!(out, [0; 4]);
        assert_eq!(ring.position(8).unwrap().play_cursor, 0);

        ring.render(&mut out, 2);
        assert_eq!(out, [100, -100, 200, -200]);
    }

    #[test]
    fn test_render_advances_and_loops() {
        let ring = ring_with_frames(&[[1, -1], [2, -2], [3, -3]]);
        ring.start();

        let mut out = [0i16; 4];
        ring.render(&mut out, 2);
        assert_eq!(out, [1, -1, 2, -2]);

        let position = ring.position(12).unwrap();
        assert_eq!(position.play_cursor, 8);
        assert_eq!(position.write_cursor, 4);

        ring.render(&mut out, 2);
        assert_eq!(out, [3, -3, 1, -1]);
        assert_eq!(ring.position(12).unwrap().play_cursor, 4);
    }

    #[test]
    fn test_render_mono_and_surround() {
        let ring = ring_with_frames(&[[100, 300], [-50, 50]]);
        ring.start();

        let mut mono = [0i16; 1];
        ring.render(&mut mono, 1);
        assert_eq!(mono, [200]);

        let mut quad = [9i16; 4];
        ring.render(&mut quad, 4);
        assert_eq!(quad, [-50, 50, 0, 0]);
    }

    #[test]
    fn test_commit_writes_regions() {
        let ring = SharedRing::new(16);
        let mut regions = LockedRegions::new(12, 8, 16).unwrap();
        for region in regions.regions_mut() {
            region.bytes_mut().fill(0x11);
        }
        ring.commit(&regions).unwrap();

        let bytes = ring.bytes.lock().unwrap();
        assert_eq!(&bytes[0..4], &[0x11; 4]);
        assert_eq!(&bytes[4..12], &[0; 8]);
        assert_eq!(&bytes[12..16], &[0x11; 4]);
    }

    #[test]
    fn test_stream_error_makes_position_unavailable() {
        let ring = SharedRing::new(16);
        ring.mark_failed();
        assert!(matches!(
            ring.position(16),
            Err(DeviceError::Unavailable(_))
        ));
    }
}
