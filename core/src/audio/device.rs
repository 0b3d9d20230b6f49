//! Audio device boundary
//!
//! A device exposes a fixed-size circular byte buffer that its playback
//! engine reads on its own schedule. The writer never touches device memory
//! directly: `lock` hands out staging regions for a byte window, and `unlock`
//! commits every region in one step, so a tick either writes its whole
//! window or nothing.

use smallvec::SmallVec;

use super::AudioFormat;
use crate::error::DeviceError;

/// Cursor snapshot reported by the device for one tick.
///
/// Never cached: the playback engine keeps moving after the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackPosition {
    /// Byte offset currently being played
    pub play_cursor: u32,
    /// Byte offset before which writing is unsafe
    pub write_cursor: u32,
}

/// Splits a window of `len` bytes at `offset` into at most two contiguous
/// spans of a ring of `capacity` bytes.
///
/// The second span exists only when the window runs past the end of the ring
/// and then starts at offset 0.
pub fn split_window(offset: u32, len: u32, capacity: u32) -> SmallVec<[(u32, u32); 2]> {
    let mut spans = SmallVec::new();
    if len == 0 {
        return spans;
    }
    let first = len.min(capacity - offset);
    spans.push((offset, first));
    if len > first {
        spans.push((0, len - first));
    }
    spans
}

/// One contiguous span of a locked window, with staging bytes to fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    offset: u32,
    bytes: Vec<u8>,
}

impl Region {
    /// Ring offset the region starts at
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// A locked byte window: one region, or two when it wraps the ring end.
///
/// Staging bytes start zeroed, so anything left unfilled commits as silence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedRegions {
    offset: u32,
    len: u32,
    regions: SmallVec<[Region; 2]>,
}

impl LockedRegions {
    /// Lays out the regions for a window, validating it against the ring.
    pub fn new(offset: u32, len: u32, capacity: u32) -> Result<Self, DeviceError> {
        if offset >= capacity || len > capacity {
            return Err(DeviceError::LockFailed {
                offset,
                len,
                reason: format!("window exceeds ring of {} bytes", capacity),
            });
        }
        let regions = split_window(offset, len, capacity)
            .into_iter()
            .map(|(offset, len)| Region {
                offset,
                bytes: vec![0; len as usize],
            })
            .collect();
        Ok(Self {
            offset,
            len,
            regions,
        })
    }

    /// Byte offset of the window
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Total window size across both regions
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn regions_mut(&mut self) -> &mut [Region] {
        &mut self.regions
    }

    /// `(region1, region2)` sizes; region2 is 0 unless the window wraps.
    pub fn region_sizes(&self) -> (u32, u32) {
        let size = |i: usize| self.regions.get(i).map_or(0, Region::len);
        (size(0), size(1))
    }

    /// Copies every region into device memory.
    ///
    /// `ring` must be the full ring this window was laid out for.
    pub fn copy_into(&self, ring: &mut [u8]) {
        for region in &self.regions {
            let start = region.offset as usize;
            ring[start..start + region.bytes.len()].copy_from_slice(&region.bytes);
        }
    }
}

/// Circular playback device.
pub trait SoundDevice {
    /// Format the ring was created with
    fn format(&self) -> AudioFormat;

    /// Ring capacity in bytes
    fn buffer_size(&self) -> u32 {
        self.format().buffer_size_bytes()
    }

    /// Current play and write cursors
    fn position(&self) -> Result<PlaybackPosition, DeviceError>;

    /// Locks `len` bytes starting at `offset` for writing
    fn lock(&mut self, offset: u32, len: u32) -> Result<LockedRegions, DeviceError>;

    /// Commits all regions of a lock at once
    fn unlock(&mut self, regions: LockedRegions) -> Result<(), DeviceError>;

    /// Starts playback
    fn play(&mut self, looping: bool) -> Result<(), DeviceError>;

    /// False for devices that stand in for missing hardware
    fn is_present(&self) -> bool {
        true
    }
}

/// Stand-in used when no output device could be opened.
///
/// Reports itself unavailable so the writer free-runs its phase.
#[derive(Debug, Clone)]
pub struct NullSoundDevice {
    format: AudioFormat,
}

impl NullSoundDevice {
    pub fn new(format: AudioFormat) -> Self {
        Self { format }
    }
}

impl SoundDevice for NullSoundDevice {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn position(&self) -> Result<PlaybackPosition, DeviceError> {
        Err(DeviceError::Unavailable("no audio device".to_string()))
    }

    fn lock(&mut self, _offset: u32, _len: u32) -> Result<LockedRegions, DeviceError> {
        Err(DeviceError::Unavailable("no audio device".to_string()))
    }

    fn unlock(&mut self, _regions: LockedRegions) -> Result<(), DeviceError> {
        Ok(())
    }

    fn play(&mut self, _looping: bool) -> Result<(), DeviceError> {
        Ok(())
    }

    fn is_present(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_without_wrap() {
        let spans = split_window(1000, 4000, 192_000);
        assert_eq!(spans.as_slice(), &[(1000, 4000)]);
    }

    #[test]
    fn test_split_with_wrap() {
        let spans = split_window(190_000, 4000, 192_000);
        assert_eq!(spans.as_slice(), &[(190_000, 2000), (0, 2000)]);
    }

    #[test]
    fn test_split_ending_exactly_at_ring_end() {
        let spans = split_window(188_000, 4000, 192_000);
        assert_eq!(spans.as_slice(), &[(188_000, 4000)]);
    }

    #[test]
    fn test_split_empty_window() {
        assert!(split_window(500, 0, 192_000).is_empty());
    }

    #[test]
    fn test_region_sizes_sum_for_all_offsets() {
        let capacity = 64;
        for offset in 0..capacity {
            for len in 0..=capacity {
                let locked = LockedRegions::new(offset, len, capacity).unwrap();
                let (first, second) = locked.region_sizes();
                assert_eq!(first + second, len);
                assert_eq!(second > 0, offset + len > capacity, "{} {}", offset, len);
            }
        }
    }

    #[test]
    fn test_lock_rejects_out_of_range_window() {
        assert!(LockedRegions::new(192_000, 4, 192_000).is_err());
        assert!(LockedRegions::new(0, 192_004, 192_000).is_err());
    }

    #[test]
    fn test_copy_into_wraps() {
        let mut locked = LockedRegions::new(6, 4, 8).unwrap();
        locked.regions_mut()[0].bytes_mut().copy_from_slice(&[1, 2]);
        locked.regions_mut()[1].bytes_mut().copy_from_slice(&[3, 4]);

        let mut ring = [0u8; 8];
        locked.copy_into(&mut ring);
        assert_eq!(ring, [3, 4, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_null_device_is_absent() {
        let mut device = NullSoundDevice::new(AudioFormat::stereo_i16(48_000, 48_000));
        assert!(!device.is_present());
        assert!(matches!(
            device.position(),
            Err(DeviceError::Unavailable(_))
        ));
        assert!(device.lock(0, 4).is_err());
        assert!(device.play(true).is_ok());
        assert_eq!(device.buffer_size(), 192_000);
    }
}
