//! Frame time statistics

use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, RingBuffer};

use crate::audio::WriterStats;

/// Min/avg/max over a set of frame times in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTimeStats {
    pub count: u64,
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
}

/// Rolling window of the most recent frame times.
pub struct FrameHistory {
    ring: HeapRb<f64>,
}

impl FrameHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: HeapRb::new(capacity.max(1)),
        }
    }

    /// Records a frame, evicting the oldest one when full
    pub fn push(&mut self, ms: f64) {
        self.ring.push_overwrite(ms);
    }

    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn stats(&self) -> FrameTimeStats {
        let mut totals = FrameTotals::default();
        for &ms in self.ring.iter() {
            totals.record(ms);
        }
        totals.stats()
    }
}

/// Running totals for a whole run, without keeping every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTotals {
    count: u64,
    total_ms: f64,
    min_ms: f64,
    max_ms: f64,
}

impl FrameTotals {
    pub fn record(&mut self, ms: f64) {
        if self.count == 0 {
            self.min_ms = ms;
            self.max_ms = ms;
        } else {
            self.min_ms = self.min_ms.min(ms);
            self.max_ms = self.max_ms.max(ms);
        }
        self.total_ms += ms;
        self.count += 1;
    }

    pub fn stats(&self) -> FrameTimeStats {
        FrameTimeStats {
            count: self.count,
            min_ms: self.min_ms,
            avg_ms: if self.count == 0 {
                0.0
            } else {
                self.total_ms / self.count as f64
            },
            max_ms: self.max_ms,
        }
    }
}

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub audio: WriterStats,
    pub present_failures: u64,
    pub frame_time: FrameTimeStats,
}
