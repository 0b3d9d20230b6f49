//! Clock boundary and per-frame measurement

use std::time::{Duration, Instant};

/// Monotonic tick counter plus an optional CPU cycle counter.
pub trait Clock {
    /// Current tick count
    fn now(&self) -> u64;

    /// Ticks per second
    fn frequency(&self) -> u64;

    /// Raw CPU cycle count, when the platform has one (diagnostic only)
    fn cycles(&self) -> Option<u64>;

    /// Blocks the loop thread for roughly `duration`
    fn sleep(&mut self, duration: Duration);
}

/// Nanosecond clock over [`Instant`], with the TSC on x86_64.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
    cycle_counter: bool,
}

impl SystemClock {
    pub fn new(cycle_counter: bool) -> Self {
        Self {
            origin: Instant::now(),
            cycle_counter,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn frequency(&self) -> u64 {
        1_000_000_000
    }

    fn cycles(&self) -> Option<u64> {
        if !self.cycle_counter {
            return None;
        }
        read_cycle_counter()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(target_arch = "x86_64")]
fn read_cycle_counter() -> Option<u64> {
    // SAFETY: RDTSC is available on every x86_64 CPU and has no side effects.
    #[allow(unused_unsafe)]
    let cycles = unsafe { core::arch::x86_64::_rdtsc() };
    Some(cycles)
}

#[cfg(not(target_arch = "x86_64"))]
fn read_cycle_counter() -> Option<u64> {
    None
}

/// Snapshot taken at the end of a frame; the baseline for the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    pub last_counter_ticks: u64,
    pub last_cycle_count: Option<u64>,
}

impl FrameTiming {
    pub fn capture(clock: &dyn Clock) -> Self {
        Self {
            last_counter_ticks: clock.now(),
            last_cycle_count: clock.cycles(),
        }
    }
}

/// Timing of one completed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMeasurement {
    pub elapsed_ticks: u64,
    pub ms_per_frame: f64,
    /// 0 when no ticks elapsed
    pub fps: f64,
    pub mega_cycles_per_frame: Option<f64>,
}

impl FrameMeasurement {
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.ms_per_frame / 1000.0)
    }
}

/// Measures frame-to-frame time against the previous snapshot.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    frequency: u64,
    last: FrameTiming,
}

impl FrameTimer {
    /// Starts timing from the clock's current reading.
    pub fn new(clock: &dyn Clock) -> Self {
        Self {
            frequency: clock.frequency().max(1),
            last: FrameTiming::capture(clock),
        }
    }

    pub fn last(&self) -> FrameTiming {
        self.last
    }

    /// Ticks since the last measurement, without taking a new baseline
    pub fn elapsed_since_last(&self, clock: &dyn Clock) -> Duration {
        let ticks = clock.now().saturating_sub(self.last.last_counter_ticks);
        Duration::from_secs_f64(ticks as f64 / self.frequency as f64)
    }

    /// Measures the frame that just ended and makes now the new baseline.
    pub fn measure(&mut self, clock: &dyn Clock) -> FrameMeasurement {
        let now = FrameTiming::capture(clock);
        let elapsed_ticks = now
            .last_counter_ticks
            .saturating_sub(self.last.last_counter_ticks);
        let ms_per_frame = elapsed_ticks as f64 * 1000.0 / self.frequency as f64;
        let fps = if elapsed_ticks == 0 {
            0.0
        } else {
            self.frequency as f64 / elapsed_ticks as f64
        };
        let mega_cycles_per_frame = match (now.last_cycle_count, self.last.last_cycle_count) {
            (Some(now), Some(last)) => Some(now.wrapping_sub(last) as f64 / 1_000_000.0),
            _ => None,
        };
        self.last = now;
        FrameMeasurement {
            elapsed_ticks,
            ms_per_frame,
            fps,
            mega_cycles_per_frame,
        }
    }
}
