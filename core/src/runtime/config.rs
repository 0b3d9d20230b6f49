//! Scheduler configuration

use std::time::Duration;

use crate::config::Config;

/// Settings the scheduler reads every tick
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Generated frame size
    pub width: u32,
    pub height: u32,
    /// Tone used until a controller steers it
    pub tone_hz: u32,
    pub tone_volume: i16,
    /// Frames the audio writer stays ahead of the play cursor
    pub latency_frames: u32,
    /// Minimum frame time; `None` runs uncapped
    pub frame_budget: Option<Duration>,
    /// Frame time warning threshold
    pub warn_frame: Duration,
    /// Frames per logged timing summary (0 disables)
    pub report_interval: u32,
}

impl SchedulerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            width: config.video.width,
            height: config.video.height,
            tone_hz: config.audio.tone_hz,
            tone_volume: config.audio.tone_volume,
            latency_frames: config.audio.latency_frames(),
            frame_budget: config
                .timing
                .target_fps
                .filter(|&fps| fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / fps as f64)),
            warn_frame: Duration::from_secs_f64(config.timing.warn_frame_ms.max(0.0) / 1000.0),
            report_interval: config.timing.report_interval,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
