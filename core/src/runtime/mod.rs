//! Frame loop orchestration
//!
//! Each iteration drains host events, polls input, advances the game state,
//! renders the frame, tops up the audio ring, presents, and measures. A quit
//! request is honored at the top of the next iteration, so the iteration
//! that saw it always completes.

use std::time::Duration;

use tracing::{info, warn};

use crate::audio::{AudioTickOutcome, SoundRingWriter};
use crate::game::GameState;
use crate::host::HostWindow;
use crate::session::Session;
use crate::timing::{FrameMeasurement, FrameTimer};
use crate::video::PixelFrame;

mod config;
mod game_loop;
mod stats;


pub use config::SchedulerConfig;
pub use stats::{FrameHistory, FrameTimeStats, FrameTotals, RunSummary};

/// Everything one iteration did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// 1-based index of the completed frame
    pub frame: u64,
    pub audio: AudioTickOutcome,
    pub presented: bool,
    pub measurement: FrameMeasurement,
    /// Set when a quit was seen; no further iterations will run
    pub quit_requested: bool,
}

/// Drives the loop over a [`Session`].
pub struct FrameScheduler<H: HostWindow> {
    config: SchedulerConfig,
    session: Session<H>,
    writer: SoundRingWriter,
    game: GameState,
    frame: PixelFrame,
    timer: FrameTimer,
    history: FrameHistory,
    totals: FrameTotals,
    /// Duration of the previous frame, fed to the audio free-run
    last_elapsed: Duration,
    frames: u64,
    present_failures: u64,
    quit_requested: bool,
}

impl<H: HostWindow> FrameScheduler<H> {
    /// Builds the loop state and primes the audio ring if a device is present.
    pub fn new(config: SchedulerConfig, mut session: Session<H>) -> Self {
        let format = session.sound().format();
        let mut writer = SoundRingWriter::new(format, config.latency_frames);
        if session.sound().is_present()
            && let Err(e) = writer.prime(session.sound_mut())
        {
            warn!("Failed to prime audio ring: {}", e);
        }

        let timer = FrameTimer::new(session.clock());
        info!(
            "Frame loop ready: {}x{}, {} Hz audio, {} frames latency",
            config.width,
            config.height,
            format.sample_rate(),
            config.latency_frames
        );

        Self {
            game: GameState::new(config.tone_hz, config.tone_volume),
            frame: PixelFrame::new(config.width, config.height),
            history: FrameHistory::new(config.report_interval as usize),
            totals: FrameTotals::default(),
            writer,
            timer,
            session,
            config,
            last_elapsed: Duration::ZERO,
            frames: 0,
            present_failures: 0,
            quit_requested: false,
        }
    }

    /// Runs iterations until a quit is requested.
    pub fn run(&mut self) -> RunSummary {
        while !self.quit_requested {
            self.tick();
        }
        let summary = self.summary();
        info!(
            "Frame loop finished after {} frames ({:.2}ms avg)",
            summary.frames, summary.frame_time.avg_ms
        );
        summary
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames: self.frames,
            audio: self.writer.stats(),
            present_failures: self.present_failures,
            frame_time: self.totals.stats(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn session(&self) -> &Session<H> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<H> {
        &mut self.session
    }

    /// Hands the session back, releasing the loop state.
    pub fn into_session(self) -> Session<H> {
        self.session
    }

    pub fn writer(&self) -> &SoundRingWriter {
        &self.writer
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn frame(&self) -> &PixelFrame {
        &self.frame
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}
