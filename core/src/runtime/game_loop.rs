//! One iteration of the frame loop

use tracing::{debug, info, trace, warn};

use crate::host::{HostWindow, PumpStatus};
use crate::input::MAX_CONTROLLERS;

use super::{FrameScheduler, TickReport};

impl<H: HostWindow> FrameScheduler<H> {
    /// Executes a single iteration.
    ///
    /// Always runs to completion; a quit seen while draining events only
    /// stops the iterations after this one.
    pub fn tick(&mut self) -> TickReport {
        if self.session.host_mut().pump_events() == PumpStatus::Quit && !self.quit_requested {
            info!("Quit requested");
            self.quit_requested = true;
        }

        let input = self.session.input_mut();
        input.poll();
        for slot in 0..MAX_CONTROLLERS {
            let controls = input.controls(slot);
            self.game.apply_controls(&controls);
        }

        self.frame.render_into(self.game.x_offset, self.game.y_offset);

        let audio = self.writer.tick(
            self.session.sound_mut(),
            self.game.tone(),
            self.last_elapsed,
        );

        let presented = match self.session.host_mut().present(&self.frame) {
            Ok(()) => true,
            Err(e) => {
                if self.present_failures == 0 {
                    warn!("Present failed: {}", e);
                } else {
                    debug!("Present failed: {}", e);
                }
                self.present_failures += 1;
                false
            }
        };

        self.game.advance_frame();

        // Sleep out the rest of the frame; the sleep counts toward frame time.
        if let Some(budget) = self.config.frame_budget {
            let spent = self.timer.elapsed_since_last(self.session.clock());
            if spent < budget {
                self.session.clock_mut().sleep(budget - spent);
            }
        }

        let measurement = self.timer.measure(self.session.clock());
        self.last_elapsed = measurement.elapsed();
        self.frames += 1;
        self.history.push(measurement.ms_per_frame);
        self.totals.record(measurement.ms_per_frame);

        if measurement.elapsed() > self.config.warn_frame {
            warn!(
                "Frame took {:.2}ms, exceeds budget of {:?}",
                measurement.ms_per_frame, self.config.warn_frame
            );
        }
        trace!(
            "{:.2}ms/f, {:.2}f/s, {:.2}mc/f",
            measurement.ms_per_frame,
            measurement.fps,
            measurement.mega_cycles_per_frame.unwrap_or(0.0)
        );

        let interval = self.config.report_interval as u64;
        if interval > 0 && self.frames % interval == 0 {
            let window = self.history.stats();
            let audio_stats = self.writer.stats();
            debug!(
                "Frames {}: {:.2}/{:.2}/{:.2}ms, audio {} written, {} skipped, {} absent",
                self.frames,
                window.min_ms,
                window.avg_ms,
                window.max_ms,
                audio_stats.ticks_written,
                audio_stats.ticks_skipped,
                audio_stats.ticks_absent
            );
        }

        TickReport {
            frame: self.frames,
            audio,
            presented,
            measurement,
            quit_requested: self.quit_requested,
        }
    }
}
