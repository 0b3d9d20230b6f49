//! Session assembly and the run entry point
//!
//! Opens whichever real devices are available, substitutes null devices for
//! the rest, and runs the frame loop to completion.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use ringpace_core::config::AudioConfig;
use ringpace_core::{
    Clock, Config, FrameScheduler, HeadlessHost, HostWindow, InputSource, NullSoundDevice,
    RunSummary, SchedulerConfig, Session, SoundDevice, SystemClock,
};
use tracing::{info, warn};

use crate::audio::CpalSoundDevice;
use crate::input::{InputManager, KeyboardState, SharedKeyboard};
use crate::window::WindowHost;

/// Where frames go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostMode {
    /// Desktop window with GPU presentation
    #[default]
    Windowed,
    /// No window; frames are generated and discarded
    Headless,
}

/// Player configuration passed from CLI
#[derive(Debug, Clone, Default)]
pub struct PlayerConfig {
    pub config: Config,
    pub mode: HostMode,
    /// Stop after this many frames
    pub max_frames: Option<u64>,
}

/// Run the player until the user quits or the frame limit is reached.
pub fn run(player: PlayerConfig) -> Result<RunSummary> {
    let config = &player.config;
    config.validate()?;

    let keyboard: SharedKeyboard = Rc::new(RefCell::new(KeyboardState::default()));
    let sound = open_sound(&config.audio);
    let input = Box::new(InputManager::new(config.input.clone(), keyboard.clone()));
    let clock = Box::new(SystemClock::new(config.timing.cycle_counter));
    let scheduler = SchedulerConfig::from_config(config);

    if player.mode == HostMode::Windowed {
        match WindowHost::open(&config.video, keyboard, player.max_frames) {
            Ok(host) => return Ok(run_session(scheduler, host, sound, input, clock)),
            Err(e) => warn!("Failed to open window, running headless: {:#}", e),
        }
    }

    let host = match player.max_frames {
        Some(frames) => HeadlessHost::with_frame_limit(frames),
        None => HeadlessHost::new(),
    };
    Ok(run_session(scheduler, host, sound, input, clock))
}

/// Builds the session around `host` and runs the loop over it.
pub fn run_session<H: HostWindow>(
    config: SchedulerConfig,
    host: H,
    sound: Box<dyn SoundDevice>,
    input: Box<dyn InputSource>,
    clock: Box<dyn Clock>,
) -> RunSummary {
    let session = Session::new(host, sound, input, clock);
    let mut scheduler = FrameScheduler::new(config, session);
    scheduler.run()
}

/// Opens the output device, or a null device when disabled or unavailable.
pub fn open_sound(audio: &AudioConfig) -> Box<dyn SoundDevice> {
    let format = audio.format();
    if !audio.enabled {
        info!("Audio disabled");
        return Box::new(NullSoundDevice::new(format));
    }
    match CpalSoundDevice::open(format) {
        Ok(device) => Box::new(device),
        Err(e) => {
            warn!("{}. Continuing without sound.", e);
            Box::new(NullSoundDevice::new(format))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringpace_core::NullInput;

    #[test]
    fn test_disabled_audio_opens_null_device() {
        let audio = AudioConfig {
            enabled: false,
            ..AudioConfig::default()
        };
        let sound = open_sound(&audio);
        assert!(!sound.is_present());
        assert_eq!(sound.format(), audio.format());
    }

    #[test]
    fn test_headless_session_runs_to_limit() {
        let config = SchedulerConfig {
            width: 16,
            height: 8,
            ..SchedulerConfig::default()
        };
        let format = AudioConfig::default().format();

        let summary = run_session(
            config,
            HeadlessHost::with_frame_limit(3),
            Box::new(NullSoundDevice::new(format)),
            Box::new(NullInput),
            Box::new(SystemClock::new(false)),
        );
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.audio.ticks_absent, 3);
        assert_eq!(summary.present_failures, 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.audio.tone_hz = 0;
        let player = PlayerConfig {
            config,
            mode: HostMode::Headless,
            max_frames: Some(1),
        };
        assert!(run(player).is_err());
    }
}
