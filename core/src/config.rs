//! Configuration management (config.toml)
//!
//! Handles loading, saving, and providing defaults for session settings.
//! Settings are stored in TOML format in the platform-specific config directory.
//! Every section falls back to its defaults, so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::{AudioFormat, MAX_BUFFER_FRAMES};
use crate::error::ConfigError;

/// Highest accepted output sample rate in Hz
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Largest accepted frame width or height in pixels
pub const MAX_FRAME_DIMENSION: u32 = 8192;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Audio device and tone settings
    #[serde(default)]
    pub audio: AudioConfig,
    /// Window and frame settings
    #[serde(default)]
    pub video: VideoConfig,
    /// Pacing and diagnostics settings
    #[serde(default)]
    pub timing: TimingConfig,
    /// Controller settings
    #[serde(default)]
    pub input: InputConfig,
}

/// Audio configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Open an output device at startup (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Output sample rate in Hz, fixed for the session (default: 48000)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Ring capacity in sample frames (default: one second)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_frames: Option<u32>,
    /// Frames to stay ahead of the play cursor (default: sample_rate / 15)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_frames: Option<u32>,
    /// Tone frequency when no controller steers it (default: 256)
    #[serde(default = "default_tone_hz")]
    pub tone_hz: u32,
    /// Peak sample magnitude of the tone (default: 3000)
    #[serde(default = "default_tone_volume")]
    pub tone_volume: i16,
}

/// Video configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Window title
    #[serde(default = "default_title")]
    pub title: String,
    /// Generated frame width in pixels (default: 1200)
    #[serde(default = "default_width")]
    pub width: u32,
    /// Generated frame height in pixels (default: 720)
    #[serde(default = "default_height")]
    pub height: u32,
    /// Whether to enable vertical sync (default: true)
    #[serde(default = "default_true")]
    pub vsync: bool,
}

/// Pacing and diagnostics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Sleep out the rest of each frame to hold this rate (default: uncapped)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_fps: Option<u32>,
    /// Warn when a single tick takes longer than this (default: 50ms)
    #[serde(default = "default_warn_frame_ms")]
    pub warn_frame_ms: f64,
    /// Frames between timing summaries in the log (default: 120)
    #[serde(default = "default_report_interval")]
    pub report_interval: u32,
    /// Read the CPU cycle counter for diagnostics (default: true)
    #[serde(default = "default_true")]
    pub cycle_counter: bool,
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Map keyboard keys to controller slot 0 (default: true)
    #[serde(default = "default_true")]
    pub keyboard: bool,
    /// Deadzone for analog sticks (0.0-1.0)
    #[serde(default = "default_deadzone")]
    pub stick_deadzone: f32,
}

fn default_true() -> bool {
    true
}
fn default_sample_rate() -> u32 {
    48_000
}
fn default_tone_hz() -> u32 {
    256
}
fn default_tone_volume() -> i16 {
    3000
}
fn default_title() -> String {
    "ringpace".to_string()
}
fn default_width() -> u32 {
    1200
}
fn default_height() -> u32 {
    720
}
fn default_warn_frame_ms() -> f64 {
    50.0
}
fn default_report_interval() -> u32 {
    120
}
fn default_deadzone() -> f32 {
    0.15
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: default_sample_rate(),
            buffer_frames: None,
            latency_frames: None,
            tone_hz: default_tone_hz(),
            tone_volume: default_tone_volume(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            vsync: true,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            target_fps: None,
            warn_frame_ms: default_warn_frame_ms(),
            report_interval: default_report_interval(),
            cycle_counter: true,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            keyboard: true,
            stick_deadzone: default_deadzone(),
        }
    }
}

impl AudioConfig {
    /// Ring capacity in sample frames.
    pub fn buffer_frames(&self) -> u32 {
        self.buffer_frames.unwrap_or(self.sample_rate)
    }

    /// Latency budget in sample frames.
    pub fn latency_frames(&self) -> u32 {
        self.latency_frames.unwrap_or(self.sample_rate / 15)
    }

    /// Device format for this configuration (16-bit stereo).
    pub fn format(&self) -> AudioFormat {
        AudioFormat::stereo_i16(self.sample_rate, self.buffer_frames())
    }
}

impl Config {
    /// Check that every value is usable before a session is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let audio = &self.audio;
        if audio.sample_rate == 0 || audio.sample_rate > MAX_SAMPLE_RATE {
            return Err(invalid(
                "audio.sample_rate",
                format!("must be in 1..={}", MAX_SAMPLE_RATE),
            ));
        }
        if audio.buffer_frames() == 0 || audio.buffer_frames() > MAX_BUFFER_FRAMES {
            return Err(invalid(
                "audio.buffer_frames",
                format!("must be in 1..={}", MAX_BUFFER_FRAMES),
            ));
        }
        if audio.latency_frames() == 0 {
            return Err(invalid("audio.latency_frames", "must be at least one frame"));
        }
        if audio.latency_frames() >= audio.buffer_frames() {
            return Err(invalid(
                "audio.latency_frames",
                format!(
                    "{} frames does not fit in a ring of {} frames",
                    audio.latency_frames(),
                    audio.buffer_frames()
                ),
            ));
        }
        if audio.tone_hz == 0 {
            return Err(invalid("audio.tone_hz", "must be greater than zero"));
        }
        let dimensions = 1..=MAX_FRAME_DIMENSION;
        if !dimensions.contains(&self.video.width) || !dimensions.contains(&self.video.height) {
            return Err(invalid(
                "video",
                format!("frame dimensions must be in 1..={}", MAX_FRAME_DIMENSION),
            ));
        }
        if self.timing.target_fps == Some(0) {
            return Err(invalid("timing.target_fps", "must be greater than zero"));
        }
        if !(0.0..1.0).contains(&self.input.stick_deadzone) {
            return Err(invalid("input.stick_deadzone", "must be in 0.0..1.0"));
        }
        Ok(())
    }

    /// Reads a config file, falling back to defaults for missing sections.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the config as pretty TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\ringpace\config`
/// On macOS: `~/Library/Application Support/io.ringpace.ringpace`
/// On Linux: `~/.config/ringpace`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.ringpace", "", "ringpace")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from the platform config directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> Config {
    let Some(path) = config_dir().map(|dir| dir.join("config.toml")) else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }
    match Config::load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{}; using default configuration", e);
            Config::default()
        }
    }
}

/// Saves the configuration to the platform config directory.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    match config_dir() {
        Some(dir) => config.save_to(&dir.join("config.toml")),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.audio.sample_rate, 48_000);
        assert_eq!(config.audio.buffer_frames(), 48_000);
        assert_eq!(config.audio.latency_frames(), 3200);
        assert_eq!(config.audio.tone_hz, 256);
        assert_eq!(config.audio.tone_volume, 3000);
        assert_eq!(config.video.width, 1200);
        assert_eq!(config.video.height, 720);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_format_matches_ring_size() {
        let format = Config::default().audio.format();
        assert_eq!(format.bytes_per_sample(), 4);
        assert_eq!(format.buffer_size_bytes(), 48_000 * 4);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
                [audio]
                tone_hz = 440
            "#,
        )
        .unwrap();
        assert_eq!(config.audio.tone_hz, 440);
        assert_eq!(config.audio.sample_rate, 48_000);
        assert_eq!(config.video, VideoConfig::default());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.audio.latency_frames = Some(1600);
        config.timing.target_fps = Some(30);
        config.video.title = "tone test".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_garbage_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "audio = [[[").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_validate_rejects_latency_beyond_ring() {
        let mut config = Config::default();
        config.audio.latency_frames = Some(48_000);
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "audio.latency_frames",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.audio.sample_rate = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.audio.tone_hz = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.video.height = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timing.target_fps = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_ring_overflowing_byte_cursor() {
        let mut config = Config::default();
        config.audio.buffer_frames = Some(1 << 30);
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "audio.buffer_frames",
                ..
            }
        ));

        config.audio.buffer_frames = Some(MAX_BUFFER_FRAMES);
        assert!(config.validate().is_ok());
        assert_eq!(config.audio.format().buffer_size_bytes(), MAX_BUFFER_FRAMES * 4);
    }

    #[test]
    fn test_validate_rejects_excessive_sample_rate() {
        let mut config = Config::default();
        config.audio.sample_rate = u32::MAX;
        config.audio.buffer_frames = Some(48_000);
        config.audio.latency_frames = Some(3200);
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Invalid {
                field: "audio.sample_rate",
                ..
            }
        ));

        config.audio.sample_rate = MAX_SAMPLE_RATE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_frame() {
        let mut config = Config::default();
        config.video.width = MAX_FRAME_DIMENSION + 1;
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Invalid { field: "video", .. }
        ));

        let mut config = Config::default();
        config.video.height = 100_000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.video.width = MAX_FRAME_DIMENSION;
        config.video.height = MAX_FRAME_DIMENSION;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_latency() {
        let mut config = Config::default();
        config.audio.latency_frames = Some(0);
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Invalid {
                field: "audio.latency_frames",
                ..
            }
        ));

        config.audio.latency_frames = Some(1);
        assert!(config.validate().is_ok());
    }
}
