//! ringpace - Standalone Player
//!
//! Plays a sine tone steered by the left stick while scrolling a generated
//! gradient, keeping the audio ring a fixed latency ahead of playback.
//!
//! # Usage
//!
//! ```bash
//! ringpace
//! ringpace --tone 440 --fps 60
//! ringpace --headless --frames 600 --no-audio
//! ringpace --config ./ringpace.toml
//! ringpace --tone 330 --save-config
//! ```
//!
//! # Keyboard Shortcuts
//!
//! - WASD: Left stick
//! - ESC / Alt+F4: Quit

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ringpace_core::Config;
use ringpace_player::{HostMode, PlayerConfig, run};

#[derive(Parser, Debug)]
#[command(name = "ringpace")]
#[command(
    author,
    version,
    about = "ringpace - audio ring-buffer and frame pacing player"
)]
struct Args {
    /// Config file to use instead of the platform config directory
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Stop after this many frames
    #[arg(long, value_name = "N")]
    frames: Option<u64>,

    /// Do not open an audio device
    #[arg(long)]
    no_audio: bool,

    /// Tone frequency in Hz until a controller steers it
    #[arg(long, value_name = "HZ")]
    tone: Option<u32>,

    /// Audio latency in sample frames
    #[arg(long, value_name = "SAMPLES")]
    latency: Option<u32>,

    /// Cap the frame rate
    #[arg(long, value_name = "N")]
    fps: Option<u32>,

    /// Generated frame width in pixels
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Generated frame height in pixels
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Write the effective configuration and exit
    #[arg(long)]
    save_config: bool,
}

impl Args {
    /// Overrides config values with whatever was given on the command line.
    fn apply(&self, config: &mut Config) {
        if self.no_audio {
            config.audio.enabled = false;
        }
        if let Some(tone) = self.tone {
            config.audio.tone_hz = tone;
        }
        if let Some(latency) = self.latency {
            config.audio.latency_frames = Some(latency);
        }
        if let Some(fps) = self.fps {
            config.timing.target_fps = Some(fps);
        }
        if let (Some(width), Some(height)) = (self.width, self.height) {
            config.video.width = width;
            config.video.height = height;
        }
    }

    /// Loads the config file, applies overrides and validates the result.
    ///
    /// With `--save-config` a missing `--config` file starts from defaults.
    fn effective_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) if self.save_config && !path.exists() => Config::default(),
            Some(path) => Config::load_from(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ringpace_core::config::load(),
        };
        self.apply(&mut config);
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Writes `config` to the `--config` file, or the platform config directory.
    fn write_config(&self, config: &Config) -> Result<()> {
        match &self.config {
            Some(path) => config
                .save_to(path)
                .with_context(|| format!("Failed to save config {}", path.display())),
            None => ringpace_core::config::save(config).context("Failed to save config"),
        }
    }

    fn player_config(&self) -> Result<PlayerConfig> {
        let config = self.effective_config()?;

        if self.frames == Some(0) {
            anyhow::bail!("Frame count must be greater than zero");
        }

        Ok(PlayerConfig {
            config,
            mode: if self.headless {
                HostMode::Headless
            } else {
                HostMode::Windowed
            },
            max_frames: self.frames,
        })
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.save_config {
        let config = args.effective_config()?;
        args.write_config(&config)?;
        tracing::info!("Configuration saved");
        return Ok(());
    }
    let player = args.player_config()?;

    tracing::info!("Starting ringpace player");
    let summary = run(player)?;

    tracing::info!(
        "Ran {} frames: {:.2}/{:.2}/{:.2}ms min/avg/max",
        summary.frames,
        summary.frame_time.min_ms,
        summary.frame_time.avg_ms,
        summary.frame_time.max_ms
    );
    tracing::info!(
        "Audio: {} frames written, {} skipped ticks; {} present failures",
        summary.audio.frames_written,
        summary.audio.ticks_skipped,
        summary.present_failures
    );
    Ok(())
}
