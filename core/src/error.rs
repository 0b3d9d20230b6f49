//! Error types shared by the core and its device collaborators
//!
//! Device errors are classified so the loop can tell an initialization
//! failure (degrade to a null device, log once) from a transient one
//! (skip this tick, retry on the next).

use std::path::PathBuf;

/// Failure reported by an audio device at its boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// No device, or the device could not be opened with the session format
    #[error("audio device unavailable: {0}")]
    Unavailable(String),

    /// The device could not report its play/write cursors this tick
    #[error("playback position unavailable: {0}")]
    PositionUnavailable(String),

    /// The requested byte window could not be locked
    #[error("failed to lock {len} bytes at offset {offset}: {reason}")]
    LockFailed {
        offset: u32,
        len: u32,
        reason: String,
    },

    /// Committing previously locked regions failed; nothing was written
    #[error("failed to unlock regions: {0}")]
    UnlockFailed(String),

    /// Starting playback failed
    #[error("failed to start playback: {0}")]
    PlayFailed(String),
}

impl DeviceError {
    /// Whether the failure is expected to clear up on a later tick.
    ///
    /// Transient failures only skip the current write; everything else means
    /// the device should be treated as absent.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::PositionUnavailable(_) | Self::LockFailed { .. } | Self::UnlockFailed(_)
        )
    }
}

/// Failure while presenting a frame to the host window.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresentError {
    /// The presentation surface is gone or not yet created
    #[error("presentation surface lost")]
    SurfaceLost,

    /// Frame dimensions do not match what the presenter was built for
    #[error("frame is {width}x{height}, expected {expected_width}x{expected_height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    /// Backend-specific failure
    #[error("present failed: {0}")]
    Backend(String),
}

/// Failure while loading, saving or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
