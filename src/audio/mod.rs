//! Alarm sound backends.
//!
//! Two ways of making noise sit behind [`AudioBackend`]: a WAV asset played
//! through the output device ([`FileBackend`]) and a synthesized siren
//! ([`SynthesizedBackend`]). Both render through the same lazily opened
//! [`SharedOutput`].

pub mod file;
pub mod generate;
pub mod output;
pub mod siren;

pub use file::FileBackend;
pub use output::SharedOutput;
pub use siren::{SirenConfig, SynthesizedBackend};

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from starting alarm playback.
#[derive(Debug, Error)]
pub enum AudioError {
    /// No alarm asset configured
    #[error("no alarm sound configured")]
    NoAsset,

    /// Asset missing or not decodable
    #[error("cannot read alarm sound {path}: {reason}")]
    Asset { path: PathBuf, reason: String },

    /// Asset format we cannot play
    #[error("unsupported alarm sound {0} (expected .wav)")]
    Unsupported(PathBuf),

    /// No output device on this host
    #[error("no audio output device found")]
    NoDevice,

    /// Failed to query the device configuration
    #[error("failed to get output config: {0}")]
    DeviceConfig(String),

    /// Failed to build the output stream
    #[error("failed to build audio stream: {0}")]
    StreamBuild(String),

    /// Failed to start the output stream
    #[error("failed to start audio stream: {0}")]
    StreamPlay(String),
}

/// Which backend is producing the alarm sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    File,
    Synthesized,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::File => f.write_str("file"),
            BackendKind::Synthesized => f.write_str("synthesized"),
        }
    }
}

/// A source of alarm sound.
///
/// `start` must be a no-op while already running and `stop` must be safe to
/// call at any time.
pub trait AudioBackend {
    fn kind(&self) -> BackendKind;
    fn start(&mut self) -> Result<(), AudioError>;
    fn stop(&mut self);
}
