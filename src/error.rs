//! Error types for Smriti

use std::path::PathBuf;

use crate::codec::DecodeError;
use crate::io::ReadError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Smriti error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration could not be written
    #[error("Configuration serialization error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Named option is unknown or its value is malformed
    #[error("Invalid option '{name}': {reason}")]
    InvalidOption {
        /// Option name as given
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Playback source could not be opened
    #[error("Playback source {path} unavailable: {source}")]
    SourceUnavailable {
        /// Path of the capture
        path: PathBuf,
        /// Underlying open failure
        source: std::io::Error,
    },

    /// Recording sink could not be opened
    #[error("Recording sink {path} unavailable: {source}")]
    SinkUnavailable {
        /// Path of the capture
        path: PathBuf,
        /// Underlying open failure
        source: std::io::Error,
    },

    /// Reading the underlying stream failed
    #[error("Stream error: {0}")]
    Stream(#[from] ReadError),

    /// Line could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Line references a device that was never declared
    #[error("Unknown device '{name}' on line {line}")]
    UnknownDevice {
        /// Device name from the line
        name: String,
        /// Line number in the capture
        line: u64,
    },

    /// Pipeline rejected a device configuration blob
    #[error("Configuration for device '{device}' rejected: {reason}")]
    ConfigIngest {
        /// Device whose configuration was rejected
        device: String,
        /// Reason reported by the pipeline
        reason: String,
    },
}
