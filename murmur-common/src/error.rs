//! Common error types for Murmur

use thiserror::Error;

/// Common result type for Murmur operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Murmur crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Platform refused to start audio playback (non-fatal; playback
    /// degrades to a silent fade and bookkeeping continues)
    #[error("Playback unavailable: {0}")]
    PlaybackUnavailable(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
