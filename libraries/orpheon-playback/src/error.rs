//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// None of these are fatal to the hosting application: the controller logs
/// them and degrades (paused transport, in-memory state, dropped stats).
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The engine has no source attached
    #[error("No source loaded")]
    NoSourceLoaded,

    /// The platform refused to start playback (autoplay policy, network error)
    #[error("Playback rejected: {0}")]
    PlayRejected(String),

    /// Audio engine error
    #[error("Audio engine error: {0}")]
    Engine(String),

    /// Durable storage read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Stats delivery failure
    #[error("Stats reporting failed: {0}")]
    Reporting(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaybackError {
    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a reporting error
    pub fn reporting(msg: impl Into<String>) -> Self {
        Self::Reporting(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
