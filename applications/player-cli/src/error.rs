/// Player CLI error types
use orpheon_core::CoreError;
use orpheon_playback::PlaybackError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid action {0:?}: expected tick:<s>, seek:<s>, volume:<0-1>, queue:<id>, toggle, next or prev")]
    InvalidAction(String),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlayerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }
}
