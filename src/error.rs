use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring or hosting the wheel.
#[derive(Debug, Error)]
pub enum WheelError {
    #[error("invalid wheel configuration: {0}")]
    Configuration(String),

    #[error("state store at {path} is unavailable: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state store at {path} is malformed: {reason}")]
    StoreFormat { path: PathBuf, reason: String },

    #[error("could not load font from {path}: {reason}")]
    Font { path: PathBuf, reason: String },

    #[error("window error: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("render surface error: {0}")]
    Surface(#[from] pixels::Error),

    #[error("surface resize failed: {0}")]
    Resize(#[from] pixels::TextureError),
}

pub type Result<T> = std::result::Result<T, WheelError>;
