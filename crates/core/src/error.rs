//! Error types for liveterm-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Content producer failed: {0}")]
    Producer(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("No tokio runtime available to drive the loop")]
    NoRuntime,

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RenderError>;
