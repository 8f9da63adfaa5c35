//! Server error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from configuration loading and the transport loop.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;
