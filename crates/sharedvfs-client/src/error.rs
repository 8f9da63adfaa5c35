//! Client error types.

use sharedvfs_types::ErrorKind;

/// Errors from the client library.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server rejected the request; `message` is its one-line reason.
    #[error("{message}")]
    Server { kind: ErrorKind, message: String },

    /// A different user is already connected over this client.
    #[error("user '{current}' is still connected")]
    SwitchUser { current: String },

    #[error("no user is connected")]
    NotConnected,

    /// The connection closed or the server did not answer.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    /// The domain error kind, when the server produced this error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Server { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Io(_))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
