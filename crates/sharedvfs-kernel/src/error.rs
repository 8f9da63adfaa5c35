//! Kernel error types.

use sharedvfs_types::ErrorKind;
use thiserror::Error;

/// Domain error type.
///
/// Every variant carries a one-line message suitable for showing to the
/// user as-is. A failed tree operation leaves the tree untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    /// A supplied name fails length or character validation.
    #[error("{0}")]
    InvalidName(String),

    /// An intermediate or final path segment does not resolve.
    #[error("{0}")]
    PathNotFound(String),

    /// Expected a volume or directory.
    #[error("{0}")]
    NotADirectory(String),

    /// Expected a file.
    #[error("{0}")]
    NotAFile(String),

    /// A sibling with the same name (ignoring case) exists.
    #[error("{0}")]
    DuplicateName(String),

    /// One or more files involved are locked.
    #[error("{0}")]
    LockedContent(String),

    /// Structurally nonsensical request.
    #[error("{0}")]
    InvalidOperation(String),

    /// Empty or unparsable command line.
    #[error("{0}")]
    InvalidCommand(String),

    /// The user name already has a live session.
    #[error("{0}")]
    AlreadyConnected(String),

    /// No live session matches the supplied credentials.
    #[error("{0}")]
    InvalidSession(String),
}

impl VfsError {
    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Self::InvalidName(msg.into())
    }

    pub fn path_not_found(msg: impl Into<String>) -> Self {
        Self::PathNotFound(msg.into())
    }

    pub fn not_a_directory(msg: impl Into<String>) -> Self {
        Self::NotADirectory(msg.into())
    }

    pub fn not_a_file(msg: impl Into<String>) -> Self {
        Self::NotAFile(msg.into())
    }

    pub fn duplicate_name(msg: impl Into<String>) -> Self {
        Self::DuplicateName(msg.into())
    }

    pub fn locked_content(msg: impl Into<String>) -> Self {
        Self::LockedContent(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn invalid_command(msg: impl Into<String>) -> Self {
        Self::InvalidCommand(msg.into())
    }

    pub fn already_connected(msg: impl Into<String>) -> Self {
        Self::AlreadyConnected(msg.into())
    }

    pub fn invalid_session(msg: impl Into<String>) -> Self {
        Self::InvalidSession(msg.into())
    }

    /// Wire classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName(_) => ErrorKind::InvalidName,
            Self::PathNotFound(_) => ErrorKind::PathNotFound,
            Self::NotADirectory(_) => ErrorKind::NotADirectory,
            Self::NotAFile(_) => ErrorKind::NotAFile,
            Self::DuplicateName(_) => ErrorKind::DuplicateName,
            Self::LockedContent(_) => ErrorKind::LockedContent,
            Self::InvalidOperation(_) => ErrorKind::InvalidOperation,
            Self::InvalidCommand(_) => ErrorKind::InvalidCommand,
            Self::AlreadyConnected(_) => ErrorKind::AlreadyConnected,
            Self::InvalidSession(_) => ErrorKind::InvalidSession,
        }
    }
}

/// Kernel result type.
pub type VfsResult<T> = Result<T, VfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message() {
        let e = VfsError::path_not_found("Destination path does not exist.");
        assert_eq!(e.to_string(), "Destination path does not exist.");
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(VfsError::locked_content("locked").kind(), ErrorKind::LockedContent);
        assert_eq!(VfsError::invalid_session("gone").kind(), ErrorKind::InvalidSession);
    }
}
