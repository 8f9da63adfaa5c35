//! Session tokens.
//!
//! A token wraps a UUIDv7 but is opaque to everyone except the session
//! manager: clients store it and echo it back, nothing else. It displays as
//! standard UUID text for logging; `short()` (first 8 hex chars) is for
//! human-facing output only and never used as a lookup key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque credential issued on connect (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(uuid::Uuid);

/// A string that is not a valid token.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid session token: {0}")]
pub struct TokenParseError(String);

impl SessionToken {
    /// Issue a fresh token.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// First 8 hex characters, for display only.
    pub fn short(&self) -> String {
        self.0.as_simple().to_string()[..8].to_string()
    }

    /// Parse from a hex string (32 chars, no hyphens) or standard UUID format.
    pub fn parse(s: &str) -> Result<Self, TokenParseError> {
        uuid::Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| TokenParseError(s.to_string()))
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for SessionToken {
    type Err = TokenParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({})", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_tokens() {
        let a = SessionToken::new();
        let b = SessionToken::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_parse() {
        let token = SessionToken::new();
        let parsed: SessionToken = token.to_string().parse().unwrap();
        assert_eq!(token, parsed);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(SessionToken::parse("not-a-token").is_err());
    }

    #[test]
    fn test_short() {
        assert_eq!(SessionToken::new().short().len(), 8);
    }

    #[test]
    fn test_json_is_plain_string() {
        let token = SessionToken::new();
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, format!("\"{token}\""));
    }
}
