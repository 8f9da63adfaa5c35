//! Session metadata.
//!
//! A `SessionInfo` records that a user connected and was issued a token.
//! Runtime state (current directory, notification outbox) lives in the
//! kernel's session manager, not here.

use serde::{Deserialize, Serialize};

use crate::ids::SessionToken;

/// Birth certificate for a live session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// User name as supplied on connect.
    pub user_name: String,
    /// Token issued for this session.
    pub token: SessionToken,
    /// When the session was created (Unix millis).
    pub connected_at: u64,
}

impl SessionInfo {
    /// Create a record for a fresh session with a new token.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            token: SessionToken::new(),
            connected_at: crate::now_millis(),
        }
    }

    /// True when both the user name and the token match exactly.
    pub fn matches(&self, user_name: &str, token: &SessionToken) -> bool {
        self.user_name == user_name && self.token == *token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let s = SessionInfo::new("alice");
        assert_eq!(s.user_name, "alice");
        assert!(s.connected_at > 0);
    }

    #[test]
    fn test_matches_is_exact() {
        let s = SessionInfo::new("alice");
        assert!(s.matches("alice", &s.token));
        assert!(!s.matches("Alice", &s.token));
        assert!(!s.matches("alice", &SessionToken::new()));
    }

    #[test]
    fn test_unique_tokens() {
        let a = SessionInfo::new("alice");
        let b = SessionInfo::new("alice");
        assert_ne!(a.token, b.token);
    }
}
