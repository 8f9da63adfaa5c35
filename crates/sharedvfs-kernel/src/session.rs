//! Live session registry.
//!
//! Sessions are keyed by the exact user name. Token checks go through the
//! `DashMap` only and never touch the namespace tree lock.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sharedvfs_types::{SessionInfo, SessionToken, same_user};

use crate::config::DEFAULT_NOTIFICATION_CAPACITY;
use crate::error::{VfsError, VfsResult};
use crate::flows::{self, Outbox, Subscription};

#[derive(Debug)]
struct Session {
    info: SessionInfo,
    current_dir: String,
    outbox: Outbox,
}

/// What a successful connect hands back.
#[derive(Debug)]
pub struct Connection {
    pub info: SessionInfo,
    /// Live sessions including this one.
    pub total_sessions: usize,
    /// Change events addressed to this session.
    pub subscription: Subscription,
}

/// Issues, validates, and revokes session tokens.
#[derive(Debug)]
pub struct SessionManager {
    sessions: DashMap<String, Session>,
    initial_dir: String,
    outbox_capacity: usize,
}

impl SessionManager {
    /// `initial_dir` is the current directory given to new sessions.
    pub fn new(initial_dir: impl Into<String>) -> Self {
        Self {
            sessions: DashMap::new(),
            initial_dir: initial_dir.into(),
            outbox_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }

    /// Bound the notification outbox of sessions opened from now on.
    pub fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity;
        self
    }

    /// Open a session for `user_name`. One live session per name.
    pub fn connect(&self, user_name: &str) -> VfsResult<Connection> {
        if user_name.trim().is_empty() {
            return Err(VfsError::invalid_name("User name must not be empty."));
        }

        let (outbox, subscription) = flows::outbox(self.outbox_capacity);
        let info = match self.sessions.entry(user_name.to_string()) {
            Entry::Occupied(_) => {
                return Err(VfsError::already_connected(format!(
                    "User '{user_name}' is already connected."
                )));
            }
            Entry::Vacant(slot) => {
                let info = SessionInfo::new(user_name);
                slot.insert(Session {
                    info: info.clone(),
                    current_dir: self.initial_dir.clone(),
                    outbox,
                });
                info
            }
        };

        let total_sessions = self.sessions.len();
        tracing::info!(user = %user_name, token = %info.token.short(), total_sessions, "session opened");
        Ok(Connection {
            info,
            total_sessions,
            subscription,
        })
    }

    /// Succeeds only when a live session matches both fields exactly.
    pub fn authenticate(&self, user_name: &str, token: &SessionToken) -> VfsResult<()> {
        match self.sessions.get(user_name) {
            Some(session) if session.info.matches(user_name, token) => Ok(()),
            _ => Err(invalid_session(user_name)),
        }
    }

    /// Authenticate, then close the session.
    pub fn disconnect(&self, user_name: &str, token: &SessionToken) -> VfsResult<()> {
        let removed = self
            .sessions
            .remove_if(user_name, |_, session| session.info.token == *token);
        match removed {
            Some(_) => {
                tracing::info!(user = %user_name, "session closed");
                Ok(())
            }
            None => Err(invalid_session(user_name)),
        }
    }

    /// Drop a session whose transport went away. A newer session under the
    /// same name (different token) is left alone. Returns whether one was removed.
    pub fn invalidate(&self, user_name: &str, token: &SessionToken) -> bool {
        let removed = self
            .sessions
            .remove_if(user_name, |_, session| session.info.token == *token)
            .is_some();
        if removed {
            tracing::warn!(user = %user_name, "session invalidated");
        }
        removed
    }

    /// The session's current directory.
    pub fn current_directory(&self, user_name: &str, token: &SessionToken) -> VfsResult<String> {
        match self.sessions.get(user_name) {
            Some(session) if session.info.token == *token => Ok(session.current_dir.clone()),
            _ => Err(invalid_session(user_name)),
        }
    }

    pub fn set_current_directory(
        &self,
        user_name: &str,
        token: &SessionToken,
        dir: impl Into<String>,
    ) -> VfsResult<()> {
        match self.sessions.get_mut(user_name) {
            Some(mut session) if session.info.token == *token => {
                session.current_dir = dir.into();
                Ok(())
            }
            _ => Err(invalid_session(user_name)),
        }
    }

    /// Snapshot of every outbox whose owner is not `actor`.
    pub(crate) fn outboxes_except(&self, actor: &str) -> Vec<(String, Outbox)> {
        self.sessions
            .iter()
            .filter(|entry| !same_user(entry.key(), actor))
            .map(|entry| (entry.key().clone(), entry.outbox.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn invalid_session(user_name: &str) -> VfsError {
    VfsError::invalid_session(format!("No valid session for user '{user_name}'."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_issues_token() {
        let sessions = SessionManager::new("C:");
        let conn = sessions.connect("alice").unwrap();
        assert_eq!(conn.info.user_name, "alice");
        assert_eq!(conn.total_sessions, 1);
        assert!(sessions.authenticate("alice", &conn.info.token).is_ok());
    }

    #[test]
    fn test_second_connect_rejected() {
        let sessions = SessionManager::new("C:");
        let _first = sessions.connect("alice").unwrap();
        let err = sessions.connect("alice").unwrap_err();
        assert!(matches!(err, VfsError::AlreadyConnected(_)));
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_reconnect_after_disconnect_gets_new_token() {
        let sessions = SessionManager::new("C:");
        let first = sessions.connect("alice").unwrap();
        sessions.disconnect("alice", &first.info.token).unwrap();
        assert!(sessions.is_empty());

        let second = sessions.connect("alice").unwrap();
        assert_ne!(first.info.token, second.info.token);
        assert!(matches!(
            sessions.authenticate("alice", &first.info.token),
            Err(VfsError::InvalidSession(_))
        ));
    }

    #[test]
    fn test_authenticate_is_exact() {
        let sessions = SessionManager::new("C:");
        let conn = sessions.connect("alice").unwrap();
        assert!(sessions.authenticate("Alice", &conn.info.token).is_err());
        assert!(sessions.authenticate("alice", &SessionToken::new()).is_err());
        assert!(sessions.authenticate("bob", &conn.info.token).is_err());
    }

    #[test]
    fn test_disconnect_with_wrong_token_keeps_session() {
        let sessions = SessionManager::new("C:");
        let conn = sessions.connect("alice").unwrap();
        let err = sessions.disconnect("alice", &SessionToken::new()).unwrap_err();
        assert!(matches!(err, VfsError::InvalidSession(_)));
        assert!(sessions.authenticate("alice", &conn.info.token).is_ok());
    }

    #[test]
    fn test_invalidate_ignores_newer_session() {
        let sessions = SessionManager::new("C:");
        let old = sessions.connect("alice").unwrap();
        sessions.disconnect("alice", &old.info.token).unwrap();
        let new = sessions.connect("alice").unwrap();

        assert!(!sessions.invalidate("alice", &old.info.token));
        assert!(sessions.authenticate("alice", &new.info.token).is_ok());
        assert!(sessions.invalidate("alice", &new.info.token));
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_current_directory_per_session() {
        let sessions = SessionManager::new("C:");
        let alice = sessions.connect("alice").unwrap();
        let bob = sessions.connect("bob").unwrap();

        sessions
            .set_current_directory("alice", &alice.info.token, "C:\\docs")
            .unwrap();
        assert_eq!(
            sessions.current_directory("alice", &alice.info.token).unwrap(),
            "C:\\docs"
        );
        assert_eq!(sessions.current_directory("bob", &bob.info.token).unwrap(), "C:");
    }

    #[test]
    fn test_empty_user_name_rejected() {
        let sessions = SessionManager::new("C:");
        assert!(matches!(sessions.connect("  "), Err(VfsError::InvalidName(_))));
    }
}
