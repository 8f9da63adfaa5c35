//! Change notifications pushed to other sessions.

use serde::{Deserialize, Serialize};

/// A committed mutation, as seen by everybody except its author.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Who ran the command.
    pub user_name: String,
    /// The raw command line, exactly as submitted.
    pub command_line: String,
}

impl ChangeEvent {
    pub fn new(user_name: impl Into<String>, command_line: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            command_line: command_line.into(),
        }
    }

    /// True when `user_name` is the actor, compared case-insensitively.
    pub fn is_from(&self, user_name: &str) -> bool {
        same_user(&self.user_name, user_name)
    }
}

/// User-name equality used for notification filtering.
pub fn same_user(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
