//! Namespace configuration.
//!
//! Volume names and separators must be identical on every party that
//! interprets path strings. Defaults model a single drive-style volume.

use serde::{Deserialize, Serialize};

/// Default volume list; the first entry is the default volume.
pub const DEFAULT_VOLUME: &str = "C:";

/// Default name of the synthetic root node.
pub const DEFAULT_ROOT_NAME: &str = "VFS";

/// Default maximum length of a directory or file name.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 255;

/// Characters rejected in names by default, in addition to control chars.
pub const DEFAULT_INVALID_NAME_CHARS: &str = "\\/:*?\"<>|";

/// Default number of undelivered change events a session may hold.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 1024;

/// Namespace tree and path configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VfsConfig {
    /// Name of the synthetic root.
    pub root_name: String,
    /// Whether `print` includes the root line.
    pub show_root: bool,
    /// Volumes created under the root. The first is the default volume.
    pub volumes: Vec<String>,
    /// Accepted path separators. The first is used when joining.
    pub separators: Vec<char>,
    /// Maximum directory/file name length, in characters.
    pub max_name_length: usize,
    /// Characters that may not appear in a directory/file name.
    pub invalid_name_chars: String,
    /// Undelivered change events kept per session. Events published to a
    /// full outbox are dropped for that session.
    pub notification_capacity: usize,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            show_root: false,
            volumes: vec![DEFAULT_VOLUME.to_string()],
            separators: vec!['\\', '/'],
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            invalid_name_chars: DEFAULT_INVALID_NAME_CHARS.to_string(),
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl VfsConfig {
    /// Show the synthetic root in `print` output.
    pub fn with_show_root(mut self, show_root: bool) -> Self {
        self.show_root = show_root;
        self
    }

    /// Replace the volume list.
    pub fn with_volumes<I, S>(mut self, volumes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.volumes = volumes.into_iter().map(Into::into).collect();
        self
    }

    /// Bound each session's notification outbox.
    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }

    /// The default volume path (first configured volume).
    pub fn default_volume(&self) -> &str {
        self.volumes.first().map(String::as_str).unwrap_or(DEFAULT_VOLUME)
    }

    /// Volumes to create. An empty list means the single default volume.
    pub fn effective_volumes(&self) -> Vec<String> {
        if self.volumes.is_empty() {
            vec![DEFAULT_VOLUME.to_string()]
        } else {
            self.volumes.clone()
        }
    }

    /// The separator used when joining segments.
    pub fn primary_separator(&self) -> char {
        self.separators.first().copied().unwrap_or('\\')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VfsConfig::default();
        assert_eq!(config.default_volume(), "C:");
        assert_eq!(config.primary_separator(), '\\');
        assert!(!config.show_root);
    }

    #[test]
    fn test_empty_lists_fall_back() {
        let config = VfsConfig {
            volumes: Vec::new(),
            separators: Vec::new(),
            ..VfsConfig::default()
        };
        assert_eq!(config.default_volume(), DEFAULT_VOLUME);
        assert_eq!(config.effective_volumes(), vec![DEFAULT_VOLUME.to_string()]);
        assert_eq!(config.primary_separator(), '\\');
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: VfsConfig = serde_json::from_str(r#"{"show_root":true}"#).unwrap();
        assert!(config.show_root);
        assert_eq!(config.volumes, vec!["C:".to_string()]);
        assert_eq!(config.notification_capacity, DEFAULT_NOTIFICATION_CAPACITY);
    }
}
