//! Path string handling.
//!
//! Pure functions over path strings: absolute/relative classification,
//! combining, splitting, and name validation. Nothing here touches the
//! tree, so the same resolver serves the tree engine, the console, and
//! tests.
//!
//! A path is absolute when it starts with a volume name (`C:\docs`).
//! Separators are interchangeable (`C:/docs` is the same path); the first
//! configured separator is used when joining.

use crate::config::VfsConfig;
use crate::error::{VfsError, VfsResult};

/// Stateless path helper built from a [`VfsConfig`].
#[derive(Debug, Clone)]
pub struct PathResolver {
    volumes: Vec<String>,
    separators: Vec<char>,
    primary_separator: char,
    max_name_length: usize,
    invalid_name_chars: Vec<char>,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(&VfsConfig::default())
    }
}

impl PathResolver {
    pub fn new(config: &VfsConfig) -> Self {
        let primary_separator = config.primary_separator();
        let mut separators = config.separators.clone();
        if separators.is_empty() {
            separators.push(primary_separator);
        }
        Self {
            volumes: config.effective_volumes(),
            separators,
            primary_separator,
            max_name_length: config.max_name_length,
            invalid_name_chars: config.invalid_name_chars.chars().collect(),
        }
    }

    /// Whether `c` is one of the configured separators.
    pub fn is_separator(&self, c: char) -> bool {
        self.separators.contains(&c)
    }

    /// True iff `path` starts with a volume name (ASCII case ignored).
    pub fn is_absolute(&self, path: &str) -> bool {
        self.volumes.iter().any(|volume| {
            path.get(..volume.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(volume))
        })
    }

    /// Join `relative` onto `base` with exactly one separator.
    ///
    /// An absolute `relative` is returned as-is (trimmed). Empty on both
    /// sides yields an empty string.
    pub fn combine(&self, base: &str, relative: &str) -> String {
        let relative = relative
            .trim()
            .trim_start_matches(|c: char| self.is_separator(c));
        if self.is_absolute(relative) {
            return relative.to_string();
        }

        let base = base.trim().trim_end_matches(|c: char| self.is_separator(c));

        match (base.is_empty(), relative.is_empty()) {
            (true, true) => String::new(),
            (true, false) => relative.to_string(),
            (false, true) => base.to_string(),
            (false, false) => format!("{base}{}{relative}", self.primary_separator),
        }
    }

    /// Non-empty, non-whitespace segments between separators.
    pub fn split<'a>(&self, path: &'a str) -> Vec<&'a str> {
        path.split(|c: char| self.is_separator(c))
            .filter(|segment| !segment.trim().is_empty())
            .collect()
    }

    /// Join segments with the primary separator.
    pub fn join<S: AsRef<str>>(&self, segments: &[S]) -> String {
        let mut out = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                out.push(self.primary_separator);
            }
            out.push_str(segment.as_ref());
        }
        out
    }

    /// Validate a directory or file name against the configured limits.
    pub fn validate_name(&self, name: &str) -> VfsResult<()> {
        self.validate_name_with(name, self.max_name_length)
    }

    /// Validate a name against an explicit maximum length.
    pub fn validate_name_with(&self, name: &str, max_length: usize) -> VfsResult<()> {
        if name.is_empty() {
            return Err(VfsError::invalid_name("Name cannot be empty."));
        }
        if name.chars().count() > max_length {
            return Err(VfsError::invalid_name(format!(
                "The name '{name}' is longer than {max_length} characters."
            )));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| c.is_control() || self.invalid_name_chars.contains(c))
        {
            return Err(VfsError::invalid_name(format!(
                "The name '{name}' contains the invalid character {bad:?}."
            )));
        }
        Ok(())
    }
}
