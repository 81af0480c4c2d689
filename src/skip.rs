//! Directory entries and the rules deciding which of them get organized.
//!
//! The fixed rules skip directories, the log file, hidden files (`.` prefix)
//! and temporary files (`~` prefix). Additional glob and regex exclusions can
//! be supplied from the `[skip]` configuration section; both are matched
//! against the entry's base name.

use crate::error::ConfigError;
use glob::Pattern;
use regex::Regex;
use std::ffi::OsStr;
use std::fs::DirEntry;
use std::path::{Path, PathBuf};

/// One entry of the root directory as seen when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Base name, lossily converted to UTF-8. Used for matching and messages only.
    pub name: String,
    /// Whether the entry is (or links to) a directory.
    pub is_dir: bool,
}

impl DirectoryEntry {
    /// Builds an entry from a `read_dir` result.
    pub fn from_dir_entry(entry: &DirEntry) -> Self {
        let path = entry.path();
        // Follows symlinks so a link to a directory counts as a directory.
        let is_dir = path.is_dir()
            || entry
                .file_type()
                .map(|file_type| file_type.is_dir())
                .unwrap_or(false);
        Self {
            name: entry.file_name().to_string_lossy().to_string(),
            path,
            is_dir,
        }
    }

    /// Base name exactly as the filesystem reported it.
    pub fn file_name(&self) -> &OsStr {
        self.path
            .file_name()
            .unwrap_or_else(|| OsStr::new(&self.name))
    }

    /// Substring after the final `.` of the base name, if there is a `.` at all.
    ///
    /// ```
    /// use dirsort::skip::DirectoryEntry;
    /// use std::path::PathBuf;
    ///
    /// let entry = DirectoryEntry { path: PathBuf::from("a.tar.gz"), name: "a.tar.gz".into(), is_dir: false };
    /// assert_eq!(entry.extension(), Some("gz"));
    /// ```
    pub fn extension(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(_, ext)| ext)
    }
}

/// User-supplied exclusions on top of the fixed rules.
#[derive(Debug, Clone, Default)]
pub struct ExtraExclusions {
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl ExtraExclusions {
    /// Compiles glob and regex exclusions.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first pattern that fails to compile.
    pub fn compile(patterns: &[String], regexes: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = regexes
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns, regexes })
    }

    fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(name))
            || self.regexes.iter().any(|regex| regex.is_match(name))
    }
}

/// Decides whether a directory entry is eligible for organization.
#[derive(Debug, Clone)]
pub struct SkipRules {
    log_file_name: Option<String>,
    extra: ExtraExclusions,
}

impl SkipRules {
    /// Rules that protect the log file at `log_file`.
    pub fn new(log_file: &Path) -> Self {
        Self {
            log_file_name: log_file
                .file_name()
                .map(|n| n.to_string_lossy().to_string()),
            extra: ExtraExclusions::default(),
        }
    }

    /// Adds user exclusions.
    pub fn with_exclusions(mut self, extra: ExtraExclusions) -> Self {
        self.extra = extra;
        self
    }

    /// Returns true if the entry must be left where it is.
    pub fn should_skip(&self, entry: &DirectoryEntry) -> bool {
        entry.is_dir
            || self.log_file_name.as_deref() == Some(entry.name.as_str())
            || entry.name.starts_with('.')
            || entry.name.starts_with('~')
            || self.extra.matches(&entry.name)
    }
}
