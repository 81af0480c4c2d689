//! Error types shared across the organization pipeline.
//!
//! Only [`OrganizeError`] ever escapes a run. Per-file failures are carried as
//! [`MoveError`] values inside a [`crate::file_organizer::MoveOutcome`] and are
//! counted, never propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run before or instead of producing a summary.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The root directory itself could not be listed.
    #[error("Cannot read directory {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The organizer instance was already used for a run.
    #[error("This organizer has already completed a run")]
    AlreadyRun,
}

/// Failures of a single file move. Never fatal to the run.
#[derive(Debug, Error)]
pub enum MoveError {
    /// The underlying filesystem operation failed.
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Every candidate destination name is already taken.
    #[error("No free destination name for {name} in {}", folder.display())]
    NoFreeName { name: String, folder: PathBuf },
}

/// Errors raised while loading configuration or building a category table.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern in the `[skip]` section.
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern in the `[skip]` section.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// Why it failed.
        reason: String,
    },
    /// A category name that cannot be used as a folder name.
    #[error("Invalid category name '{0}'")]
    InvalidCategoryName(String),
    /// An extension that is empty once normalized.
    #[error("Empty extension listed under category '{0}'")]
    EmptyExtension(String),
    /// One extension assigned to two categories.
    #[error("Extension '{extension}' is listed under both '{first}' and '{second}'")]
    DuplicateExtension {
        extension: String,
        first: String,
        second: String,
    },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}
