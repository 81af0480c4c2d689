/// Moving single files into their category folders.
///
/// A [`Mover`] classifies one directory entry, picks a destination inside
/// `root/<category>` that does not clobber an existing file, and moves the
/// file there. Every outcome is returned as a [`MoveOutcome`]; filesystem
/// errors never escape.
use crate::error::MoveError;
use crate::event_log::EventSink;
use crate::file_category::CategoryTable;
use crate::skip::{DirectoryEntry, SkipRules};
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Suffix inserted before the extension when the destination name is taken.
pub const COPY_SUFFIX: &str = "_copy";

/// Highest numbered `_copyN` candidate tried before giving up.
pub const MAX_COPY_INDEX: u32 = 9_999;

/// Why an entry was left in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Directory, hidden, temporary, log file or user-excluded.
    Filtered,
    /// The base name has no `.`.
    NoExtension,
}

/// Result of handling one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum MoveOutcome {
    Moved {
        destination: PathBuf,
        category: String,
    },
    Skipped {
        reason: SkipReason,
    },
    Errored {
        message: String,
    },
}

/// Classifies and moves entries of one root directory.
#[derive(Debug, Clone, Copy)]
pub struct Mover<'a> {
    table: &'a CategoryTable,
    skip: &'a SkipRules,
    dry_run: bool,
}

impl<'a> Mover<'a> {
    pub fn new(table: &'a CategoryTable, skip: &'a SkipRules) -> Self {
        Self {
            table,
            skip,
            dry_run: false,
        }
    }

    /// Reports and logs what would happen without touching the filesystem.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Moves `entry` into its category folder under `root`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::event_log::MemoryLog;
    /// use dirsort::file_category::CategoryTable;
    /// use dirsort::file_organizer::{MoveOutcome, Mover};
    /// use dirsort::skip::SkipRules;
    /// use std::path::Path;
    ///
    /// let table = CategoryTable::standard();
    /// let skip = SkipRules::new(Path::new("organizer.log"));
    /// let mut log = MemoryLog::new();
    /// let entries = std::fs::read_dir("/tmp/inbox").unwrap();
    /// for entry in entries.flatten() {
    ///     let entry = dirsort::skip::DirectoryEntry::from_dir_entry(&entry);
    ///     let outcome = Mover::new(&table, &skip).move_entry(&entry, Path::new("/tmp/inbox"), &mut log);
    ///     if let MoveOutcome::Moved { destination, .. } = outcome {
    ///         println!("{}", destination.display());
    ///     }
    /// }
    /// ```
    pub fn move_entry(
        &self,
        entry: &DirectoryEntry,
        root: &Path,
        log: &mut dyn EventSink,
    ) -> MoveOutcome {
        if self.skip.should_skip(entry) {
            tracing::debug!(name = %entry.name, "Filtered");
            return MoveOutcome::Skipped {
                reason: SkipReason::Filtered,
            };
        }

        let Some(extension) = entry.extension() else {
            log.append(&format!("No extension: {}", entry.name));
            return MoveOutcome::Skipped {
                reason: SkipReason::NoExtension,
            };
        };

        let category = self.table.resolve(extension);
        let folder = root.join(category);

        if self.dry_run {
            let destination = free_destination(&folder, entry.file_name());
            log.append(&format!(
                "Dry-run: Would move {} → {}/",
                entry.name, category
            ));
            return MoveOutcome::Moved {
                destination,
                category: category.to_string(),
            };
        }

        match move_into(&entry.path, &folder, entry.file_name()) {
            Ok(destination) => {
                log.append(&format!("Moved: {} → {}/", entry.name, category));
                if let Some(new_name) = destination.file_name()
                    && new_name != entry.file_name()
                {
                    log.append(&format!(
                        "Renamed to avoid collision: {} → {}",
                        entry.name,
                        new_name.to_string_lossy()
                    ));
                }
                MoveOutcome::Moved {
                    destination,
                    category: category.to_string(),
                }
            }
            Err(e) => {
                log.append(&format!("Failed to move {}: {}", entry.name, e));
                log.append(&format!("Details: {}", error_chain(&e)));
                MoveOutcome::Errored {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Name for the `attempt`-th destination candidate.
///
/// `0` is the name itself, `1` inserts `_copy` before the extension, and
/// `n > 1` inserts `_copy<n>`. A name without an extension (or ending in a
/// bare `.`) gets the suffix appended.
pub fn candidate_name(name: &OsStr, attempt: u32) -> OsString {
    if attempt == 0 {
        return name.to_os_string();
    }
    let suffix = if attempt == 1 {
        COPY_SUFFIX.to_string()
    } else {
        format!("{}{}", COPY_SUFFIX, attempt)
    };
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) if !ext.is_empty() => {
            let mut candidate = stem.to_os_string();
            candidate.push(&suffix);
            candidate.push(".");
            candidate.push(ext);
            candidate
        }
        _ => {
            let mut candidate = name.to_os_string();
            candidate.push(&suffix);
            candidate
        }
    }
}

/// First candidate that does not exist yet. Does not claim it.
fn free_destination(folder: &Path, name: &OsStr) -> PathBuf {
    (0..=MAX_COPY_INDEX)
        .map(|attempt| folder.join(candidate_name(name, attempt)))
        .find(|path| !path.exists())
        .unwrap_or_else(|| folder.join(name))
}

/// Claims a free destination by exclusively creating an empty placeholder.
///
/// The placeholder is only held across a single `rename`; a cross-device
/// move releases it and claims again once the data is staged.
fn claim_destination(source: &Path, folder: &Path, name: &OsStr) -> Result<PathBuf, MoveError> {
    for attempt in 0..=MAX_COPY_INDEX {
        let candidate = folder.join(candidate_name(name, attempt));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(MoveError::Io {
                    from: source.to_path_buf(),
                    to: candidate,
                    source: e,
                });
            }
        }
    }
    Err(MoveError::NoFreeName {
        name: name.to_string_lossy().to_string(),
        folder: folder.to_path_buf(),
    })
}

/// Moves `source` into `folder` under `name` (or a `_copy` variant of it),
/// returning the final path.
pub fn move_into(source: &Path, folder: &Path, name: &OsStr) -> Result<PathBuf, MoveError> {
    let destination = claim_destination(source, folder, name)?;

    match fs::rename(source, &destination) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            tracing::debug!(error = %e, "Rename crosses devices, copying instead");
            let _ = fs::remove_file(&destination);
            return copy_across(source, folder, name);
        }
        Err(e) => {
            // Only our own placeholder can be there.
            let _ = fs::remove_file(&destination);
            return Err(MoveError::Io {
                from: source.to_path_buf(),
                to: destination,
                source: e,
            });
        }
    }

    tracing::debug!(from = %source.display(), to = %destination.display(), "Moved file");
    Ok(destination)
}

/// Hidden sibling that receives the data of a cross-device copy.
fn staging_path(folder: &Path, name: &OsStr) -> PathBuf {
    let mut staging = OsString::from(".");
    staging.push(name);
    staging.push(".partial");
    folder.join(staging)
}

/// Copies `source` into a staging file and syncs it. The staging file is
/// removed again on failure.
fn stage_copy(source: &Path, staging: &Path) -> std::io::Result<()> {
    let staged = fs::copy(source, staging).and_then(|_| File::open(staging)?.sync_all());
    if staged.is_err() {
        let _ = fs::remove_file(staging);
    }
    staged
}

/// Copies, claims a destination, renames the staged copy onto it and removes
/// the source. The destination never holds a partial file.
fn copy_across(source: &Path, folder: &Path, name: &OsStr) -> Result<PathBuf, MoveError> {
    let staging = staging_path(folder, name);
    stage_copy(source, &staging).map_err(|e| MoveError::Io {
        from: source.to_path_buf(),
        to: staging.clone(),
        source: e,
    })?;

    let destination = claim_destination(source, folder, name).inspect_err(|_| {
        let _ = fs::remove_file(&staging);
    })?;

    if let Err(e) = fs::rename(&staging, &destination) {
        let _ = fs::remove_file(&staging);
        let _ = fs::remove_file(&destination);
        return Err(MoveError::Io {
            from: source.to_path_buf(),
            to: destination,
            source: e,
        });
    }

    fs::remove_file(source).map_err(|e| MoveError::Io {
        from: source.to_path_buf(),
        to: destination.clone(),
        source: e,
    })?;

    tracing::debug!(from = %source.display(), to = %destination.display(), "Copied file across devices");
    Ok(destination)
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(": caused by: ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
