//! Run orchestration: one snapshot, one provisioning pass, one move per entry.
//!
//! An [`Organizer`] walks through [`RunState`] exactly once. Per-entry
//! failures are counted; only a failure to list the root aborts the run.

use crate::error::OrganizeError;
use crate::event_log::EventSink;
use crate::file_category::CategoryTable;
use crate::file_organizer::{MoveOutcome, Mover};
use crate::provision::{self, ProvisionPolicy};
use crate::skip::{DirectoryEntry, SkipRules};
use chrono::Local;
use indicatif::ProgressBar;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const SEPARATOR_WIDTH: usize = 50;

/// Lifecycle of a run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    NotStarted,
    Scanning,
    Provisioning,
    Processing,
    Summarizing,
    Done,
    /// The root could not be listed.
    Aborted,
}

/// Per-run tally of entry outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub moved: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl RunCounters {
    fn record(&mut self, outcome: &MoveOutcome) {
        match outcome {
            MoveOutcome::Moved { .. } => self.moved += 1,
            MoveOutcome::Skipped { .. } => self.skipped += 1,
            MoveOutcome::Errored { .. } => self.errored += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.moved + self.skipped + self.errored
    }
}

/// Outcome of one snapshot entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub name: String,
    pub outcome: MoveOutcome,
}

/// Everything a finished run reports.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub root: PathBuf,
    #[serde(flatten)]
    pub counters: RunCounters,
    /// Number of entries in the snapshot.
    pub total: usize,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
    pub dry_run: bool,
    pub folders_created: Vec<String>,
    pub folder_failures: Vec<String>,
    pub entries: Vec<EntryReport>,
}

fn serialize_secs<S: serde::Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(duration.as_secs_f64())
}

impl RunSummary {
    /// Outcome recorded for `name`, if it was in the snapshot.
    pub fn outcome_of(&self, name: &str) -> Option<&MoveOutcome> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.outcome)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Organization Summary:")?;
        writeln!(f, "• Files moved: {}", self.counters.moved)?;
        writeln!(f, "• Files skipped: {}", self.counters.skipped)?;
        writeln!(f, "• Errors: {}", self.counters.errored)?;
        write!(f, "• Duration: {:.2} seconds", self.duration.as_secs_f64())
    }
}

/// Options that shape a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub policy: ProvisionPolicy,
    pub dry_run: bool,
}

/// Organizes one root directory, once.
pub struct Organizer<'a> {
    root: PathBuf,
    table: &'a CategoryTable,
    skip: SkipRules,
    options: RunOptions,
    progress: ProgressBar,
    state: RunState,
}

impl<'a> Organizer<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        table: &'a CategoryTable,
        skip: SkipRules,
        options: RunOptions,
    ) -> Self {
        Self {
            root: root.into(),
            table,
            skip,
            options,
            progress: ProgressBar::hidden(),
            state: RunState::NotStarted,
        }
    }

    /// Reports per-entry progress on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(next > self.state, "{:?} -> {:?}", self.state, next);
        tracing::debug!(from = ?self.state, to = ?next, "Run state");
        self.state = next;
    }

    /// Performs the run.
    ///
    /// # Errors
    ///
    /// [`OrganizeError::Scan`] when the root cannot be listed, in which case
    /// nothing was created or moved. [`OrganizeError::AlreadyRun`] when this
    /// organizer was used before.
    pub fn run(&mut self, log: &mut dyn EventSink) -> Result<RunSummary, OrganizeError> {
        if self.state != RunState::NotStarted {
            return Err(OrganizeError::AlreadyRun);
        }

        let started = Instant::now();
        self.advance(RunState::Scanning);

        // Snapshot before the first log write.
        let scanned = self.scan();
        log_header(log, &self.root);
        let snapshot = match scanned {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log.append(&format!("CRITICAL ERROR: {}", e));
                self.advance(RunState::Aborted);
                return Err(e);
            }
        };
        tracing::info!(root = %self.root.display(), entries = snapshot.len(), "Snapshot taken");

        self.advance(RunState::Provisioning);
        let provisioned = if self.options.dry_run {
            provision::ProvisionReport::default()
        } else {
            let readable: Vec<DirectoryEntry> =
                snapshot.iter().filter_map(|e| e.as_ref().ok()).cloned().collect();
            let categories =
                provision::categories_for(self.options.policy, &readable, self.table, &self.skip);
            provision::ensure_category_folders(&self.root, categories, log)
        };

        self.advance(RunState::Processing);
        let mover = Mover::new(self.table, &self.skip).dry_run(self.options.dry_run);
        let mut counters = RunCounters::default();
        let mut entries = Vec::with_capacity(snapshot.len());
        self.progress.set_length(snapshot.len() as u64);

        for item in &snapshot {
            let report = match item {
                Ok(entry) => {
                    self.progress.set_message(entry.name.clone());
                    EntryReport {
                        name: entry.name.clone(),
                        outcome: mover.move_entry(entry, &self.root, log),
                    }
                }
                Err(message) => {
                    log.append(&format!("Failed to read entry: {}", message));
                    EntryReport {
                        name: String::new(),
                        outcome: MoveOutcome::Errored {
                            message: message.clone(),
                        },
                    }
                }
            };
            counters.record(&report.outcome);
            entries.push(report);
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();

        self.advance(RunState::Summarizing);
        let summary = RunSummary {
            root: self.root.clone(),
            counters,
            total: snapshot.len(),
            duration: started.elapsed(),
            dry_run: self.options.dry_run,
            folders_created: provisioned.created,
            folder_failures: provisioned
                .failed
                .into_iter()
                .map(|(category, _)| category)
                .collect(),
            entries,
        };
        log.append(&summary.to_string());
        log.append(&"=".repeat(SEPARATOR_WIDTH));

        self.advance(RunState::Done);
        Ok(summary)
    }

    /// Lists the root once. Unreadable entries are kept as error messages so
    /// they are still counted.
    fn scan(&self) -> Result<Vec<Result<DirectoryEntry, String>>, OrganizeError> {
        let entries = fs::read_dir(&self.root).map_err(|e| OrganizeError::Scan {
            path: self.root.clone(),
            source: e,
        })?;

        Ok(entries
            .map(|entry| {
                entry
                    .map(|entry| DirectoryEntry::from_dir_entry(&entry))
                    .map_err(|e| e.to_string())
            })
            .collect())
    }
}

fn log_header(log: &mut dyn EventSink, root: &Path) {
    log.append(&"=".repeat(SEPARATOR_WIDTH));
    log.append(&format!("Starting file organization in: {}", root.display()));
    log.append(&format!(
        "Start Time: {}",
        Local::now().format(crate::event_log::TIMESTAMP_FORMAT)
    ));
}
