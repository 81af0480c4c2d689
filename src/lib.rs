//! dirsort - sort the files of a directory into category folders
//!
//! This library classifies files by extension, provisions category folders,
//! moves files without clobbering existing ones, and records every action in
//! an append-only log file.

pub mod cli;
pub mod config;
pub mod error;
pub mod event_log;
pub mod file_category;
pub mod file_organizer;
pub mod organizer;
pub mod output;
pub mod provision;
pub mod skip;

pub use config::Config;
pub use error::{ConfigError, MoveError, OrganizeError};
pub use event_log::{EventSink, FileLog, LogEvent, MemoryLog};
pub use file_category::CategoryTable;
pub use file_organizer::{MoveOutcome, Mover, SkipReason};
pub use organizer::{Organizer, RunCounters, RunOptions, RunState, RunSummary};
pub use provision::{ProvisionPolicy, ensure_category_folders};
pub use skip::{DirectoryEntry, SkipRules};

pub use cli::{Cli, run_cli};
