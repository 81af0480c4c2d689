//! Command-line interface for dirsort.
//!
//! This module handles:
//! - Argument parsing
//! - Configuration loading and CLI overrides
//! - Wiring the log file, progress bar and organizer together
//! - Mapping failures to exit codes

use crate::config::Config;
use crate::error::{ConfigError, OrganizeError};
use crate::event_log::{EventSink, FileLog};
use crate::file_category::CategoryTable;
use crate::organizer::{Organizer, RunOptions, RunSummary};
use crate::output::OutputFormatter;
use crate::provision::ProvisionPolicy;
use crate::skip::SkipRules;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Sort the files of a directory into category folders by extension.
#[derive(Debug, Clone, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Cli {
    /// Directory to organize. Defaults to the configured root, then $HOME.
    pub directory: Option<PathBuf>,

    /// Log file to append to. Defaults to <DIRECTORY>/file_organizer_log.txt.
    #[arg(short, long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Configuration file. Defaults to ./.dirsortrc.toml, then ~/.config/dirsort/config.toml.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show what would be moved without changing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Create a folder for every known category, not only the ones needed.
    #[arg(long)]
    pub eager: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Increase diagnostic output on stderr (-v, -vv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Failures that end the process with a non-zero status.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Organize(#[from] OrganizeError),
    #[error("Could not render summary: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Organize(_) => 1,
            CliError::Config(_) | CliError::Json(_) => 2,
        }
    }
}

/// Installs the stderr diagnostics subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Runs one organization pass as described by `cli`.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["dirsort", "/home/me/Downloads", "--dry-run"]);
/// match run_cli(&cli) {
///     Ok(summary) => println!("{} files moved", summary.counters.moved),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<RunSummary, CliError> {
    let config = Config::load(cli.config.as_deref()).inspect_err(|e| {
        OutputFormatter::critical(&format!("Error loading configuration: {}", e));
    })?;
    let prepared = prepare(cli, &config).inspect_err(|e| {
        OutputFormatter::critical(&format!("Invalid configuration: {}", e));
    })?;
    let Prepared {
        root,
        log_path,
        table,
        skip,
        options,
    } = prepared;

    if !cli.json {
        OutputFormatter::info(&format!("Organizing files in: {}", root.display()));
        OutputFormatter::info(&format!("Check the log file for details: {}", log_path.display()));
        if options.dry_run {
            OutputFormatter::warning("Dry run: no files will be moved");
        }
    }

    let mut log = FileLog::new(&log_path);
    let mut organizer = Organizer::new(&root, &table, skip, options);
    if !cli.json {
        organizer = organizer.with_progress(OutputFormatter::create_progress_bar(0));
    }

    let summary = match organizer.run(&mut log) {
        Ok(summary) => summary,
        Err(e) => {
            OutputFormatter::critical(&format!("Error during organization: {}", e));
            return Err(e.into());
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        OutputFormatter::summary(&summary);
        if summary.counters.errored == 0 {
            OutputFormatter::success("File organization completed successfully!");
        } else {
            OutputFormatter::warning("Some files could not be organized. See the log for details.");
        }
        OutputFormatter::info(&format!("Log file: {}", log.path().display()));
    }

    Ok(summary)
}

struct Prepared {
    root: PathBuf,
    log_path: PathBuf,
    table: CategoryTable,
    skip: SkipRules,
    options: RunOptions,
}

/// Merges CLI flags over the configuration file.
fn prepare(cli: &Cli, config: &Config) -> Result<Prepared, ConfigError> {
    let root = config.root(cli.directory.as_deref());
    let log_path = config.log_file(&root, cli.log.as_deref());
    let table = config.category_table()?;
    let skip = config.skip_rules(&log_path)?;
    let options = RunOptions {
        policy: if cli.eager {
            ProvisionPolicy::Eager
        } else {
            config.organizer.provision
        },
        dry_run: cli.dry_run || config.organizer.dry_run,
    };
    Ok(Prepared {
        root,
        log_path,
        table,
        skip,
        options,
    })
}

/// Records a fatal failure in the log file, if one can be determined.
pub fn log_critical(cli: &Cli, error: &CliError) {
    // Scan failures are already logged by the organizer.
    if matches!(error, CliError::Organize(_)) {
        return;
    }
    let config = Config::load(cli.config.as_deref()).unwrap_or_default();
    let root = config.root(cli.directory.as_deref());
    let mut log = FileLog::new(config.log_file(&root, cli.log.as_deref()));
    log.append(&format!("CRITICAL ERROR: {}", error));
}
