//! Configuration file support.
//!
//! Configuration is stored in TOML and every key is optional:
//!
//! ```toml
//! [organizer]
//! root = "/home/me/Downloads"
//! log_file = "/home/me/.local/state/dirsort.log"
//! provision = "on-demand"   # or "eager"
//! dry_run = false
//!
//! [skip]
//! patterns = ["*.part", "*.crdownload"]
//! regex = []
//!
//! [categories]
//! fallback = "Other"
//! replace_defaults = false
//!
//! [categories.map]
//! Books = ["epub", "mobi", "cbz"]
//! ```
//!
//! Without `replace_defaults`, `[categories.map]` extends the standard table
//! and reassigns any extension it lists.

use crate::error::ConfigError;
use crate::file_category::{CategoryTable, DEFAULT_FALLBACK};
use crate::provision::ProvisionPolicy;
use crate::skip::{ExtraExclusions, SkipRules};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the local configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".dirsortrc.toml";

/// Log file name used when none is configured.
pub const DEFAULT_LOG_FILE_NAME: &str = "file_organizer_log.txt";

/// Whole configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub organizer: OrganizerSection,
    #[serde(default)]
    pub skip: SkipSection,
    #[serde(default)]
    pub categories: CategorySection,
}

/// `[organizer]`: where to run and how.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerSection {
    /// Directory to organize. Defaults to the home directory.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Log file. Defaults to `<root>/file_organizer_log.txt`.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub provision: ProvisionPolicy,
    #[serde(default)]
    pub dry_run: bool,
}

/// `[skip]`: exclusions on top of the fixed skip rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkipSection {
    /// Glob patterns matched against base names (e.g. `"*.part"`).
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Regex patterns matched against base names.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// `[categories]`: the extension table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySection {
    #[serde(default = "default_fallback")]
    pub fallback: String,
    /// Use only `map`, ignoring the standard table.
    #[serde(default)]
    pub replace_defaults: bool,
    #[serde(default)]
    pub map: BTreeMap<String, Vec<String>>,
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}

impl Default for CategorySection {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
            replace_defaults: false,
            map: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.dirsortrc.toml` in the current directory
    /// 3. Look for `~/.config/dirsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(".config").join("dirsort").join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigInvalid` on syntax or type errors.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Builds the category table described by `[categories]`.
    ///
    /// # Errors
    ///
    /// Propagates table validation errors.
    pub fn category_table(&self) -> Result<CategoryTable, ConfigError> {
        let groups = self.categories.map.clone();
        let fallback = &self.categories.fallback;
        if self.categories.replace_defaults {
            CategoryTable::from_groups(groups, fallback)
        } else if groups.is_empty() && fallback == DEFAULT_FALLBACK {
            Ok(CategoryTable::standard())
        } else {
            CategoryTable::with_overrides(groups, fallback)
        }
    }

    /// Builds the skip rules for a run logging to `log_file`.
    ///
    /// # Errors
    ///
    /// Returns an error if a `[skip]` pattern does not compile.
    pub fn skip_rules(&self, log_file: &Path) -> Result<SkipRules, ConfigError> {
        let extra = ExtraExclusions::compile(&self.skip.patterns, &self.skip.regex)?;
        Ok(SkipRules::new(log_file).with_exclusions(extra))
    }

    /// Directory to organize: `override_root`, then the configured root, then home.
    pub fn root(&self, override_root: Option<&Path>) -> PathBuf {
        override_root
            .map(Path::to_path_buf)
            .or_else(|| self.organizer.root.clone())
            .or_else(home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Log file path: `override_log`, then the configured path, then `<root>/file_organizer_log.txt`.
    pub fn log_file(&self, root: &Path, override_log: Option<&Path>) -> PathBuf {
        override_log
            .map(Path::to_path_buf)
            .or_else(|| self.organizer.log_file.clone())
            .unwrap_or_else(|| root.join(DEFAULT_LOG_FILE_NAME))
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}
