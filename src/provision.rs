//! Creation of category folders ahead of the moves.

use crate::event_log::EventSink;
use crate::file_category::CategoryTable;
use crate::skip::{DirectoryEntry, SkipRules};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Which category folders get created before files are moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProvisionPolicy {
    /// Only categories needed by files present in the snapshot.
    #[default]
    OnDemand,
    /// Every known category, fallback included.
    Eager,
}

/// What a provisioning pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Categories the movable entries of `snapshot` resolve to.
///
/// Skipped entries and entries without an extension need no folder.
pub fn needed_categories<'t>(
    snapshot: &[DirectoryEntry],
    table: &'t CategoryTable,
    skip: &SkipRules,
) -> BTreeSet<&'t str> {
    snapshot
        .iter()
        .filter(|entry| !skip.should_skip(entry))
        .filter_map(|entry| entry.extension())
        .map(|ext| table.resolve(ext))
        .collect()
}

/// Categories to provision for `snapshot` under `policy`.
pub fn categories_for<'t>(
    policy: ProvisionPolicy,
    snapshot: &[DirectoryEntry],
    table: &'t CategoryTable,
    skip: &SkipRules,
) -> Vec<&'t str> {
    match policy {
        ProvisionPolicy::Eager => table.categories().collect(),
        ProvisionPolicy::OnDemand => needed_categories(snapshot, table, skip)
            .into_iter()
            .collect(),
    }
}

/// Creates every missing `root/<category>` folder.
///
/// A folder that already exists is left alone and not logged. A failure is
/// logged and the remaining categories are still attempted.
pub fn ensure_category_folders<'a, I>(
    root: &Path,
    categories: I,
    log: &mut dyn EventSink,
) -> ProvisionReport
where
    I: IntoIterator<Item = &'a str>,
{
    let mut report = ProvisionReport::default();

    for category in categories {
        let folder = root.join(category);
        if folder.is_dir() {
            continue;
        }

        match fs::create_dir(&folder) {
            Ok(()) => {
                log.append(&format!("Created folder: {}", category));
                report.created.push(category.to_string());
            }
            Err(e) => {
                tracing::warn!(folder = %folder.display(), error = %e, "Folder creation failed");
                log.append(&format!("Failed to create {}: {}", category, e));
                report.failed.push((category.to_string(), e.to_string()));
            }
        }
    }

    report
}
