//! Console output: colored status lines, the progress bar, and the run summary.

use crate::file_organizer::MoveOutcome;
use crate::organizer::RunSummary;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Centralizes all user-facing console output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a fatal error, tagged CRITICAL.
    pub fn critical(message: &str) {
        eprintln!("{} {}", "CRITICAL:".red().bold(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for `total` entries.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Number of moved files per category, sorted by category.
    pub fn category_counts(summary: &RunSummary) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for entry in &summary.entries {
            if let MoveOutcome::Moved { category, .. } = &entry.outcome {
                *counts.entry(category.as_str()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Prints the counters, the per-category table and any failures.
    pub fn summary(summary: &RunSummary) {
        Self::header(if summary.dry_run {
            "DRY RUN SUMMARY"
        } else {
            "SUMMARY"
        });

        let counts = Self::category_counts(summary);
        if !counts.is_empty() {
            let width = counts.keys().map(|name| name.len()).max().unwrap_or(0).max(8);
            println!("{:<width$} | {}", "Category".bold(), "Files".bold(), width = width);
            println!("{}", "-".repeat(width + 10));
            for (category, count) in &counts {
                let file_word = if *count == 1 { "file" } else { "files" };
                println!(
                    "{:<width$} | {} {}",
                    category,
                    count.to_string().green(),
                    file_word,
                    width = width
                );
            }
            println!("{}", "-".repeat(width + 10));
        }

        println!("• Files moved: {}", summary.counters.moved.to_string().green());
        println!("• Files skipped: {}", summary.counters.skipped.to_string().yellow());
        println!("• Errors: {}", summary.counters.errored.to_string().red());
        println!("• Duration: {:.2} seconds", summary.duration.as_secs_f64());

        for category in &summary.folder_failures {
            Self::warning(&format!("Could not create folder {}", category));
        }
        for entry in &summary.entries {
            if let MoveOutcome::Errored { message } = &entry.outcome {
                Self::error(message);
            }
        }
    }
}
