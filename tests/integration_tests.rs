use clap::Parser;
use dirsort::cli::{Cli, CliError, run_cli};
use dirsort::{
    CategoryTable, MemoryLog, MoveOutcome, Organizer, ProvisionPolicy, RunOptions, RunState,
    SkipReason, SkipRules,
};
/// Integration tests for dirsort
///
/// These tests run complete organization passes against temporary
/// directories, through both the library API and the CLI entry point.
///
/// Test categories:
/// 1. Classification scenarios
/// 2. Collisions
/// 3. Failure isolation
/// 4. Log file behavior
/// 5. Provisioning policies and dry runs
/// 6. Configuration
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary directory to organize, plus a separate place for config files.
struct TestFixture {
    temp_dir: TempDir,
    aux_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        TestFixture {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            aux_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// The directory being organized.
    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn log_path(&self) -> PathBuf {
        self.path().join("file_organizer_log.txt")
    }

    fn create_file(&self, name: &str, content: &[u8]) {
        let file_path = self.path().join(name);
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    fn create_files(&self, files: &[(&str, &[u8])]) {
        for (name, content) in files {
            self.create_file(name, content);
        }
    }

    fn create_subdir(&self, name: &str) {
        fs::create_dir(self.path().join(name)).expect("Failed to create subdirectory");
    }

    /// Writes a config file outside the organized directory and returns its path.
    fn write_config(&self, content: &str) -> PathBuf {
        let path = self.aux_dir.path().join("config.toml");
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    /// CLI arguments with an isolated, empty configuration.
    fn cli(&self, extra: &[&str]) -> Cli {
        let config = self.write_config("");
        self.cli_with_config(&config, extra)
    }

    fn cli_with_config(&self, config: &Path, extra: &[&str]) -> Cli {
        let mut args = vec![
            "dirsort".to_string(),
            self.path().display().to_string(),
            "--config".to_string(),
            config.display().to_string(),
            "--json".to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        Cli::try_parse_from(args).expect("valid arguments")
    }

    fn read(&self, rel_path: &str) -> Vec<u8> {
        fs::read(self.path().join(rel_path)).expect("Failed to read file")
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// Count directories in the organized directory (non-recursive).
    fn count_dirs(&self) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .flatten()
            .filter(|e| e.path().is_dir())
            .count()
    }

    fn log_lines(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn run_library(fixture: &TestFixture, options: RunOptions) -> (dirsort::RunSummary, MemoryLog) {
    let table = CategoryTable::standard();
    let skip = SkipRules::new(&fixture.log_path());
    let mut log = MemoryLog::new();
    let mut organizer = Organizer::new(fixture.path(), &table, skip, options);
    let summary = organizer.run(&mut log).expect("run should succeed");
    assert_eq!(organizer.state(), RunState::Done);
    (summary, log)
}

// ============================================================================
// Test Suite 1: Classification scenarios
// ============================================================================

#[test]
fn test_mixed_directory_scenario() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        ("report.pdf", b"pdf"),
        ("photo.JPG", b"jpg"),
        (".hidden", b"secret"),
        ("notes", b"plain"),
        ("archive.zip", b"zip"),
    ]);

    let (summary, log) = run_library(&fixture, RunOptions::default());

    assert_eq!(summary.counters.moved, 3);
    assert_eq!(summary.counters.skipped, 2);
    assert_eq!(summary.counters.errored, 0);
    fixture.assert_file_exists("Documents/report.pdf");
    fixture.assert_file_exists("Images/photo.JPG");
    fixture.assert_file_exists("Archives/archive.zip");
    fixture.assert_file_exists(".hidden");
    fixture.assert_file_exists("notes");

    assert_eq!(
        summary.outcome_of(".hidden"),
        Some(&MoveOutcome::Skipped {
            reason: SkipReason::Filtered
        })
    );
    assert_eq!(
        summary.outcome_of("notes"),
        Some(&MoveOutcome::Skipped {
            reason: SkipReason::NoExtension
        })
    );

    let messages = log.messages();
    assert!(messages.contains(&"Moved: report.pdf → Documents/"));
    assert!(messages.contains(&"Moved: photo.JPG → Images/"));
    assert!(messages.contains(&"Moved: archive.zip → Archives/"));
    assert!(messages.contains(&"No extension: notes"));
}

#[test]
fn test_unknown_extension_goes_to_fallback() {
    let fixture = TestFixture::new();
    fixture.create_file("data.weird", b"?");

    let (summary, _) = run_library(&fixture, RunOptions::default());

    assert_eq!(summary.counters.moved, 1);
    fixture.assert_file_exists("Other/data.weird");
}

#[test]
fn test_subdirectories_are_not_entered() {
    let fixture = TestFixture::new();
    fixture.create_subdir("projects");
    fs::write(fixture.path().join("projects/inner.pdf"), b"x").unwrap();
    fixture.create_file("~lock.tmp", b"");

    let (summary, _) = run_library(&fixture, RunOptions::default());

    assert_eq!(summary.counters.skipped, 2);
    assert_eq!(summary.counters.moved, 0);
    fixture.assert_file_exists("projects/inner.pdf");
    fixture.assert_file_exists("~lock.tmp");
    assert_eq!(fixture.count_dirs(), 1);
}

#[test]
fn test_counter_conservation() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        ("a.png", b"1"),
        ("b.mp3", b"2"),
        ("c", b"3"),
        (".d", b"4"),
        ("file_organizer_log.txt", b"old log\n"),
    ]);
    fixture.create_subdir("Images");
    fixture.create_file("Images/a.png", b"existing");

    let (summary, _) = run_library(&fixture, RunOptions::default());

    assert_eq!(summary.total, 6);
    assert_eq!(
        summary.counters.moved + summary.counters.skipped + summary.counters.errored,
        summary.total
    );
    assert_eq!(summary.counters.moved, 2);
    // The log file stays in the root.
    fixture.assert_file_exists("file_organizer_log.txt");
}

// ============================================================================
// Test Suite 2: Collisions
// ============================================================================

#[test]
fn test_collision_keeps_both_files() {
    let fixture = TestFixture::new();
    fixture.create_subdir("Documents");
    fixture.create_file("Documents/a.txt", b"original contents");
    fixture.create_file("a.txt", b"incoming contents");

    let (summary, _) = run_library(&fixture, RunOptions::default());

    assert_eq!(summary.counters.moved, 1);
    assert_eq!(fixture.read("Documents/a.txt"), b"original contents");
    assert_eq!(fixture.read("Documents/a_copy.txt"), b"incoming contents");
    fixture.assert_file_not_exists("a.txt");
}

#[test]
fn test_repeated_collisions_are_numbered() {
    let fixture = TestFixture::new();
    fixture.create_subdir("Documents");
    fixture.create_file("Documents/a.txt", b"1");
    fixture.create_file("Documents/a_copy.txt", b"2");
    fixture.create_file("Documents/a_copy2.txt", b"3");
    fixture.create_file("a.txt", b"4");

    run_library(&fixture, RunOptions::default());

    assert_eq!(fixture.read("Documents/a_copy.txt"), b"2");
    assert_eq!(fixture.read("Documents/a_copy2.txt"), b"3");
    assert_eq!(fixture.read("Documents/a_copy3.txt"), b"4");
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_name_keeps_its_bytes() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fixture = TestFixture::new();
    let name = OsStr::from_bytes(b"caf\xe9.txt");
    fs::write(fixture.path().join(name), b"latin-1").unwrap();

    let (summary, _) = run_library(&fixture, RunOptions::default());

    assert_eq!(summary.counters.moved, 1);
    let names: Vec<_> = fs::read_dir(fixture.path().join("Documents"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, [name.to_os_string()]);
    assert_eq!(
        fs::read(fixture.path().join("Documents").join(name)).unwrap(),
        b"latin-1"
    );
}

// ============================================================================
// Test Suite 3: Failure isolation
// ============================================================================

#[test]
fn test_unwritable_destination_is_counted_and_run_completes() {
    let fixture = TestFixture::new();
    // A plain file named like the category blocks the folder.
    fixture.create_file("Documents", b"in the way");
    fixture.create_files(&[("report.pdf", b"pdf"), ("song.mp3", b"mp3")]);

    let (summary, log) = run_library(&fixture, RunOptions::default());

    assert_eq!(summary.counters.errored, 1);
    assert_eq!(summary.counters.moved, 1);
    assert_eq!(summary.counters.skipped, 1);
    assert_eq!(summary.folder_failures, ["Documents"]);
    assert!(matches!(
        summary.outcome_of("report.pdf"),
        Some(MoveOutcome::Errored { .. })
    ));
    fixture.assert_file_exists("report.pdf");
    fixture.assert_file_exists("Audio/song.mp3");
    assert_eq!(log.count_prefixed("Failed to create Documents"), 1);
    assert_eq!(log.count_prefixed("Failed to move report.pdf"), 1);
    assert_eq!(log.count_prefixed("• Errors: 1"), 1);
}

#[test]
fn test_missing_root_is_fatal_through_cli() {
    let fixture = TestFixture::new();
    let config = fixture.write_config("");
    let log_path = fixture.aux_dir.path().join("run.log");
    let missing = fixture.path().join("does-not-exist");
    let cli = Cli::try_parse_from([
        "dirsort".to_string(),
        missing.display().to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--log".to_string(),
        log_path.display().to_string(),
        "--json".to_string(),
    ])
    .unwrap();

    let error = run_cli(&cli).expect_err("scan must fail");

    assert!(matches!(error, CliError::Organize(_)));
    assert_eq!(error.exit_code(), 1);
    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("CRITICAL ERROR: Cannot read directory"));
}

// ============================================================================
// Test Suite 4: Log file behavior
// ============================================================================

#[test]
fn test_log_lines_are_timestamped() {
    let fixture = TestFixture::new();
    fixture.create_file("clip.mp4", b"mp4");

    let summary = run_cli(&fixture.cli(&[])).unwrap();

    assert_eq!(summary.counters.moved, 1);
    let stamp = regex::Regex::new(r"^\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\] ").unwrap();
    let lines = fixture.log_lines();
    assert!(!lines.is_empty());
    for line in &lines {
        assert!(stamp.is_match(line), "bad log line: {line}");
    }
    assert!(lines.iter().any(|l| l.ends_with("Moved: clip.mp4 → Videos/")));
    assert!(lines.iter().any(|l| l.ends_with("Created folder: Videos")));
}

#[test]
fn test_log_is_appended_across_runs() {
    let fixture = TestFixture::new();
    fixture.create_file("one.pdf", b"1");
    run_cli(&fixture.cli(&[])).unwrap();
    let first_len = fixture.log_lines().len();

    fixture.create_file("two.pdf", b"2");
    let summary = run_cli(&fixture.cli(&[])).unwrap();

    let lines = fixture.log_lines();
    assert!(lines.len() > first_len);
    assert!(lines.iter().any(|l| l.ends_with("Moved: one.pdf → Documents/")));
    assert!(lines.iter().any(|l| l.ends_with("Moved: two.pdf → Documents/")));
    // Second run: log file and Documents folder are skipped, one file moved.
    assert_eq!(summary.counters.moved, 1);
    assert_eq!(summary.counters.skipped, 2);
    assert_eq!(
        lines.iter().filter(|l| l.ends_with("Created folder: Documents")).count(),
        1
    );
}

// ============================================================================
// Test Suite 5: Provisioning policies and dry runs
// ============================================================================

#[test]
fn test_on_demand_creates_only_needed_folders() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("a.png", b"1"), ("b.png", b"2")]);

    let (summary, _) = run_library(&fixture, RunOptions::default());

    assert_eq!(summary.folders_created, ["Images"]);
    assert_eq!(fixture.count_dirs(), 1);
}

#[test]
fn test_eager_provisioning_is_idempotent() {
    let fixture = TestFixture::new();
    let options = RunOptions {
        policy: ProvisionPolicy::Eager,
        dry_run: false,
    };

    let (_, first_log) = run_library(&fixture, options);
    let (second, second_log) = run_library(&fixture, options);

    let categories = CategoryTable::standard().categories().count();
    assert_eq!(first_log.count_prefixed("Created folder"), categories);
    assert_eq!(second_log.count_prefixed("Created folder"), 0);
    assert!(second.folders_created.is_empty());
    // Every existing category folder is a skipped directory entry.
    assert_eq!(second.counters.skipped, categories);
}

#[test]
fn test_eager_flag_through_cli() {
    let fixture = TestFixture::new();

    run_cli(&fixture.cli(&["--eager"])).unwrap();

    fixture.assert_dir_exists("Documents");
    fixture.assert_dir_exists("Web Files");
    fixture.assert_dir_exists("Other");
}

#[test]
fn test_dry_run_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_files(&[("photo.png", b"png"), ("report.pdf", b"pdf")]);

    let summary = run_cli(&fixture.cli(&["--dry-run"])).unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.counters.moved, 2);
    fixture.assert_file_exists("photo.png");
    fixture.assert_file_exists("report.pdf");
    assert_eq!(fixture.count_dirs(), 0);
    assert!(
        fixture
            .log_lines()
            .iter()
            .any(|l| l.ends_with("Dry-run: Would move photo.png → Images/"))
    );
}

#[test]
fn test_empty_directory_through_cli() {
    let fixture = TestFixture::new();

    let summary = run_cli(&fixture.cli(&[])).unwrap();

    assert_eq!(summary.total, 0);
    assert_eq!(summary.counters.moved, 0);
    assert_eq!(summary.counters.skipped, 0);
    assert_eq!(summary.counters.errored, 0);
    assert_eq!(fixture.count_dirs(), 0);
}

// ============================================================================
// Test Suite 6: Configuration
// ============================================================================

#[test]
fn test_custom_categories_and_exclusions_from_config() {
    let fixture = TestFixture::new();
    fixture.create_files(&[
        ("novel.epub", b"book"),
        ("movie.mkv.part", b"partial"),
        ("report.pdf", b"pdf"),
    ]);
    let config = fixture.write_config(
        r#"
        [skip]
        patterns = ["*.part"]

        [categories]
        [categories.map]
        Books = ["epub"]
        "#,
    );

    let summary = run_cli(&fixture.cli_with_config(&config, &[])).unwrap();

    assert_eq!(summary.counters.moved, 2);
    fixture.assert_file_exists("Books/novel.epub");
    fixture.assert_file_exists("Documents/report.pdf");
    fixture.assert_file_exists("movie.mkv.part");
}

#[test]
fn test_invalid_config_is_reported() {
    let fixture = TestFixture::new();
    let config = fixture.write_config(
        r#"
        [categories.map]
        A = ["dat"]
        B = ["dat"]
        "#,
    );

    let error = run_cli(&fixture.cli_with_config(&config, &[])).expect_err("duplicate extension");

    assert!(matches!(error, CliError::Config(_)));
    assert_eq!(error.exit_code(), 2);
}

#[test]
fn test_configured_log_file_location() {
    let fixture = TestFixture::new();
    fixture.create_file("script.sh", b"#!/bin/sh");
    let log_path = fixture.aux_dir.path().join("elsewhere.log");
    let config = fixture.write_config(&format!(
        "[organizer]\nlog_file = {:?}\n",
        log_path.display().to_string()
    ));

    run_cli(&fixture.cli_with_config(&config, &[])).unwrap();

    fixture.assert_file_exists("Scripts/script.sh");
    fixture.assert_file_not_exists("file_organizer_log.txt");
    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Moved: script.sh → Scripts/"));
}
