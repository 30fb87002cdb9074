//! `sylva parse` command implementation.

use std::path::PathBuf;

use chrono::Utc;
use colored::Colorize;
use sylva::{RunCheckpoint, SourceFile};

use super::Settings;

const MAX_DISPLAY_ERRORS: usize = 5;

/// Run the parse command.
///
/// Returns `Ok(false)` when any file could not be read or parsed.
pub fn run(
    settings: &Settings,
    files: &[PathBuf],
    interactive: bool,
    rebuild: bool,
    changed_only: bool,
) -> sylva::Result<bool> {
    // Taken before reading so edits made during the run stay stale
    let started = Utc::now();
    let provider = settings.provider()?;
    let mut checkpoint = RunCheckpoint::load(provider.store());

    if rebuild {
        println!("{}", "Clearing cached trees".yellow());
        provider.store().clear()?;
    }

    let mode = if interactive {
        settings.config.interactive_mode()
    } else {
        settings.config.mode()
    };
    let selected = select_files(&checkpoint, files, changed_only);
    let skipped = files.len() - selected.len();
    if skipped > 0 {
        println!("{} {skipped} unchanged files", "Skipping".dimmed());
    }
    println!("{} {} files ({mode})...", "Parsing".cyan().bold(), selected.len());

    let mut sources = Vec::with_capacity(selected.len());
    let mut unreadable = Vec::new();
    for path in &selected {
        match SourceFile::read(path) {
            Ok(source) => sources.push(source),
            Err(e) => unreadable.push((path, e)),
        }
    }

    let report = provider.get_trees(&sources, mode);

    println!();
    for (path, tree) in &report.parsed {
        println!(
            "  {} {}: {} statements, {} nodes",
            "•".dimmed(),
            path.display(),
            tree.roots().len(),
            tree.len()
        );
    }
    println!();
    println!(
        "{} {} files",
        "Parsed".green().bold(),
        report.parsed.len()
    );
    println!("{}: {:.2?}", "Duration".dimmed(), report.duration);

    if !unreadable.is_empty() {
        println!();
        println!("{} ({}):", "Unreadable".red().bold(), unreadable.len());
        for (path, e) in &unreadable {
            println!("  {} {}: {e}", "•".red(), path.display());
        }
    }

    if !report.failed.is_empty() {
        println!();
        println!("{} ({}):", "Errors".red().bold(), report.failed.len());
        for failure in &report.failed {
            println!("  {} {}", "•".red(), failure.path.display());
            for error in failure.errors.iter().take(MAX_DISPLAY_ERRORS) {
                println!("      line {}: {}", error.line, error.message);
            }
            if failure.errors.len() > MAX_DISPLAY_ERRORS {
                println!(
                    "      ... and {} more",
                    failure.errors.len() - MAX_DISPLAY_ERRORS
                );
            }
        }
    }

    let success = unreadable.is_empty() && report.is_success();
    if success {
        checkpoint.advance(provider.store(), started)?;
        println!("{}: {}", "Last good run".dimmed(), started.to_rfc3339());
    }

    Ok(success)
}

/// All of `files`, or only those modified since the last good run when
/// `changed_only` is set.
fn select_files(checkpoint: &RunCheckpoint, files: &[PathBuf], changed_only: bool) -> Vec<PathBuf> {
    if changed_only {
        checkpoint.stale_files(files)
    } else {
        files.to_vec()
    }
}
