//! `sylva stale` command implementation.

use std::path::PathBuf;

use colored::Colorize;
use sylva::RunCheckpoint;

use super::Settings;

/// Run the stale command.
pub fn run(settings: &Settings, files: &[PathBuf]) -> sylva::Result<()> {
    let checkpoint = RunCheckpoint::load(&settings.store());

    match checkpoint.last_good_run() {
        Some(at) => println!("{}: {}", "Last good run".dimmed(), at.to_rfc3339()),
        None => println!("{}: {}", "Last good run".dimmed(), "never".yellow()),
    }

    let stale = checkpoint.stale_files(files);
    println!();
    for path in &stale {
        println!("  {} {}", "•".yellow(), path.display());
    }
    println!(
        "{} of {} files changed",
        stale.len().to_string().bold(),
        files.len()
    );

    Ok(())
}
