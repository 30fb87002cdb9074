//! Sylva CLI - Reusable syntax trees from the command line.
//!
//! Parses Rust source files through the tree cache, reports which files
//! changed since the last good run, and resolves cursor positions to nodes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;

/// Sylva: Syntax tree cache and position lookup.
#[derive(Parser)]
#[command(name = "sylva")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to .sylva/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Cache directory (overrides the configuration file)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse files, reusing cached trees where possible
    Parse {
        /// Source files to parse
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Build interactive trees (columns and navigation links)
        #[arg(short, long)]
        interactive: bool,

        /// Drop every cached tree before parsing
        #[arg(long)]
        rebuild: bool,

        /// Only parse files modified since the last good run
        #[arg(long, conflicts_with = "rebuild")]
        changed: bool,
    },

    /// Show the innermost syntax node at a position
    Locate {
        /// Source file
        file: PathBuf,

        /// Line number (1-based)
        line: u32,

        /// Column (0-based, in the configured column encoding)
        column: u32,
    },

    /// List files modified since the last good run
    Stale {
        /// Source files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let settings = match cli::Settings::resolve(cli.config.as_deref(), cli.cache_dir) {
        Ok(settings) => settings,
        Err(e) => return report_error(&e),
    };

    let result = match cli.command {
        Commands::Parse {
            files,
            interactive,
            rebuild,
            changed,
        } => cli::parse::run(&settings, &files, interactive, rebuild, changed),
        Commands::Locate { file, line, column } => {
            cli::locate::run(&settings, &file, line, column).map(|()| true)
        }
        Commands::Stale { files } => cli::stale::run(&settings, &files).map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => report_error(&e),
    }
}

fn report_error(e: &sylva::Error) -> ExitCode {
    eprintln!("{}: {e}", "error".red().bold());
    // Show cause chain for nested errors
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        eprintln!("  {}: {cause}", "caused by".dimmed());
        source = std::error::Error::source(cause);
    }
    ExitCode::FAILURE
}
