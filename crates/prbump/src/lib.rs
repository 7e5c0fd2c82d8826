//! Library interface for the `prbump` CLI.
//!
//! This crate exposes the CLI's argument parser and command structure as a library,
//! primarily for documentation generation and testing. The actual entry point is
//! in `main.rs`.
//!
//! # Structure
//!
//! - [`Cli`] - The root argument parser (clap derive)
//! - [`Commands`] - Available subcommands
//! - [`commands`] - Command implementations
//!
//! # Documentation Generation
//!
//! The [`command()`] function returns the clap `Command` for generating man pages
//! and shell completions via `xtask`.

pub mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Configure global color output based on this choice.
    ///
    /// Call this once at startup to set the color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {} // owo-colors auto-detects by default
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    PR_TITLE            Pull request title (bump --title)
    PR_BODY             Pull request description (bump --body)
    RUST_LOG            Log filter (e.g., debug, prbump_core=trace)
    PRBUMP_LOG_PATH     Explicit log file path
    PRBUMP_LOG_DIR      Log directory
";

/// Command-line interface definition for prbump.
#[derive(Parser)]
#[command(name = "prbump")]
#[command(
    about = "Bump versions and write changelog entries from release pull requests",
    long_about = None
)]
#[command(version)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands for the CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Bump the version and update the changelog for a release pull request
    Bump(commands::bump::BumpArgs),

    /// Validate the manifest and show the current and next version
    Check(commands::check::CheckArgs),

    /// Diagnose configuration and manifest files
    Doctor(commands::doctor::DoctorArgs),

    /// Show package and configuration information
    Info(commands::info::InfoArgs),
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn bump_flags_parse() {
        let cli = Cli::try_parse_from([
            "prbump",
            "--json",
            "bump",
            "--title",
            "[release] x",
            "--date",
            "2026-10-18",
            "--dry-run",
        ])
        .unwrap();
        assert!(cli.json);
        let Commands::Bump(args) = cli.command else {
            panic!("expected bump");
        };
        assert_eq!(args.title, "[release] x");
        assert!(args.dry_run);
        assert_eq!(args.date.map(|d| d.to_string()).as_deref(), Some("2026-10-18"));
    }
}
