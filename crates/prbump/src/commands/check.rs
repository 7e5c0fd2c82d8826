//! Check command: validate the manifest and report versions without writing.

use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use prbump_core::bump;
use prbump_core::config::Config;

/// Arguments for the `check` subcommand.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Exit non-zero when redundant version strings disagree
    #[arg(long)]
    pub strict: bool,
}

/// Validate the manifest and print the current and next version.
#[instrument(name = "cmd_check", skip_all, fields(json_output, strict = args.strict))]
pub fn cmd_check(
    args: CheckArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing check command");

    let report = bump::inspect_version(cwd, config)
        .map_err(|e| super::pipeline_failure(e, global_json))?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{}: {} (from {})",
            "Current".bold(),
            report.current.to_string().cyan(),
            report.source.dimmed()
        );
        println!(
            "{}: {} ({})",
            "Next".bold(),
            report.next.to_string().green().bold(),
            report.increment
        );

        if report.mismatches.is_empty() {
            println!("  {} All version strings agree", "✓".green());
        }
        for m in &report.mismatches {
            println!(
                "  {} {}: '{}' captured {} (expected {})",
                "!".yellow(),
                m.path.cyan(),
                m.pattern.dimmed(),
                m.found.yellow(),
                m.expected
            );
        }
    }

    if args.strict && !report.mismatches.is_empty() {
        anyhow::bail!(
            "{} redundant version string(s) disagree with {}",
            report.mismatches.len(),
            report.current
        );
    }

    Ok(())
}
