//! Bump command: thin CLI layer over `prbump_core::bump`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use prbump_core::bump::{self, BumpOptions, BumpOutcome, BumpPlan, ReadyBump};
use prbump_core::changelog::PullRequest;
use prbump_core::chrono::NaiveDate;
use prbump_core::config::Config;

/// Arguments for the `bump` subcommand.
#[derive(Args, Debug, Default)]
pub struct BumpArgs {
    /// Pull request title; must start with the release marker to trigger a bump
    #[arg(long, env = "PR_TITLE", value_name = "TEXT", allow_hyphen_values = true)]
    pub title: String,

    /// Pull request description (markdown)
    #[arg(long, env = "PR_BODY", value_name = "TEXT", allow_hyphen_values = true)]
    pub body: Option<String>,

    /// Read the pull request description from a file (wins over --body)
    #[arg(long, value_name = "PATH")]
    pub body_file: Option<PathBuf>,

    /// Date for the changelog entry (defaults to today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Run without making changes (show what would happen)
    #[arg(long)]
    pub dry_run: bool,
}

impl BumpArgs {
    fn pull_request(&self) -> anyhow::Result<PullRequest> {
        let body = match (&self.body, &self.body_file) {
            (_, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            (Some(body), None) => body.clone(),
            (None, None) => String::new(),
        };
        Ok(PullRequest::new(self.title.clone(), body))
    }

    fn options(&self) -> BumpOptions {
        self.date
            .map(|date| BumpOptions { date })
            .unwrap_or_default()
    }
}

#[derive(Serialize)]
struct SkipReport<'a> {
    skipped: bool,
    title: &'a str,
    marker: &'a str,
}

/// Execute the bump command.
#[instrument(name = "cmd_bump", skip_all, fields(json_output, dry_run = args.dry_run))]
pub fn cmd_bump(
    args: BumpArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing bump command");

    let pr = args.pull_request()?;
    let plan = bump::plan_bump(cwd, config, &pr, &args.options())
        .map_err(|e| super::pipeline_failure(e, global_json))?;

    let ready = match plan {
        BumpPlan::Ready(ready) => ready,
        BumpPlan::Skipped { title, marker } => {
            if global_json {
                let report = SkipReport {
                    skipped: true,
                    title: &title,
                    marker: &marker,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} title does not start with {}; nothing to do.",
                    "Not a release pull request:".yellow(),
                    marker.cyan()
                );
            }
            return Ok(());
        }
    };

    if !global_json {
        print_plan(&ready);
    }

    let outcome = if args.dry_run {
        ready.preview()
    } else {
        ready
            .execute()
            .map_err(|e| super::pipeline_failure(e, global_json))?
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    Ok(())
}

fn print_plan(ready: &ReadyBump) {
    println!(
        "{}: {} → {}",
        "Version".bold(),
        ready.previous.to_string().dimmed(),
        ready.next.to_string().green().bold()
    );
    println!("{}: {}", "Increment".dimmed(), ready.increment);
    println!("{}: {}", "Read from".dimmed(), ready.source.path.cyan());

    if let Some(ref entry) = ready.entry {
        println!("{}", "Changelog".dimmed());
        for item in &entry.items {
            println!("  - {item}");
        }
    }

    for m in &ready.mismatches {
        println!(
            "  {} {} has {} (expected {})",
            "!".yellow(),
            m.path.cyan(),
            m.found.yellow(),
            m.expected
        );
    }
}

fn print_outcome(outcome: &BumpOutcome) {
    println!();
    if outcome.dry_run {
        for file in &outcome.modified_files {
            println!("  {} {} (would change)", "→".dimmed(), file.cyan());
        }
        println!();
        println!("{}", "Dry run: no changes made.".yellow());
        return;
    }

    println!(
        "  {} Version updated to {}",
        "✓".green(),
        outcome.new.to_string().green().bold()
    );
    if outcome.changelog_updated {
        println!("  {} Changelog updated", "✓".green());
    }
    for file in &outcome.modified_files {
        println!("  {} {}", "→".dimmed(), file.cyan());
    }
    for file in &outcome.skipped_files {
        println!("  {} {} (no description needed)", "○".dimmed(), file.dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_file_wins_over_inline_body() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "- [x] From file\n").unwrap();
        let args = BumpArgs {
            title: "[release] t".into(),
            body: Some("- [x] Inline".into()),
            body_file: Some(tmp.path().to_path_buf()),
            ..BumpArgs::default()
        };
        assert_eq!(args.pull_request().unwrap().body, "- [x] From file\n");
    }

    #[test]
    fn missing_body_is_empty() {
        let args = BumpArgs {
            title: "[release] t".into(),
            ..BumpArgs::default()
        };
        assert_eq!(args.pull_request().unwrap().body, "");
    }

    #[test]
    fn explicit_date_is_used() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let args = BumpArgs {
            date: Some(date),
            ..BumpArgs::default()
        };
        assert_eq!(args.options().date, date);
    }

    #[test]
    fn non_release_title_succeeds_without_config() {
        let args = BumpArgs {
            title: "Fix typo".into(),
            ..BumpArgs::default()
        };
        let cwd = camino::Utf8PathBuf::from("/nonexistent");
        assert!(cmd_bump(args, false, &Config::default(), &cwd).is_ok());
    }
}
