//! Doctor command: diagnose configuration, manifest files and environment.

use camino::Utf8Path;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use prbump_core::config::{self, Config, FileEntry, PatternEntry};
use prbump_core::manifest::{FileKind, Manifest};
use prbump_core::substitute::NEW_VERSION_PLACEHOLDER;

/// Arguments for the `doctor` subcommand.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct DoctorReport {
    directories: DirectoryPaths,
    config: ConfigStatus,
    manifest: ManifestStatus,
    environment: EnvironmentInfo,
}

#[derive(Serialize)]
struct DirectoryPaths {
    config: Option<String>,
    data_local: Option<String>,
}

#[derive(Serialize)]
struct ConfigStatus {
    /// Path to the project config file, if any
    file: Option<String>,
    /// Whether a project config file was found
    found: bool,
}

#[derive(Serialize)]
struct ManifestStatus {
    /// Whether the manifest passes full validation
    valid: bool,
    /// Validation error, when invalid
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    files: Vec<FileCheck>,
}

#[derive(Serialize)]
struct FileCheck {
    path: Option<String>,
    exists: bool,
}

#[derive(Serialize)]
struct EnvironmentInfo {
    /// Current working directory
    cwd: Option<String>,
    /// Relevant environment variables
    env_vars: Vec<EnvVar>,
}

#[derive(Serialize)]
struct EnvVar {
    name: &'static str,
    value: Option<String>,
    description: &'static str,
}

impl EnvVar {
    fn read(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            value: std::env::var(name).ok(),
            description,
        }
    }
}

impl ManifestStatus {
    fn check(config: &Config, cwd: &Utf8Path, progress: &ProgressBar) -> Self {
        let files = config
            .files
            .iter()
            .map(|entry| {
                let path = entry.path.as_ref().map(|p| p.to_string());
                if let Some(ref p) = path {
                    progress.set_message(format!("Checking {p}..."));
                }
                FileCheck {
                    exists: entry.path.as_ref().is_some_and(|p| cwd.join(p).is_file()),
                    path,
                }
            })
            .collect();

        let error = Manifest::from_config(config, cwd).err().map(|e| e.to_string());
        Self {
            valid: error.is_none(),
            error,
            files,
        }
    }
}

impl DoctorReport {
    fn gather(config: &Config, cwd: &Utf8Path, progress: &ProgressBar) -> Self {
        let config_file = config::find_project_config(cwd);

        Self {
            directories: DirectoryPaths {
                config: config::user_config_dir().map(|p| p.to_string()),
                data_local: config::user_data_local_dir().map(|p| p.to_string()),
            },
            config: ConfigStatus {
                found: config_file.is_some(),
                file: config_file.map(|p| p.to_string()),
            },
            manifest: ManifestStatus::check(config, cwd, progress),
            environment: EnvironmentInfo {
                cwd: Some(cwd.to_string()),
                env_vars: vec![
                    EnvVar::read("PR_TITLE", "Pull request title"),
                    EnvVar::read("PR_BODY", "Pull request description"),
                    EnvVar::read("XDG_CONFIG_HOME", "Override config directory"),
                    EnvVar::read("RUST_LOG", "Log filter directive"),
                    EnvVar::read("PRBUMP_LOG_PATH", "Explicit log file path"),
                    EnvVar::read("PRBUMP_LOG_DIR", "Log directory"),
                ],
            },
        }
    }
}

/// Run diagnostics and report configuration status.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `cwd` - Current working directory
#[instrument(name = "cmd_doctor", skip_all, fields(json_output))]
pub fn cmd_doctor(
    _args: DoctorArgs,
    global_json: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing doctor command");

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Gathering diagnostics...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let report = DoctorReport::gather(config, cwd, &spinner);
    spinner.finish_and_clear();

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Configuration".bold().underline());
    if let Some(ref file) = report.config.file {
        println!("  {} Config file: {}", "✓".green(), file.cyan());
    } else {
        println!("  {} No project config file found", "○".yellow());
        offer_config_creation(cwd)?;
    }
    println!();

    println!("{}", "Manifest".bold().underline());
    for file in &report.manifest.files {
        let path = file.path.as_deref().unwrap_or("(no path)");
        if file.exists {
            println!("  {} {}", "✓".green(), path.cyan());
        } else {
            println!("  {} {} {}", "✗".red(), path.cyan(), "(missing)".red());
        }
    }
    match report.manifest.error {
        None => println!("  {} Manifest is valid", "✓".green()),
        Some(ref err) => println!("  {} {}", "✗".red(), err.red()),
    }
    println!();

    println!("{}", "Directories".bold().underline());
    print_dir("  Config", &report.directories.config);
    print_dir("  Data (local)", &report.directories.data_local);
    println!();

    println!("{}", "Environment".bold().underline());
    println!("  {}: {}", "Working directory".dimmed(), cwd.cyan());

    let set_vars: Vec<_> = report
        .environment
        .env_vars
        .iter()
        .filter(|v| v.value.is_some())
        .collect();

    if set_vars.is_empty() {
        println!("  {} No pull request or logging variables set", "○".dimmed());
    } else {
        for var in set_vars {
            println!(
                "  {}: {} {}",
                var.name.dimmed(),
                var.value.as_deref().unwrap_or("").cyan(),
                format!("({})", var.description).dimmed()
            );
        }
    }

    Ok(())
}

fn print_dir(label: &str, path: &Option<String>) {
    print!("{}: ", label.dimmed());
    match path {
        Some(p) => println!("{}", p.cyan()),
        None => println!("{}", "(unavailable)".yellow()),
    }
}

/// A starter manifest with one code file and one changelog.
fn starter_config() -> Config {
    Config {
        files: vec![
            FileEntry {
                path: Some("plugin.php".into()),
                kind: Some(FileKind::Code.to_string()),
                patterns: Some(vec![PatternEntry {
                    search: Some(r"Version:\s+([0-9]+\.[0-9]+\.[0-9]+)".into()),
                    replace: Some(format!("Version:           {NEW_VERSION_PLACEHOLDER}")),
                }]),
                ..FileEntry::default()
            },
            FileEntry {
                path: Some("CHANGELOG.txt".into()),
                kind: Some(FileKind::Changelog.to_string()),
                needs_description: Some(true),
                header_pattern: Some(r"Changelog\n=========".into()),
                ..FileEntry::default()
            },
        ],
        ..Config::default()
    }
}

/// Offer to create a starter `.prbump.yaml` when none exists.
fn offer_config_creation(cwd: &Utf8Path) -> anyhow::Result<()> {
    // Don't prompt if running non-interactively
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Ok(());
    }

    let config_path = cwd.join(".prbump.yaml");
    let create = Confirm::new("Create a starter .prbump.yaml?")
        .with_default(false)
        .with_help_message(&format!("Will create {config_path}"))
        .prompt();

    // Declined or interrupted prompts leave everything as is.
    if let Ok(true) = create {
        let yaml = serde_saphyr::to_string(&starter_config())?;
        std::fs::write(&config_path, yaml)?;
        println!("  {} Created {}", "✓".green(), config_path.cyan());
    }

    Ok(())
}
