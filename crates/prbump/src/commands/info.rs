//! Info command: show package, config, and manifest information.

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use prbump_core::config::{self, Config};
use prbump_core::manifest::FileKind;

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    release_marker: String,
    increment: String,
}

impl ConfigInfo {
    fn from_config(config: &Config, cwd: &camino::Utf8Path) -> Self {
        Self {
            config_file: config::find_project_config(cwd).map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            release_marker: config.release_marker().to_string(),
            increment: config.increment().to_string(),
        }
    }
}

/// One manifest entry as listed, without validation.
#[derive(Serialize)]
struct FileInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    needs_description: bool,
    patterns: usize,
}

impl FileInfo {
    fn list(config: &Config) -> Vec<Self> {
        config
            .files
            .iter()
            .map(|entry| Self {
                path: entry.path.as_ref().map(|p| p.to_string()),
                kind: entry.kind.as_deref().map(|tag| {
                    FileKind::from_tag(tag).map_or_else(|| tag.to_owned(), |k| k.to_string())
                }),
                needs_description: entry.needs_description.unwrap_or(true),
                patterns: entry.patterns.as_ref().map_or(0, Vec::len),
            })
            .collect()
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
    files: Vec<FileInfo>,
}

/// Print package information.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `cwd` - Current working directory for config discovery
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    cwd: &camino::Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let full_info = FullInfo {
        package: PackageInfo::new(),
        config: ConfigInfo::from_config(config, cwd),
        files: FileInfo::list(config),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full_info)?);
        return Ok(());
    }

    println!(
        "{} {}",
        full_info.package.name.bold(),
        full_info.package.version.green()
    );
    if !full_info.package.description.is_empty() {
        println!("{}", full_info.package.description);
    }
    if !full_info.package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), full_info.package.license);
    }

    println!();
    println!("{}", "Configuration".bold().underline());
    if let Some(ref path) = full_info.config.config_file {
        println!("{}: {}", "Config file".dimmed(), path.cyan());
    } else {
        println!("{}: {}", "Config file".dimmed(), "none loaded".yellow());
    }
    println!("{}: {}", "Log level".dimmed(), full_info.config.log_level);
    if let Some(ref dir) = full_info.config.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }
    println!(
        "{}: {}",
        "Release marker".dimmed(),
        full_info.config.release_marker.cyan()
    );
    println!("{}: {}", "Increment".dimmed(), full_info.config.increment);

    println!();
    println!("{}", "Manifest".bold().underline());
    if full_info.files.is_empty() {
        println!("  {} {}", "○".yellow(), "No files configured".yellow());
    }
    for file in &full_info.files {
        let kind = file.kind.as_deref().unwrap_or("?");
        let path = file.path.as_deref().unwrap_or("(no path)");
        match kind {
            "changelog" if !file.needs_description => {
                println!("  {} {} {}", kind.dimmed(), path.cyan(), "(skipped)".dimmed());
            }
            "changelog" => println!("  {} {}", kind.dimmed(), path.cyan()),
            _ => println!(
                "  {} {} ({} pattern{})",
                kind.dimmed(),
                path.cyan(),
                file.patterns,
                if file.patterns == 1 { "" } else { "s" }
            ),
        }
    }

    Ok(())
}
