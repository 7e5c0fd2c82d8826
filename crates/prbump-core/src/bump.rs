//! Version bump planning and execution.
//!
//! All orchestration logic lives here. The CLI is purely a display layer.
//!
//! # Two-phase workflow
//!
//! 1. **Plan** ([`plan_bump`]): detect the release marker, load the
//!    manifest, extract and increment the version, resolve the changelog
//!    items, and compute every file's new content in memory. Any failure
//!    here leaves the checkout untouched.
//! 2. **Execute** ([`ReadyBump::execute`]): write the staged contents. All
//!    new contents are written to temporary files first and only renamed
//!    over their targets once every temporary file is in place.
//!
//! A pull request whose title lacks the release marker plans to
//! [`BumpPlan::Skipped`] and nothing is read beyond the configuration.

use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use semver::Version;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::changelog::{self, ChangelogEntry, ChangelogError, PullRequest, ReleaseMarker};
use crate::config::Config;
use crate::error::ErrorKind;
use crate::manifest::{CodeSpec, FileKind, FileSpec, Manifest, ManifestError};
use crate::substitute::{self, SubstituteError};
use crate::version::{
    self, BumpLevel, Extracted, Mismatch, VersionError, extract_current_version, find_mismatches,
};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from bump operations.
#[derive(Error, Debug)]
pub enum BumpError {
    /// The manifest is malformed or incomplete.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// No current version could be extracted.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Changelog content could not be resolved or placed.
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// A substitution pattern matched nothing.
    #[error("{source}")]
    Substitute {
        /// The unmatched pattern.
        source: SubstituteError,
        /// Stage the run had reached when patching began.
        reached: BumpStage,
    },

    /// A target file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Manifest path of the file.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A target file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Manifest path of the file.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl BumpError {
    /// The failure's name in the error taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Manifest(_) => ErrorKind::Config,
            Self::Version(VersionError::Overflow { .. }) => ErrorKind::VersionOverflow,
            Self::Version(_) => ErrorKind::VersionNotFound,
            Self::Changelog(ChangelogError::Empty { .. }) => ErrorKind::EmptyChangelog,
            Self::Changelog(ChangelogError::HeaderNotFound { .. }) => ErrorKind::HeaderNotFound,
            Self::Substitute { .. } => ErrorKind::PatternNotMatched,
            Self::Read { .. } | Self::Write { .. } => ErrorKind::Io,
        }
    }

    /// The last stage the run completed before this failure.
    pub const fn stage(&self) -> BumpStage {
        match self {
            Self::Manifest(_) => BumpStage::Idle,
            Self::Version(VersionError::Overflow { .. }) => BumpStage::VersionExtracted,
            Self::Read { .. } | Self::Version(_) => BumpStage::ManifestLoaded,
            Self::Changelog(ChangelogError::Empty { .. }) => BumpStage::VersionIncremented,
            // Entries are only inserted once the changelog items are resolved.
            Self::Changelog(ChangelogError::HeaderNotFound { .. }) => BumpStage::ChangelogResolved,
            Self::Substitute { reached, .. } => *reached,
            Self::Write { .. } => BumpStage::FilesPatched,
        }
    }
}

/// Result alias for bump operations.
pub type BumpResult<T> = Result<T, BumpError>;

/// Pipeline stages, in order. A run either reaches [`BumpStage::Done`] or
/// fails after one of the earlier stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BumpStage {
    /// Nothing done yet.
    Idle,
    /// Manifest validated.
    ManifestLoaded,
    /// Current version found.
    VersionExtracted,
    /// Next version computed.
    VersionIncremented,
    /// Changelog items resolved.
    ChangelogResolved,
    /// New contents staged in memory.
    FilesPatched,
    /// Contents committed to disk.
    Done,
}

impl std::fmt::Display for BumpStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ManifestLoaded => "manifest loaded",
            Self::VersionExtracted => "version extracted",
            Self::VersionIncremented => "version incremented",
            Self::ChangelogResolved => "changelog resolved",
            Self::FilesPatched => "files patched",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

// ──────────────────────────────────────────────
// Plan types
// ──────────────────────────────────────────────

/// Knobs for a bump run.
#[derive(Debug, Clone)]
pub struct BumpOptions {
    /// Date written into the changelog entry.
    pub date: NaiveDate,
}

impl Default for BumpOptions {
    fn default() -> Self {
        Self {
            date: chrono::Local::now().date_naive(),
        }
    }
}

/// The result of planning a bump.
#[derive(Debug)]
pub enum BumpPlan {
    /// The title does not carry the release marker; nothing to do.
    Skipped {
        /// The pull request title.
        title: String,
        /// The marker that was expected.
        marker: String,
    },
    /// Every file's new content is staged and validated.
    Ready(ReadyBump),
}

/// One file's staged rewrite.
///
/// A file listed by several manifest entries gets a single change carrying
/// the result of all of them, applied in manifest order.
#[derive(Debug, Clone)]
pub struct FileChange {
    /// Path as written in the manifest (first entry naming the file).
    pub path: Utf8PathBuf,
    /// Path resolved against the project root.
    pub location: Utf8PathBuf,
    /// Whether a changelog entry was inserted into this file.
    pub changelog: bool,
    /// Content read from disk.
    pub original: String,
    /// Content to be written.
    pub updated: String,
}

impl FileChange {
    /// Whether committing would alter the file.
    pub fn is_modified(&self) -> bool {
        self.original != self.updated
    }
}

/// A fully validated bump, ready to write.
#[derive(Debug, Clone)]
pub struct ReadyBump {
    /// Version found in the code files.
    pub previous: Version,
    /// Version being written.
    pub next: Version,
    /// Increment policy applied.
    pub increment: BumpLevel,
    /// File and pattern the previous version was read from.
    pub source: Extracted,
    /// The new changelog entry, when any manifest entry needs one.
    pub entry: Option<ChangelogEntry>,
    /// Staged rewrites, one per distinct file, in manifest order.
    pub changes: Vec<FileChange>,
    /// Changelogs left alone because `needs_description` is `false`.
    pub skipped: Vec<String>,
    /// Redundant version occurrences that disagreed with `previous`.
    pub mismatches: Vec<Mismatch>,
}

/// The version a manifest currently describes.
#[derive(Debug, Clone, Serialize)]
pub struct VersionReport {
    /// Current version.
    pub current: Version,
    /// Version the next bump would write.
    pub next: Version,
    /// Increment policy.
    pub increment: BumpLevel,
    /// Manifest path the current version was read from.
    pub source: String,
    /// Redundant occurrences that disagree with `current`.
    pub mismatches: Vec<Mismatch>,
}

// ──────────────────────────────────────────────
// Plan
// ──────────────────────────────────────────────

/// Plan a version bump for a pull request.
///
/// # Arguments
/// * `project_root` - directory manifest paths resolve against
/// * `config` - loaded configuration carrying the manifest
/// * `pr` - pull request title and description
/// * `options` - run options (changelog date)
#[instrument(skip(config, pr, options), fields(%project_root, title = %pr.title))]
pub fn plan_bump(
    project_root: &Utf8Path,
    config: &Config,
    pr: &PullRequest,
    options: &BumpOptions,
) -> BumpResult<BumpPlan> {
    let marker = ReleaseMarker::new(config.release_marker());
    if !marker.is_release(&pr.title) {
        info!(marker = marker.as_str(), "not a release pull request, skipping");
        return Ok(BumpPlan::Skipped {
            title: pr.title.clone(),
            marker: marker.as_str().to_owned(),
        });
    }

    let manifest = Manifest::from_config(config, project_root)?;
    let contents = read_all(&manifest)?;

    let source = extract_current_version(code_sources(&manifest, &contents))?;
    let previous = source.version.clone();
    let next = version::next_version(&previous, manifest.increment)?;
    info!(%previous, %next, increment = %manifest.increment, "version computed");

    let entry = if manifest.needs_description() {
        let items = changelog::resolve_items(pr, &marker)?;
        Some(ChangelogEntry {
            version: next.clone(),
            date: options.date,
            items,
        })
    } else {
        debug!("no manifest entry needs a description");
        None
    };

    let reached = if entry.is_some() {
        BumpStage::ChangelogResolved
    } else {
        BumpStage::VersionIncremented
    };

    let mut changes = Vec::with_capacity(manifest.files.len());
    let mut skipped = Vec::new();
    let mut mismatches = Vec::new();

    for (spec, original) in manifest.files.iter().zip(contents) {
        let slot = changes
            .iter()
            .position(|c: &FileChange| c.location == spec.location());
        let current = slot.map_or(original.as_str(), |i| changes[i].updated.as_str());

        let updated = match spec {
            FileSpec::Code(code) => {
                let found = find_mismatches(code, &original, &previous);
                for m in &found {
                    warn!(
                        path = %m.path,
                        pattern = %m.pattern,
                        found = %m.found,
                        expected = %m.expected,
                        "redundant version occurrence disagrees"
                    );
                }
                mismatches.extend(found);
                substitute::apply_patterns(code.path.as_str(), current, &code.patterns, &next)
                    .map_err(|source| BumpError::Substitute { source, reached })?
            }
            FileSpec::Changelog(log) => match entry.as_ref() {
                Some(entry) if log.needs_description => changelog::insert_entry(
                    log.path.as_str(),
                    current,
                    &log.header_pattern,
                    entry,
                )?,
                _ => {
                    debug!(path = %log.path, "changelog does not need a description, skipping");
                    skipped.push(log.path.to_string());
                    continue;
                }
            },
        };

        let is_changelog = spec.kind() == FileKind::Changelog;
        match slot {
            Some(i) => {
                changes[i].updated = updated;
                changes[i].changelog |= is_changelog;
            }
            None => changes.push(FileChange {
                path: spec.path().to_path_buf(),
                location: spec.location().to_path_buf(),
                changelog: is_changelog,
                original,
                updated,
            }),
        }
    }

    debug!(staged = changes.len(), skipped = skipped.len(), "all files patched in memory");

    Ok(BumpPlan::Ready(ReadyBump {
        previous,
        next,
        increment: manifest.increment,
        source,
        entry,
        changes,
        skipped,
        mismatches,
    }))
}

/// Report the current and next version without touching any file.
#[instrument(skip(config), fields(%project_root))]
pub fn inspect_version(project_root: &Utf8Path, config: &Config) -> BumpResult<VersionReport> {
    let manifest = Manifest::from_config(config, project_root)?;
    let contents = read_all(&manifest)?;
    let source = extract_current_version(code_sources(&manifest, &contents))?;

    let mismatches = manifest
        .files
        .iter()
        .zip(&contents)
        .filter_map(|(spec, content)| match spec {
            FileSpec::Code(code) => Some(find_mismatches(code, content, &source.version)),
            FileSpec::Changelog(_) => None,
        })
        .flatten()
        .collect();

    Ok(VersionReport {
        next: version::next_version(&source.version, manifest.increment)?,
        current: source.version,
        increment: manifest.increment,
        source: source.path,
        mismatches,
    })
}

fn read_all(manifest: &Manifest) -> BumpResult<Vec<String>> {
    manifest
        .files
        .iter()
        .map(|spec| {
            fs::read_to_string(spec.location()).map_err(|source| BumpError::Read {
                path: spec.path().to_string(),
                source,
            })
        })
        .collect()
}

fn code_sources<'a>(
    manifest: &'a Manifest,
    contents: &'a [String],
) -> impl Iterator<Item = (&'a CodeSpec, &'a str)> {
    manifest
        .files
        .iter()
        .zip(contents)
        .filter_map(|(spec, content)| match spec {
            FileSpec::Code(code) => Some((code, content.as_str())),
            FileSpec::Changelog(_) => None,
        })
}

// ──────────────────────────────────────────────
// Execute
// ──────────────────────────────────────────────

/// Result of a bump, executed or dry-run.
#[derive(Debug, Clone, Serialize)]
pub struct BumpOutcome {
    /// The previous version.
    pub previous: Version,
    /// The new version.
    pub new: Version,
    /// Increment policy applied.
    pub increment: BumpLevel,
    /// Changelog items written (empty when no entry was needed).
    pub items: Vec<String>,
    /// Whether any changelog received the new entry.
    pub changelog_updated: bool,
    /// Files that were (or, in a dry run, would be) modified.
    pub modified_files: Vec<String>,
    /// Changelogs skipped because they need no description.
    pub skipped_files: Vec<String>,
    /// Redundant version occurrences that disagreed.
    pub mismatches: Vec<Mismatch>,
    /// Whether files were left untouched.
    pub dry_run: bool,
}

impl ReadyBump {
    /// Files whose content would change.
    pub fn modified(&self) -> impl Iterator<Item = &FileChange> {
        self.changes.iter().filter(|c| c.is_modified())
    }

    /// Summarize the plan without writing anything.
    pub fn preview(&self) -> BumpOutcome {
        self.outcome(true)
    }

    /// Write every staged change, all or nothing.
    ///
    /// New contents go to temporary files beside their targets first. If any
    /// of those writes fails, the temporaries are removed and no target is
    /// touched. Only then are they renamed over the targets.
    #[instrument(skip(self), fields(next = %self.next))]
    pub fn execute(&self) -> BumpResult<BumpOutcome> {
        let staged = self
            .modified()
            .map(|change| stage_file(change).map(|temp| (change, temp)))
            .collect::<BumpResult<Vec<_>>>()?;

        for (change, temp) in staged {
            temp.persist(&change.location)
                .map_err(|e| BumpError::Write {
                    path: change.path.to_string(),
                    source: e.error,
                })?;
            debug!(path = %change.path, "file written");
        }

        let outcome = self.outcome(false);
        info!(
            previous = %outcome.previous,
            new = %outcome.new,
            changelog_updated = outcome.changelog_updated,
            files = outcome.modified_files.len(),
            "bump complete"
        );
        Ok(outcome)
    }

    fn outcome(&self, dry_run: bool) -> BumpOutcome {
        BumpOutcome {
            previous: self.previous.clone(),
            new: self.next.clone(),
            increment: self.increment,
            items: self
                .entry
                .as_ref()
                .map(|e| e.items.clone())
                .unwrap_or_default(),
            changelog_updated: self.modified().any(|c| c.changelog),
            modified_files: self.modified().map(|c| c.path.to_string()).collect(),
            skipped_files: self.skipped.clone(),
            mismatches: self.mismatches.clone(),
            dry_run,
        }
    }
}

/// Write a change's new content to a temporary file in the target's directory.
fn stage_file(change: &FileChange) -> BumpResult<NamedTempFile> {
    let write_err = |source| BumpError::Write {
        path: change.path.to_string(),
        source,
    };
    let dir = change
        .location
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));

    let mut temp = tempfile::Builder::new()
        .prefix(".prbump-")
        .tempfile_in(dir)
        .map_err(write_err)?;
    temp.write_all(change.updated.as_bytes()).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;

    let permissions = fs::metadata(&change.location).map_err(write_err)?.permissions();
    temp.as_file().set_permissions(permissions).map_err(write_err)?;

    Ok(temp)
}
