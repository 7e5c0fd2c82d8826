//! Manifest loading: turn raw config entries into validated file specs.
//!
//! The manifest is the ordered `files` list plus the increment policy.
//! Validation happens up front so that a broken manifest fails before any
//! file is read for patching.

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::{Config, FileEntry, PatternEntry};
use crate::version::BumpLevel;

/// Errors from manifest validation.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest lists no files.
    #[error("manifest lists no files")]
    NoFiles,

    /// A required field is absent from an entry.
    #[error("files[{index}]{}: missing `{field}`", display_path(.path))]
    MissingField {
        /// Position of the entry in `files`.
        index: usize,
        /// The entry's path, when it has one.
        path: Option<String>,
        /// Name of the missing field.
        field: &'static str,
    },

    /// The `type` tag is not one of `code`, `php` or `changelog`.
    #[error("files[{index}] ({path}): unknown type '{tag}' (expected code, php or changelog)")]
    UnknownType {
        /// Position of the entry in `files`.
        index: usize,
        /// The entry's path.
        path: String,
        /// The tag as written.
        tag: String,
    },

    /// A code entry declares an empty pattern list.
    #[error("files[{index}] ({path}): `patterns` must not be empty")]
    EmptyPatterns {
        /// Position of the entry in `files`.
        index: usize,
        /// The entry's path.
        path: String,
    },

    /// A regex failed to compile.
    #[error("files[{index}] ({path}): invalid regex '{pattern}': {source}")]
    InvalidRegex {
        /// Position of the entry in `files`.
        index: usize,
        /// The entry's path.
        path: String,
        /// The offending regex source.
        pattern: String,
        /// Compilation error.
        source: regex::Error,
    },

    /// A listed file does not exist.
    #[error("files[{index}] ({path}): file does not exist")]
    MissingFile {
        /// Position of the entry in `files`.
        index: usize,
        /// The entry's path.
        path: String,
    },
}

fn display_path(path: &Option<String>) -> String {
    path.as_ref().map(|p| format!(" ({p})")).unwrap_or_default()
}

/// Result alias for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Manifest entry type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A source file carrying version strings.
    Code,
    /// A changelog receiving a new entry.
    Changelog,
}

impl FileKind {
    /// Parse a manifest `type` tag. `php` is an alias for `code`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "code" | "php" => Some(Self::Code),
            "changelog" => Some(Self::Changelog),
            _ => None,
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code => write!(f, "code"),
            Self::Changelog => write!(f, "changelog"),
        }
    }
}

/// A compiled search/replace pair.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Regex located in the file content.
    pub search: Regex,
    /// Replacement template (may contain [`crate::substitute::NEW_VERSION_PLACEHOLDER`]).
    pub replace: String,
}

/// A code file and the patterns that rewrite its version strings.
#[derive(Debug, Clone)]
pub struct CodeSpec {
    /// Path as written in the manifest.
    pub path: Utf8PathBuf,
    /// Path resolved against the project root.
    pub location: Utf8PathBuf,
    /// Whether this entry asks for a changelog description.
    pub needs_description: bool,
    /// Patterns, applied in order. Never empty.
    pub patterns: Vec<Pattern>,
}

/// A changelog file and the header marking where entries go.
#[derive(Debug, Clone)]
pub struct ChangelogSpec {
    /// Path as written in the manifest.
    pub path: Utf8PathBuf,
    /// Path resolved against the project root.
    pub location: Utf8PathBuf,
    /// When `false`, the changelog is left untouched.
    pub needs_description: bool,
    /// Header regex; new entries go below it.
    pub header_pattern: Regex,
}

/// One validated manifest entry.
#[derive(Debug, Clone)]
pub enum FileSpec {
    /// See [`CodeSpec`].
    Code(CodeSpec),
    /// See [`ChangelogSpec`].
    Changelog(ChangelogSpec),
}

impl FileSpec {
    /// Path as written in the manifest.
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Code(spec) => &spec.path,
            Self::Changelog(spec) => &spec.path,
        }
    }

    /// Path resolved against the project root.
    pub fn location(&self) -> &Utf8Path {
        match self {
            Self::Code(spec) => &spec.location,
            Self::Changelog(spec) => &spec.location,
        }
    }

    /// The entry's type tag.
    pub const fn kind(&self) -> FileKind {
        match self {
            Self::Code(_) => FileKind::Code,
            Self::Changelog(_) => FileKind::Changelog,
        }
    }

    /// Whether this entry asks for a changelog description.
    pub const fn needs_description(&self) -> bool {
        match self {
            Self::Code(spec) => spec.needs_description,
            Self::Changelog(spec) => spec.needs_description,
        }
    }
}

/// The validated manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// File specs, in manifest order.
    pub files: Vec<FileSpec>,
    /// Increment policy.
    pub increment: BumpLevel,
}

impl Manifest {
    /// Validate the manifest section of a loaded [`Config`].
    ///
    /// Paths are resolved against `root` and must exist.
    #[instrument(skip(config), fields(%root, entries = config.files.len()))]
    pub fn from_config(config: &Config, root: &Utf8Path) -> ManifestResult<Self> {
        if config.files.is_empty() {
            return Err(ManifestError::NoFiles);
        }

        let files = config
            .files
            .iter()
            .enumerate()
            .map(|(index, entry)| build_spec(index, entry, root))
            .collect::<ManifestResult<Vec<_>>>()?;

        debug!(files = files.len(), "manifest loaded");

        Ok(Self {
            files,
            increment: config.increment(),
        })
    }

    /// Whether any entry asks for a changelog description.
    pub fn needs_description(&self) -> bool {
        self.files.iter().any(FileSpec::needs_description)
    }
}

fn build_spec(index: usize, entry: &FileEntry, root: &Utf8Path) -> ManifestResult<FileSpec> {
    let path = entry.path.clone().ok_or(ManifestError::MissingField {
        index,
        path: None,
        field: "path",
    })?;
    let path_str = path.to_string();
    let tag = entry
        .kind
        .as_deref()
        .ok_or_else(|| ManifestError::MissingField {
            index,
            path: Some(path_str.clone()),
            field: "type",
        })?;
    let kind = FileKind::from_tag(tag).ok_or_else(|| ManifestError::UnknownType {
        index,
        path: path_str.clone(),
        tag: tag.to_owned(),
    })?;
    let needs_description = entry.needs_description.unwrap_or(true);

    let spec = match kind {
        FileKind::Code => {
            let raw = entry
                .patterns
                .as_ref()
                .ok_or_else(|| ManifestError::MissingField {
                    index,
                    path: Some(path_str.clone()),
                    field: "patterns",
                })?;
            if raw.is_empty() {
                return Err(ManifestError::EmptyPatterns {
                    index,
                    path: path_str,
                });
            }
            let patterns = raw
                .iter()
                .map(|p| build_pattern(index, &path_str, p))
                .collect::<ManifestResult<Vec<_>>>()?;
            FileSpec::Code(CodeSpec {
                location: root.join(&path),
                path,
                needs_description,
                patterns,
            })
        }
        FileKind::Changelog => {
            let header = entry
                .header_pattern
                .as_deref()
                .ok_or_else(|| ManifestError::MissingField {
                    index,
                    path: Some(path_str.clone()),
                    field: "header_pattern",
                })?;
            FileSpec::Changelog(ChangelogSpec {
                header_pattern: compile(index, &path_str, header)?,
                location: root.join(&path),
                path,
                needs_description,
            })
        }
    };

    if !spec.location().is_file() {
        return Err(ManifestError::MissingFile {
            index,
            path: path_str,
        });
    }

    Ok(spec)
}

fn build_pattern(index: usize, path: &str, raw: &PatternEntry) -> ManifestResult<Pattern> {
    let missing = |field| ManifestError::MissingField {
        index,
        path: Some(path.to_owned()),
        field,
    };
    let search = raw.search.as_deref().ok_or_else(|| missing("search"))?;
    let replace = raw.replace.clone().ok_or_else(|| missing("replace"))?;
    Ok(Pattern {
        search: compile(index, path, search)?,
        replace,
    })
}

fn compile(index: usize, path: &str, pattern: &str) -> ManifestResult<Regex> {
    Regex::new(pattern).map_err(|source| ManifestError::InvalidRegex {
        index,
        path: path.to_owned(),
        pattern: pattern.to_owned(),
        source,
    })
}
