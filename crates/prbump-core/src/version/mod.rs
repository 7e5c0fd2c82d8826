//! Version parsing, extraction, and increment.
//!
//! Versions are plain `MAJOR.MINOR.PATCH` triples held as [`semver::Version`].
//! Pre-release and build metadata are rejected: the files this tool patches
//! only ever carry the three numeric components. Components are read as
//! integers, so `2.0.08` is `2.0.8`.

pub mod extract;

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use extract::{Extracted, Mismatch, extract_current_version, find_mismatches};

/// Errors from version operations.
#[derive(Error, Debug)]
pub enum VersionError {
    /// The string is not a plain `MAJOR.MINOR.PATCH` triple.
    #[error("invalid version '{0}': expected MAJOR.MINOR.PATCH")]
    InvalidFormat(String),

    /// No code file yielded a version.
    #[error("no version found in code files: {}", .searched.join(", "))]
    NotFound {
        /// Code files that were scanned, in manifest order.
        searched: Vec<String>,
    },

    /// Incrementing would overflow a component.
    #[error("cannot apply a {level} increment to {version}: component overflows")]
    Overflow {
        /// The version being incremented.
        version: Version,
        /// The requested bump level.
        level: BumpLevel,
    },
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Semver bump level (the increment policy).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    /// Patch release (x.y.Z).
    #[default]
    Patch,
    /// Minor release (x.Y.0).
    Minor,
    /// Major release (X.0.0).
    Major,
}

impl std::fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

static PLAIN_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)\.([0-9]+)\.([0-9]+)$").expect("valid version regex")
});

/// Compute the next version by applying a bump level.
pub fn next_version(current: &Version, level: BumpLevel) -> VersionResult<Version> {
    let next = match level {
        BumpLevel::Patch => current
            .patch
            .checked_add(1)
            .map(|patch| Version::new(current.major, current.minor, patch)),
        BumpLevel::Minor => current
            .minor
            .checked_add(1)
            .map(|minor| Version::new(current.major, minor, 0)),
        BumpLevel::Major => current
            .major
            .checked_add(1)
            .map(|major| Version::new(major, 0, 0)),
    };
    next.ok_or_else(|| VersionError::Overflow {
        version: current.clone(),
        level,
    })
}

/// Parse a plain version string, stripping an optional `v` prefix.
pub fn parse_version(s: &str) -> VersionResult<Version> {
    let s = s.trim();
    let s = s.strip_prefix('v').unwrap_or(s);
    let invalid = || VersionError::InvalidFormat(s.to_owned());
    let caps = PLAIN_VERSION.captures(s).ok_or_else(invalid)?;
    let component = |i: usize| caps[i].parse::<u64>().map_err(|_| invalid());
    Ok(Version::new(component(1)?, component(2)?, component(3)?))
}

/// Whether `s` is a plain version triple whose components fit in a `u64`.
pub fn is_plain_version(s: &str) -> bool {
    PLAIN_VERSION.is_match(s) && parse_version(s).is_ok()
}
