//! Current-version extraction from code files.
//!
//! The authoritative version is the first plain `MAJOR.MINOR.PATCH` captured
//! by a manifest pattern, scanning code files and their patterns in manifest
//! order. Other patterns that also capture a version are redundant copies;
//! [`find_mismatches`] reports any that disagree.

use regex::Regex;
use semver::Version;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::manifest::CodeSpec;
use crate::version::{VersionError, VersionResult, is_plain_version, parse_version};

/// Where the authoritative version was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// The version found.
    pub version: Version,
    /// Manifest path of the file it came from.
    pub path: String,
    /// Source of the pattern that captured it.
    pub pattern: String,
}

/// A redundant version occurrence that disagrees with the authoritative one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Manifest path of the file.
    pub path: String,
    /// Source of the pattern that captured the occurrence.
    pub pattern: String,
    /// The version string found there.
    pub found: String,
    /// The authoritative version.
    pub expected: String,
}

/// Return the first plain version captured by `search` in `content`.
///
/// Patterns without capture groups never yield a version.
pub fn capture_version<'c>(search: &Regex, content: &'c str) -> Option<&'c str> {
    if search.captures_len() < 2 {
        return None;
    }
    let caps = search.captures(content)?;
    caps.iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str())
        .find(|s| is_plain_version(s))
}

/// Extract the current version from code files, in manifest order.
///
/// `sources` pairs each code spec with its file content.
#[instrument(skip_all)]
pub fn extract_current_version<'a, I>(sources: I) -> VersionResult<Extracted>
where
    I: IntoIterator<Item = (&'a CodeSpec, &'a str)>,
{
    let mut searched = Vec::new();

    for (spec, content) in sources {
        for pattern in &spec.patterns {
            if let Some(found) = capture_version(&pattern.search, content)
                && let Ok(version) = parse_version(found)
            {
                debug!(%version, path = %spec.path, pattern = pattern.search.as_str(), "current version");
                return Ok(Extracted {
                    version,
                    path: spec.path.to_string(),
                    pattern: pattern.search.as_str().to_owned(),
                });
            }
        }
        searched.push(spec.path.to_string());
    }

    Err(VersionError::NotFound { searched })
}

/// Check every version-capturing pattern of `spec` against `expected`.
pub fn find_mismatches(spec: &CodeSpec, content: &str, expected: &Version) -> Vec<Mismatch> {
    let expected_str = expected.to_string();
    spec.patterns
        .iter()
        .filter_map(|pattern| {
            let found = capture_version(&pattern.search, content)?;
            let agrees = parse_version(found).is_ok_and(|v| v == *expected);
            (!agrees).then(|| Mismatch {
                path: spec.path.to_string(),
                pattern: pattern.search.as_str().to_owned(),
                found: found.to_owned(),
                expected: expected_str.clone(),
            })
        })
        .collect()
}
