//! Pattern substitution for code files.
//!
//! Each pattern replaces the first match of its `search` regex. A pattern
//! that matches nothing is an error: it means the file has drifted from
//! what the manifest expects.

use regex::Regex;
use semver::Version;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::manifest::Pattern;

/// Placeholder expanded to the new version inside replacement templates.
pub const NEW_VERSION_PLACEHOLDER: &str = "{{new_version}}";

/// Errors from pattern substitution.
#[derive(Error, Debug)]
pub enum SubstituteError {
    /// A pattern matched nothing in the file.
    #[error("pattern '{pattern}' matched nothing in {path}")]
    PatternNotMatched {
        /// Manifest path of the file.
        path: String,
        /// Source of the pattern.
        pattern: String,
    },
}

/// Expand the placeholder in a replacement template.
///
/// The result is still a regex replacement string: `${1}` refers to a
/// capture group and `$$` is a literal dollar sign.
pub fn expand_template(template: &str, new_version: &Version) -> String {
    template.replace(NEW_VERSION_PLACEHOLDER, &new_version.to_string())
}

/// Replace the first match of `search` in `content`.
///
/// Returns `None` when the regex does not match.
pub fn replace_first(content: &str, search: &Regex, replacement: &str) -> Option<String> {
    if !search.is_match(content) {
        return None;
    }
    Some(search.replacen(content, 1, replacement).into_owned())
}

/// Apply every pattern to `content`, in declared order.
///
/// `path` is only used for diagnostics.
#[instrument(skip(content, patterns), fields(pattern_count = patterns.len()))]
pub fn apply_patterns(
    path: &str,
    content: &str,
    patterns: &[Pattern],
    new_version: &Version,
) -> Result<String, SubstituteError> {
    let mut current = content.to_owned();

    for pattern in patterns {
        let replacement = expand_template(&pattern.replace, new_version);
        current = replace_first(&current, &pattern.search, &replacement).ok_or_else(|| {
            SubstituteError::PatternNotMatched {
                path: path.to_owned(),
                pattern: pattern.search.as_str().to_owned(),
            }
        })?;
        debug!(pattern = pattern.search.as_str(), "pattern applied");
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(search: &str, replace: &str) -> Pattern {
        Pattern {
            search: Regex::new(search).unwrap(),
            replace: replace.to_owned(),
        }
    }

    #[test]
    fn rewrites_header_version() {
        let content = " * Version:           2.0.28\n";
        let patterns = [pattern(
            r"Version:\s+([0-9]+\.[0-9]+\.[0-9]+)",
            "Version:           {{new_version}}",
        )];
        let out = apply_patterns("plugin.php", content, &patterns, &Version::new(2, 0, 29)).unwrap();
        assert!(out.contains("Version:           2.0.29"));
        assert!(!out.contains("2.0.28"));
    }

    #[test]
    fn applies_patterns_in_order() {
        let content = "Version: 1.0.0\ndefine( 'X_VERSION', '1.0.0' );\n";
        let patterns = [
            pattern(r"Version: [0-9.]+", "Version: {{new_version}}"),
            pattern(r"'X_VERSION', '[0-9.]+'", "'X_VERSION', '{{new_version}}'"),
        ];
        let out = apply_patterns("x.php", content, &patterns, &Version::new(1, 0, 1)).unwrap();
        assert_eq!(out, "Version: 1.0.1\ndefine( 'X_VERSION', '1.0.1' );\n");
    }

    #[test]
    fn replaces_only_first_match() {
        let content = "v=1.0.0\nv=1.0.0\n";
        let patterns = [pattern(r"v=[0-9.]+", "v={{new_version}}")];
        let out = apply_patterns("x", content, &patterns, &Version::new(1, 0, 1)).unwrap();
        assert_eq!(out, "v=1.0.1\nv=1.0.0\n");
    }

    #[test]
    fn capture_references_are_expanded() {
        let content = "const VERSION = \"0.3.9\";";
        let patterns = [pattern(
            r#"(const VERSION = ")[0-9.]+(")"#,
            "${1}{{new_version}}${2}",
        )];
        let out = apply_patterns("x.js", content, &patterns, &Version::new(0, 3, 10)).unwrap();
        assert_eq!(out, "const VERSION = \"0.3.10\";");
    }

    #[test]
    fn unmatched_pattern_fails() {
        let patterns = [pattern(r"Stable tag: [0-9.]+", "Stable tag: {{new_version}}")];
        let err = apply_patterns("readme.txt", "nothing here", &patterns, &Version::new(1, 0, 0))
            .unwrap_err();
        let SubstituteError::PatternNotMatched { path, pattern } = err;
        assert_eq!(path, "readme.txt");
        assert_eq!(pattern, r"Stable tag: [0-9.]+");
    }

    #[test]
    fn later_unmatched_pattern_fails_whole_file() {
        let content = "Version: 1.0.0\n";
        let patterns = [
            pattern(r"Version: [0-9.]+", "Version: {{new_version}}"),
            pattern(r"missing", "x"),
        ];
        assert!(apply_patterns("x", content, &patterns, &Version::new(1, 0, 1)).is_err());
    }
}
