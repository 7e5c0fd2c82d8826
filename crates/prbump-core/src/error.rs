//! Error types for prbump-core.
//!
//! Each pipeline module owns its own error enum. This module holds the
//! configuration error and [`ErrorKind`], the stable name every failure is
//! reported under.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// The failure taxonomy surfaced to the triggering platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Malformed or incomplete manifest.
    #[serde(rename = "ConfigError")]
    Config,
    /// No extractable version in any code file.
    #[serde(rename = "VersionNotFoundError")]
    VersionNotFound,
    /// The next version does not fit the numeric range of a component.
    #[serde(rename = "VersionOverflowError")]
    VersionOverflow,
    /// Neither checklist nor title produced changelog content.
    #[serde(rename = "EmptyChangelogError")]
    EmptyChangelog,
    /// A declared substitution pattern matched nothing.
    #[serde(rename = "PatternNotMatchedError")]
    PatternNotMatched,
    /// Changelog insertion point absent.
    #[serde(rename = "HeaderNotFoundError")]
    HeaderNotFound,
    /// Reading or writing a target file failed.
    #[serde(rename = "IoError")]
    Io,
}

impl ErrorKind {
    /// Stable name used in diagnostics and JSON output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "ConfigError",
            Self::VersionNotFound => "VersionNotFoundError",
            Self::VersionOverflow => "VersionOverflowError",
            Self::EmptyChangelog => "EmptyChangelogError",
            Self::PatternNotMatched => "PatternNotMatchedError",
            Self::HeaderNotFound => "HeaderNotFoundError",
            Self::Io => "IoError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_matches_serialized_name() {
        for kind in [
            ErrorKind::Config,
            ErrorKind::VersionNotFound,
            ErrorKind::VersionOverflow,
            ErrorKind::EmptyChangelog,
            ErrorKind::PatternNotMatched,
            ErrorKind::HeaderNotFound,
            ErrorKind::Io,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn config_error_display() {
        assert_eq!(ConfigError::NotFound.to_string(), "no configuration file found");
    }
}
