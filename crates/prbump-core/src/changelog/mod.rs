//! Changelog content: resolving items from the pull request and writing
//! the new entry into changelog files.

pub mod resolve;
pub mod write;

use chrono::NaiveDate;
use semver::Version;
use serde::Serialize;
use thiserror::Error;

pub use resolve::{PullRequest, ReleaseMarker, resolve_items};
pub use write::insert_entry;

/// Errors from changelog resolution and writing.
#[derive(Error, Debug)]
pub enum ChangelogError {
    /// Neither completed checklist items nor the title yielded any text.
    #[error("no changelog content: no completed checklist items and the title is empty after removing '{marker}'")]
    Empty {
        /// The release marker that was stripped from the title.
        marker: String,
    },

    /// The changelog header was not found.
    #[error("header pattern '{pattern}' not found in {path}")]
    HeaderNotFound {
        /// Manifest path of the changelog.
        path: String,
        /// Source of the header regex.
        pattern: String,
    },
}

/// Result alias for changelog operations.
pub type ChangelogResult<T> = Result<T, ChangelogError>;

/// A versioned block of changelog items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelogEntry {
    /// The version being released.
    pub version: Version,
    /// Release date.
    pub date: NaiveDate,
    /// Items, in source order.
    pub items: Vec<String>,
}

impl ChangelogEntry {
    /// Render the entry as lines terminated by `eol`, followed by a blank line.
    ///
    /// ```text
    /// 1.2.4 (2026-10-18)
    /// - First item
    ///
    /// ```
    pub fn render(&self, eol: &str) -> String {
        let mut out = format!("{} ({}){eol}", self.version, self.date.format("%Y-%m-%d"));
        for item in &self.items {
            out.push_str("- ");
            out.push_str(item);
            out.push_str(eol);
        }
        out.push_str(eol);
        out
    }
}
