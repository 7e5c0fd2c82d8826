//! Changelog items from the pull request description or title.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ChangelogError, ChangelogResult};

/// Completed checklist line: `- [x] text` (also `*` bullets and `[X]`).
static CHECKED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*[-*][ \t]+\[[xX]\][ \t]+(\S.*?)[ \t]*\r?$")
        .expect("valid checklist regex")
});

/// The pull request text the run is driven by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull request title.
    pub title: String,
    /// Pull request description (markdown).
    pub body: String,
}

impl PullRequest {
    /// Create from title and body.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// The bracketed tag marking a release pull request, matched case-insensitively.
#[derive(Debug, Clone)]
pub struct ReleaseMarker {
    marker: String,
    prefix: Regex,
    anywhere: Regex,
}

impl ReleaseMarker {
    /// Build a matcher for `marker` (taken literally, not as a regex).
    pub fn new(marker: &str) -> Self {
        let escaped = regex::escape(marker);
        let build = |pattern: &str| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("escaped marker is a valid regex")
        };
        Self {
            marker: marker.to_owned(),
            prefix: build(&format!(r"^\s*{escaped}")),
            anywhere: build(&escaped),
        }
    }

    /// The marker text as configured.
    pub fn as_str(&self) -> &str {
        &self.marker
    }

    /// Whether `title` starts with the marker.
    pub fn is_release(&self, title: &str) -> bool {
        self.prefix.is_match(title)
    }

    /// Remove every occurrence of the marker and trim the result.
    pub fn strip(&self, title: &str) -> String {
        self.anywhere.replace_all(title, "").trim().to_owned()
    }
}

/// Extract the text of every completed checklist item, in source order.
pub fn checked_items(body: &str) -> Vec<String> {
    CHECKED_ITEM
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolve the changelog items for this pull request.
///
/// Completed checklist items win; otherwise the title minus the marker is
/// the single item. An empty result is an error.
#[instrument(skip_all, fields(title = %pr.title))]
pub fn resolve_items(pr: &PullRequest, marker: &ReleaseMarker) -> ChangelogResult<Vec<String>> {
    let items = checked_items(&pr.body);
    if !items.is_empty() {
        debug!(count = items.len(), "using completed checklist items");
        return Ok(items);
    }

    let title = marker.strip(&pr.title);
    if title.is_empty() {
        return Err(ChangelogError::Empty {
            marker: marker.as_str().to_owned(),
        });
    }
    debug!("no checklist items, using pull request title");
    Ok(vec![title])
}
