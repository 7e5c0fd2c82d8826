//! Inserting a new entry below a changelog header.
//!
//! The header is located by matching the header regex against each line
//! joined with the line after it, so two-line headers such as
//!
//! ```text
//! Changelog
//! =========
//! ```
//!
//! match a pattern like `Changelog\n=+`. The new entry goes before the first
//! existing `X.Y.Z (YYYY-MM-DD)` line below the header, or, when there is
//! none, after the header and any blank lines that follow it. Everything
//! else in the file is kept byte for byte.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use super::{ChangelogEntry, ChangelogError, ChangelogResult};

static ENTRY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+ \([0-9]{4}-[0-9]{2}-[0-9]{2}\)")
        .expect("valid entry heading regex")
});

/// Index of the last header line, if the header is present.
///
/// A header match may start on one line and run into the next.
fn find_header_end(lines: &[&str], header: &Regex) -> Option<usize> {
    for (i, line) in lines.iter().enumerate() {
        let Some(next) = lines.get(i + 1) else {
            return header.is_match(line).then_some(i);
        };
        let joined = format!("{line}{next}");
        if let Some(m) = header.find(&joined)
            && m.start() < line.len()
        {
            return Some(if m.end() <= line.len() { i } else { i + 1 });
        }
    }
    None
}

/// Line index at which the new entry is inserted.
fn insertion_index(lines: &[&str], header_end: usize) -> usize {
    let below = header_end + 1;
    if let Some(offset) = lines[below..]
        .iter()
        .position(|line| ENTRY_HEADING.is_match(line))
    {
        return below + offset;
    }
    below
        + lines[below..]
            .iter()
            .take_while(|line| line.trim().is_empty())
            .count()
}

/// Line ending used by the file, judged from its first line.
fn line_ending(lines: &[&str]) -> &'static str {
    match lines.first() {
        Some(line) if line.ends_with("\r\n") => "\r\n",
        _ => "\n",
    }
}

/// Insert `entry` into changelog `content`.
///
/// `path` is only used for diagnostics.
#[instrument(skip(content, header, entry), fields(version = %entry.version))]
pub fn insert_entry(
    path: &str,
    content: &str,
    header: &Regex,
    entry: &ChangelogEntry,
) -> ChangelogResult<String> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();

    let header_end =
        find_header_end(&lines, header).ok_or_else(|| ChangelogError::HeaderNotFound {
            path: path.to_owned(),
            pattern: header.as_str().to_owned(),
        })?;
    let at = insertion_index(&lines, header_end);
    debug!(header_end, at, "inserting changelog entry");

    let eol = line_ending(&lines);
    let block = entry.render(eol);

    let mut out = String::with_capacity(content.len() + block.len() + eol.len());
    for line in &lines[..at] {
        out.push_str(line);
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push_str(eol);
    }
    out.push_str(&block);
    for line in &lines[at..] {
        out.push_str(line);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use semver::Version;

    fn entry(items: &[&str]) -> ChangelogEntry {
        ChangelogEntry {
            version: Version::new(2, 0, 29),
            date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            items: items.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    fn header() -> Regex {
        Regex::new(r"Changelog\n=========").unwrap()
    }

    const PRIOR: &str = "2.0.28 (2026-09-01)\n- Older change\n";

    #[test]
    fn new_entry_goes_before_prior_entry() {
        let content = format!("Changelog\n=========\n\n{PRIOR}");
        let out = insert_entry("CHANGELOG.txt", &content, &header(), &entry(&["New thing"])).unwrap();

        assert_eq!(
            out,
            format!("Changelog\n=========\n\n2.0.29 (2026-10-18)\n- New thing\n\n{PRIOR}")
        );
        let new_at = out.find("2.0.29").unwrap();
        let old_at = out.find("2.0.28").unwrap();
        assert!(new_at < old_at);
        assert!(out.ends_with(PRIOR));
    }

    #[test]
    fn preamble_and_trailer_untouched() {
        let content = format!("My Plugin\n\nChangelog\n=========\n\n{PRIOR}\n1.0.0 (2020-01-01)\n- First\n");
        let out = insert_entry("c", &content, &header(), &entry(&["x"])).unwrap();
        assert!(out.starts_with("My Plugin\n\nChangelog\n=========\n\n2.0.29 (2026-10-18)\n"));
        assert!(out.ends_with(&format!("{PRIOR}\n1.0.0 (2020-01-01)\n- First\n")));
    }

    #[test]
    fn empty_changelog_gets_entry_after_blank_lines() {
        let content = "Changelog\n=========\n\n";
        let out = insert_entry("c", content, &header(), &entry(&["First"])).unwrap();
        assert_eq!(out, "Changelog\n=========\n\n2.0.29 (2026-10-18)\n- First\n\n");
    }

    #[test]
    fn header_without_trailing_newline() {
        let content = "Changelog\n=========";
        let out = insert_entry("c", content, &header(), &entry(&["First"])).unwrap();
        assert_eq!(out, "Changelog\n=========\n2.0.29 (2026-10-18)\n- First\n\n");
    }

    #[test]
    fn non_version_content_below_header_is_pushed_down() {
        let content = "== Changelog ==\n\n= 1.0.0 =\n* Initial\n";
        let header = Regex::new(r"== Changelog ==").unwrap();
        let out = insert_entry("readme.txt", content, &header, &entry(&["Next"])).unwrap();
        assert_eq!(
            out,
            "== Changelog ==\n\n2.0.29 (2026-10-18)\n- Next\n\n= 1.0.0 =\n* Initial\n"
        );
    }

    #[test]
    fn single_line_header_directly_above_entry() {
        let content = format!("== Changelog ==\n{PRIOR}");
        let header = Regex::new(r"== Changelog ==").unwrap();
        let out = insert_entry("c", &content, &header, &entry(&["Next"])).unwrap();
        assert_eq!(
            out,
            format!("== Changelog ==\n2.0.29 (2026-10-18)\n- Next\n\n{PRIOR}")
        );
    }

    #[test]
    fn only_ascii_digit_headings_count_as_entries() {
        let content = "Changelog\n=========\nNotes\n\u{0662}.0.28 (2026-09-01)\n- Old\n";
        let out = insert_entry("c", content, &header(), &entry(&["Next"])).unwrap();
        assert_eq!(
            out,
            "Changelog\n=========\n2.0.29 (2026-10-18)\n- Next\n\nNotes\n\u{0662}.0.28 (2026-09-01)\n- Old\n"
        );
    }

    #[test]
    fn crlf_files_keep_crlf() {
        let content = "Changelog\r\n=========\r\n\r\n2.0.28 (2026-09-01)\r\n- Old\r\n";
        let header = Regex::new(r"Changelog\r\n=+").unwrap();
        let out = insert_entry("c", content, &header, &entry(&["New"])).unwrap();
        assert_eq!(
            out,
            "Changelog\r\n=========\r\n\r\n2.0.29 (2026-10-18)\r\n- New\r\n\r\n2.0.28 (2026-09-01)\r\n- Old\r\n"
        );
    }

    #[test]
    fn missing_header_fails() {
        let err = insert_entry("CHANGELOG.md", "# Changes\n", &header(), &entry(&["x"])).unwrap_err();
        match err {
            ChangelogError::HeaderNotFound { path, pattern } => {
                assert_eq!(path, "CHANGELOG.md");
                assert_eq!(pattern, r"Changelog\n=========");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
