//! End-to-end tests for `prbump bump` and `prbump check` against a
//! throwaway project directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PLUGIN: &str = "<?php\n/**\n * Plugin Name: Demo\n * Version:           2.0.28\n */\n\ndefine( 'DEMO_VERSION', '2.0.28' );\n";

const README: &str = "=== Demo ===\nStable tag: 2.0.28\n\n== Changelog ==\n\n2.0.28 (2026-09-01)\n- Older change\n";

const MANIFEST: &str = r#"files:
  - path: plugin.php
    type: php
    patterns:
      - search: 'Version:\s+([0-9]+\.[0-9]+\.[0-9]+)'
        replace: 'Version:           {{new_version}}'
      - search: "define\\(\\s*'DEMO_VERSION',\\s*'([0-9]+\\.[0-9]+\\.[0-9]+)'\\s*\\)"
        replace: "define( 'DEMO_VERSION', '{{new_version}}' )"
  - path: readme.txt
    type: code
    patterns:
      - search: 'Stable tag: ([0-9]+\.[0-9]+\.[0-9]+)'
        replace: 'Stable tag: {{new_version}}'
  - path: readme.txt
    type: changelog
    header_pattern: '== Changelog =='
"#;

const BODY: &str = "## Summary\n\n- [x] Fixed bug A\n- [x] Added feature B\n- [ ] Not done yet\n";

#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env_remove("PR_TITLE")
        .env_remove("PR_BODY")
        .env("PRBUMP_LOG_DIR", std::env::temp_dir().join("prbump-cli-tests"));
    cmd
}

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("plugin.php"), PLUGIN).unwrap();
    fs::write(tmp.path().join("readme.txt"), README).unwrap();
    fs::write(tmp.path().join(".prbump.yaml"), MANIFEST).unwrap();
    tmp
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

fn bump(dir: &Path) -> Command {
    let mut cmd = cmd();
    cmd.args(["-C", dir.to_str().unwrap(), "bump", "--date", "2026-10-18"]);
    cmd
}

#[test]
fn release_pull_request_bumps_every_file() {
    let tmp = project();

    bump(tmp.path())
        .args(["--title", "[Release] Spring cleaning", "--body", BODY])
        .assert()
        .success()
        .stdout(predicate::str::contains("2.0.29"));

    let plugin = read(tmp.path(), "plugin.php");
    assert!(plugin.contains(" * Version:           2.0.29\n"));
    assert!(plugin.contains("define( 'DEMO_VERSION', '2.0.29' );"));

    assert_eq!(
        read(tmp.path(), "readme.txt"),
        "=== Demo ===\nStable tag: 2.0.29\n\n== Changelog ==\n\n2.0.29 (2026-10-18)\n- Fixed bug A\n- Added feature B\n\n2.0.28 (2026-09-01)\n- Older change\n"
    );
}

#[test]
fn pull_request_text_from_environment() {
    let tmp = project();

    bump(tmp.path())
        .env("PR_TITLE", "[RELEASE] Improve caching logic")
        .env("PR_BODY", "No checklist in this one.")
        .assert()
        .success();

    assert!(read(tmp.path(), "readme.txt").contains("2.0.29 (2026-10-18)\n- Improve caching logic\n"));
}

#[test]
fn body_file_is_read() {
    let tmp = project();
    let body = tmp.path().join("body.md");
    fs::write(&body, "- [x] From a file\n").unwrap();

    bump(tmp.path())
        .args(["--title", "[release] x", "--body-file", body.to_str().unwrap()])
        .assert()
        .success();

    assert!(read(tmp.path(), "readme.txt").contains("- From a file\n"));
}

#[test]
fn json_outcome_lists_versions_and_files() {
    let tmp = project();

    let output = bump(tmp.path())
        .args(["--json", "--title", "[release] go", "--body", BODY])
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["previous"], "2.0.28");
    assert_eq!(json["new"], "2.0.29");
    assert_eq!(json["changelog_updated"], true);
    assert_eq!(json["dry_run"], false);
    assert_eq!(
        json["items"],
        serde_json::json!(["Fixed bug A", "Added feature B"])
    );
    assert_eq!(
        json["modified_files"],
        serde_json::json!(["plugin.php", "readme.txt"])
    );
}

#[test]
fn non_release_title_is_a_successful_no_op() {
    let tmp = project();

    bump(tmp.path())
        .args(["--title", "Fix typo in docs", "--body", BODY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not a release pull request"));

    assert_eq!(read(tmp.path(), "plugin.php"), PLUGIN);
    assert_eq!(read(tmp.path(), "readme.txt"), README);
}

#[test]
fn non_release_title_ignores_unknown_file_type() {
    let tmp = project();
    fs::write(
        tmp.path().join(".prbump.yaml"),
        MANIFEST.replace("type: php", "type: python"),
    )
    .unwrap();

    bump(tmp.path())
        .args(["--title", "chore: deps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not a release pull request"));

    bump(tmp.path())
        .args(["--title", "[release] x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ConfigError"))
        .stderr(predicate::str::contains("python"));
    assert_eq!(read(tmp.path(), "plugin.php"), PLUGIN);
}

#[test]
fn leading_zero_version_bumps_numerically() {
    let tmp = project();
    fs::write(tmp.path().join("plugin.php"), PLUGIN.replace("2.0.28", "2.0.08")).unwrap();

    bump(tmp.path())
        .args(["--title", "[release] x"])
        .assert()
        .success();

    let plugin = read(tmp.path(), "plugin.php");
    assert!(plugin.contains(" * Version:           2.0.9\n"));
    assert!(plugin.contains("define( 'DEMO_VERSION', '2.0.9' );"));
    assert!(read(tmp.path(), "readme.txt").contains("Stable tag: 2.0.9\n"));
}

#[test]
fn overflowing_version_is_reported_not_panicked() {
    let tmp = project();
    let huge = PLUGIN.replace("2.0.28", "2.0.18446744073709551615");
    fs::write(tmp.path().join("plugin.php"), &huge).unwrap();

    let output = bump(tmp.path())
        .args(["--json", "--title", "[release] x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("panicked").not());
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["error"], "VersionOverflowError");
    assert_eq!(json["stage"], "version_extracted");
    assert_eq!(read(tmp.path(), "plugin.php"), huge);
}

#[test]
fn non_release_json_reports_skip() {
    let tmp = project();

    let output = bump(tmp.path())
        .args(["--json", "--title", "Refactor"])
        .assert()
        .success();
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["skipped"], true);
    assert_eq!(json["marker"], "[release]");
}

#[test]
fn dry_run_writes_nothing() {
    let tmp = project();

    bump(tmp.path())
        .args(["--title", "[release] x", "--body", BODY, "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert_eq!(read(tmp.path(), "plugin.php"), PLUGIN);
    assert_eq!(read(tmp.path(), "readme.txt"), README);
}

#[test]
fn unmatched_pattern_fails_without_writing() {
    let tmp = project();
    fs::write(
        tmp.path().join("readme.txt"),
        README.replace("Stable tag: 2.0.28", "Tested up to: 6.5"),
    )
    .unwrap();

    bump(tmp.path())
        .args(["--title", "[release] x", "--body", BODY])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PatternNotMatchedError"))
        .stderr(predicate::str::contains("readme.txt"))
        .stderr(predicate::str::contains("Stable tag"));

    assert_eq!(read(tmp.path(), "plugin.php"), PLUGIN);
}

#[test]
fn failure_json_names_kind_and_stage() {
    let tmp = project();
    fs::write(tmp.path().join("readme.txt"), "no header at all\nStable tag: 2.0.28\n").unwrap();

    let output = bump(tmp.path())
        .args(["--json", "--title", "[release] x", "--body", BODY])
        .assert()
        .failure();
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["error"], "HeaderNotFoundError");
    assert_eq!(json["stage"], "changelog_resolved");
    assert_eq!(read(tmp.path(), "plugin.php"), PLUGIN);
}

#[test]
fn empty_changelog_content_fails() {
    let tmp = project();

    bump(tmp.path())
        .args(["--title", "[release]", "--body", "- [ ] nothing done"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("EmptyChangelogError"));

    assert_eq!(read(tmp.path(), "plugin.php"), PLUGIN);
}

#[test]
fn missing_manifest_file_is_a_config_error() {
    let tmp = project();
    fs::remove_file(tmp.path().join("plugin.php")).unwrap();

    bump(tmp.path())
        .args(["--title", "[release] x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ConfigError"))
        .stderr(predicate::str::contains("plugin.php"));
}

#[test]
fn checklist_body_may_start_with_a_dash() {
    let tmp = project();

    bump(tmp.path())
        .args(["--title", "[release] x", "--body", "- [x] Leading item"])
        .assert()
        .success();

    assert!(read(tmp.path(), "readme.txt").contains("- Leading item\n"));
}

#[test]
fn check_reports_current_and_next() {
    let tmp = project();

    let output = cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "check", "--json"])
        .assert()
        .success();
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["current"], "2.0.28");
    assert_eq!(json["next"], "2.0.29");
    assert_eq!(json["source"], "plugin.php");
    assert_eq!(json["mismatches"], serde_json::json!([]));

    assert_eq!(read(tmp.path(), "plugin.php"), PLUGIN);
}

#[test]
fn check_strict_fails_on_disagreeing_versions() {
    let tmp = project();
    fs::write(
        tmp.path().join("readme.txt"),
        README.replace("Stable tag: 2.0.28", "Stable tag: 2.0.27"),
    )
    .unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2.0.27"));

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "check", "--strict"])
        .assert()
        .failure();
}

#[test]
fn second_release_builds_on_the_first() {
    let tmp = project();

    bump(tmp.path())
        .args(["--title", "[release] one"])
        .assert()
        .success();
    bump(tmp.path())
        .args(["--title", "[release] two"])
        .assert()
        .success();

    let readme = read(tmp.path(), "readme.txt");
    assert!(readme.contains("Stable tag: 2.0.30"));
    let two = readme.find("2.0.30 (2026-10-18)\n- two").unwrap();
    let one = readme.find("2.0.29 (2026-10-18)\n- one").unwrap();
    assert!(two < one);
}
