//! Core library for prbump.
//!
//! prbump turns a release pull request into a version bump: it reads the
//! current version out of the project's source files, increments it, rewrites
//! every configured version string and inserts a dated changelog entry built
//! from the pull request's completed checklist.
//!
//! # Modules
//!
//! - [`bump`] - Plan and execute a bump (all files or none)
//! - [`changelog`] - Changelog items and entry insertion
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//! - [`manifest`] - Validated list of files to update
//! - [`substitute`] - Search/replace with the `{{new_version}}` placeholder
//! - [`version`] - Version extraction and increment
//!
//! # Quick Start
//!
//! ```no_run
//! use prbump_core::bump::{BumpOptions, BumpPlan, plan_bump};
//! use prbump_core::changelog::PullRequest;
//! use prbump_core::ConfigLoader;
//! use camino::Utf8Path;
//!
//! let config = ConfigLoader::new()
//!     .with_project_search(".")
//!     .load_or_error()
//!     .expect("no configuration found");
//!
//! let pr = PullRequest::new("[Release] Tidy up", "- [x] Fixed bug A");
//! let plan = plan_bump(Utf8Path::new("."), &config, &pr, &BumpOptions::default())
//!     .expect("bump failed");
//!
//! if let BumpPlan::Ready(ready) = plan {
//!     let outcome = ready.execute().expect("write failed");
//!     println!("{} -> {}", outcome.previous, outcome.new);
//! }
//! ```
#![deny(unsafe_code)]

pub mod bump;

pub mod changelog;

pub mod config;

pub mod error;

pub mod manifest;

pub mod substitute;

pub mod version;

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ConfigError, ConfigResult, ErrorKind};

// Re-exported so downstream crates don't need direct dependencies.
pub use chrono;
pub use semver;
