//! Command implementations

pub mod bump;

pub mod check;

pub mod doctor;

pub mod info;

use prbump_core::bump::BumpError;
use serde::Serialize;

/// Machine-readable failure report printed with `--json`.
#[derive(Debug, Serialize)]
struct FailureReport {
    error: prbump_core::ErrorKind,
    stage: prbump_core::bump::BumpStage,
    message: String,
}

/// Turn a pipeline failure into the CLI's error, naming its kind and stage.
///
/// With `json`, the failure is also printed to stdout as an object so that
/// scripts see a structured result alongside the non-zero exit.
pub fn pipeline_failure(err: BumpError, json: bool) -> anyhow::Error {
    let kind = err.kind();
    let stage = err.stage();
    tracing::error!(kind = kind.as_str(), %stage, error = %err, "pipeline failed");

    if json {
        let report = FailureReport {
            error: kind,
            stage,
            message: err.to_string(),
        };
        if let Ok(text) = serde_json::to_string_pretty(&report) {
            println!("{text}");
        }
    }

    anyhow::Error::new(err).context(format!("{kind} (stopped after: {stage})"))
}
