//! JSON reports printed on stdout.
//!
//! Success prints `{"changed": bool}` (plus per-resource `results` for batch
//! runs). Failure prints `{"failed": true, "msg": ...}` with whatever command
//! output was captured.

use serde::Serialize;

use crate::error::ReconcileError;
use crate::reconcile::{Outcome, ResourceOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Outcome {
        changed: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        results: Option<Vec<ResourceOutcome>>,
    },
    Validated {
        valid: bool,
        resources: usize,
    },
    Failed(FailureReport),
}

impl Report {
    pub fn single(outcome: Outcome) -> Self {
        Self::Outcome {
            changed: outcome.changed,
            results: None,
        }
    }

    /// A batch changed if any of its resources did.
    pub fn batch(results: Vec<ResourceOutcome>) -> Self {
        Self::Outcome {
            changed: results.iter().any(|r| r.changed),
            results: Some(results),
        }
    }

    pub fn validated(resources: usize) -> Self {
        Self::Validated {
            valid: true,
            resources,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn to_json(&self) -> String {
        // Serializing plain strings, bools and numbers cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"failed":true}"#.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub failed: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl FailureReport {
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            failed: true,
            msg: msg.into(),
            cmd: None,
            stdout: None,
            stderr: None,
            exit_code: None,
        }
    }
}

impl From<&ReconcileError> for FailureReport {
    fn from(err: &ReconcileError) -> Self {
        match err {
            ReconcileError::Command {
                msg,
                cmd,
                stdout,
                stderr,
                exit_code,
            } => Self {
                failed: true,
                msg: msg.clone(),
                cmd: Some(cmd.clone()),
                stdout: Some(stdout.clone()),
                stderr: Some(stderr.clone()),
                exit_code: *exit_code,
            },
            other => Self::message(other.to_string()),
        }
    }
}

impl From<&anyhow::Error> for FailureReport {
    /// Command errors keep their captured output even when wrapped in context.
    fn from(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ReconcileError>() {
            Some(inner @ ReconcileError::Command { .. }) => inner.into(),
            _ => Self::message(format!("{err:#}")),
        }
    }
}

impl From<FailureReport> for Report {
    fn from(failure: FailureReport) -> Self {
        Self::Failed(failure)
    }
}
