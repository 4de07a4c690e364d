//! Submission gates applied at task completion report (spec.md §4.8).
//!
//! Each gate is a pure function over a `SubmitReport` plus whatever
//! filesystem context it needs, returning a list of fail codes — the
//! teacher's "declarative rule list" re-architecture cue from spec.md §9.

pub mod doclink_gate;
pub mod import_scan_gate;
pub mod schema_gate;
pub mod semantic_context_gate;
pub mod signature_gate;

use serde::{Deserialize, Serialize};

/// A task's completion report, as submitted by a worker agent.
/// Conforms to `scc.submit.v1` once it passes the schema gate.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SubmitReport {
    pub schema_version: String,
    pub status: String,
    pub changed_files: Vec<String>,
    pub new_files: Vec<String>,
    pub artifacts: SubmitArtifacts,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SubmitArtifacts {
    #[serde(default)]
    pub patch_diff: Option<String>,
    #[serde(default)]
    pub report_path: Option<String>,
    #[serde(default)]
    pub selftest_log_path: Option<String>,
}

/// A single gate failure, matching the wire `fail_codes` list from
/// spec.md §4.8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailCode {
    pub code: String,
    pub message: String,
}

impl FailCode {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

pub trait Gate: Send + Sync {
    fn name(&self) -> &'static str;
}
