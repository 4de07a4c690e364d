//! Schema gate: the submit report must conform to `scc.submit.v1`.

use super::{FailCode, SubmitReport};

const SCHEMA_VERSION: &str = "scc.submit.v1";
const VALID_STATUSES: &[&str] = &["PASS", "FAIL", "BLOCKED"];

pub fn run(report: &SubmitReport) -> Vec<FailCode> {
    let mut errors = Vec::new();

    if report.schema_version != SCHEMA_VERSION {
        errors.push(FailCode::new(
            "SCHEMA_INVALID",
            format!(
                "expected schema_version {SCHEMA_VERSION}, got {}",
                report.schema_version
            ),
        ));
    }

    if !VALID_STATUSES.contains(&report.status.as_str()) {
        errors.push(FailCode::new(
            "SCHEMA_INVALID",
            format!("status must be one of {VALID_STATUSES:?}, got {}", report.status),
        ));
    }

    errors
}
