//! Import-scan gate: strategy-layer files must not import execution-layer
//! modules.
//!
//! Grounded on `original_source/scc-top/tools/gatekeeper/tests/fixtures/
//! illegal_imports/strategy_illegal_import_test.py`'s layering
//! convention: regex policy over changed paths and a per-line import
//! statement scan.

use regex::Regex;

use super::FailCode;

const STRATEGY_PREFIX: &str = "strategy/";
const EXECUTION_MARKER: &str = "execution";

/// `file_contents` gives the caller's way of reading a changed file; the
/// gate itself stays pure and filesystem-free.
pub fn run(changed_files: &[String], file_contents: impl Fn(&str) -> Option<String>) -> Vec<FailCode> {
    let import_re = Regex::new(r"(?m)^\s*(use|import|from)\s+.*\bexecution\b").expect("static regex");
    let mut errors = Vec::new();

    for path in changed_files {
        if !path.starts_with(STRATEGY_PREFIX) {
            continue;
        }
        let Some(contents) = file_contents(path) else {
            continue;
        };
        if contents.contains(EXECUTION_MARKER) && import_re.is_match(&contents) {
            errors.push(FailCode::new(
                "IMPORT_SCAN_VIOLATION",
                format!("{path}: strategy-layer file imports execution-layer module"),
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_strategy_path_is_ignored() {
        let errors = run(&["src/lib.rs".to_string()], |_| {
            Some("use execution::order;".to_string())
        });
        assert!(errors.is_empty());
    }

    #[test]
    fn strategy_importing_execution_fails() {
        let errors = run(&["strategy/momentum.rs".to_string()], |_| {
            Some("use crate::execution::order_execution::OrderExecution;".to_string())
        });
        assert_eq!(errors[0].code, "IMPORT_SCAN_VIOLATION");
    }

    #[test]
    fn strategy_without_execution_import_passes() {
        let errors = run(&["strategy/momentum.rs".to_string()], |_| {
            Some("use crate::signals::moving_average;".to_string())
        });
        assert!(errors.is_empty());
    }
}
