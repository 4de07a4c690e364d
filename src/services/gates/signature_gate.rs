//! Signature gate: every file named in `sha256_map.json` must match its
//! current on-disk SHA-256 digest.
//!
//! Grounded on `original_source/scc-bd/L13_security_layer/gatekeeper/
//! demo_signature_verification.py`'s hash-map comparison concept; opt-in
//! per `task_class_id` via `PolicyGateConfig::signature_required_task_classes`.

use std::collections::HashMap;

use super::FailCode;

/// `path -> expected sha256 hex digest`.
pub type SignatureMap = HashMap<String, String>;

pub fn run(expected: &SignatureMap, actual_digest: impl Fn(&str) -> Option<String>) -> Vec<FailCode> {
    let mut errors = Vec::new();
    for (path, expected_digest) in expected {
        match actual_digest(path) {
            None => errors.push(FailCode::new(
                "SIGNATURE_MISMATCH",
                format!("file listed in sha256_map.json is missing: {path}"),
            )),
            Some(actual) if &actual != expected_digest => errors.push(FailCode::new(
                "SIGNATURE_MISMATCH",
                format!("sha256 mismatch for {path}"),
            )),
            Some(_) => {}
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_digest_passes() {
        let mut map = SignatureMap::new();
        map.insert("a.txt".to_string(), "abc".to_string());
        let errors = run(&map, |_| Some("abc".to_string()));
        assert!(errors.is_empty());
    }

    #[test]
    fn mismatched_digest_fails() {
        let mut map = SignatureMap::new();
        map.insert("a.txt".to_string(), "abc".to_string());
        let errors = run(&map, |_| Some("def".to_string()));
        assert_eq!(errors[0].code, "SIGNATURE_MISMATCH");
    }

    #[test]
    fn missing_file_fails() {
        let mut map = SignatureMap::new();
        map.insert("a.txt".to_string(), "abc".to_string());
        let errors = run(&map, |_| None);
        assert_eq!(errors[0].code, "SIGNATURE_MISMATCH");
    }
}
