//! Semantic-context gate.
//!
//! Grounded verbatim on `original_source/scc-bd/L13_security_layer/
//! gates/semantic_context_gate.py`: tail the last 2000 JSONL rows of
//! `semantic_context/index.jsonl`, validate the first 200 of those for
//! the required key set and a non-empty `permissions.read_roles`.

use serde_json::Value;

use super::FailCode;

const TAIL_ROWS: usize = 2000;
const VALIDATE_ROWS: usize = 200;
const SCHEMA_VERSION: &str = "scc.semantic_context_entry.v1";
const REQUIRED_KEYS: &[&str] = &[
    "schema_version",
    "entry_id",
    "created_at",
    "title",
    "content",
    "permissions",
    "sources",
];

/// `raw` is the full file content, already read by the caller (the
/// filesystem adapter); `None` means the file does not exist.
pub fn run(raw: Option<&str>) -> Vec<FailCode> {
    let Some(raw) = raw else {
        return vec![FailCode::new(
            "SEMCTX_INVALID",
            "missing semantic_context/index.jsonl",
        )];
    };

    let lines: Vec<&str> = raw.lines().collect();
    let tail = &lines[lines.len().saturating_sub(TAIL_ROWS)..];

    let rows: Vec<Value> = tail
        .iter()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return None;
            }
            serde_json::from_str::<Value>(trimmed).ok()
        })
        .filter(Value::is_object)
        .collect();

    if rows.is_empty() {
        return vec![FailCode::new(
            "SEMCTX_INVALID",
            "semantic_context/index.jsonl: empty_or_unparseable",
        )];
    }

    let mut errors = Vec::new();
    for (i, row) in rows.iter().take(VALIDATE_ROWS).enumerate() {
        let obj = row.as_object().expect("filtered to objects above");

        if obj.get("schema_version").and_then(Value::as_str) != Some(SCHEMA_VERSION) {
            errors.push(FailCode::new(
                "SEMCTX_INVALID",
                format!("row[{i}] schema_version mismatch"),
            ));
            continue;
        }

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .filter(|key| !obj.contains_key(**key))
            .copied()
            .collect();
        if !missing.is_empty() {
            errors.push(FailCode::new(
                "SEMCTX_INVALID",
                format!("row[{i}] missing keys: {}", missing.join(",")),
            ));
        }

        let read_roles_ok = obj
            .get("permissions")
            .and_then(Value::as_object)
            .and_then(|perms| perms.get("read_roles"))
            .and_then(Value::as_array)
            .is_some_and(|roles| !roles.is_empty());
        if !read_roles_ok {
            errors.push(FailCode::new(
                "SEMCTX_INVALID",
                format!("row[{i}] permissions.read_roles missing/empty"),
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_row() -> String {
        serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "entry_id": "e1",
            "created_at": "2026-01-01T00:00:00Z",
            "title": "t",
            "content": "c",
            "permissions": {"read_roles": ["worker"]},
            "sources": [],
        })
        .to_string()
    }

    #[test]
    fn missing_file_fails() {
        assert_eq!(run(None)[0].code, "SEMCTX_INVALID");
    }

    #[test]
    fn empty_file_fails() {
        assert_eq!(run(Some(""))[0].code, "SEMCTX_INVALID");
    }

    #[test]
    fn valid_row_passes() {
        assert!(run(Some(&valid_row())).is_empty());
    }

    #[test]
    fn missing_read_roles_fails() {
        let row = serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "entry_id": "e1",
            "created_at": "x",
            "title": "t",
            "content": "c",
            "permissions": {"read_roles": []},
            "sources": [],
        })
        .to_string();
        assert_eq!(run(Some(&row))[0].code, "SEMCTX_INVALID");
    }

    #[test]
    fn schema_version_mismatch_fails() {
        let row = serde_json::json!({"schema_version": "v0"}).to_string();
        assert_eq!(run(Some(&row))[0].code, "SEMCTX_INVALID");
    }
}
