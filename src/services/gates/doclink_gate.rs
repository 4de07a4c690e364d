//! Doc-link gate: protected-path changes require an ADR file.
//!
//! Grounded verbatim on `original_source/tools/scc/gates/doclink_gate.py`:
//! touched paths come from `changed_files` + `new_files` + a unified diff
//! (`diff --git a/X b/Y` and `+++ b/Y` lines), normalized by stripping
//! `a/`/`b/` prefixes and any repo-root absolute prefix.

use std::path::Path;

use super::{FailCode, SubmitReport};

const PROTECTED_PREFIXES: &[&str] = &["contracts/", "roles/", "skills/", "eval/"];
const DEP_FILES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    "requirements.txt",
    "pyproject.toml",
    "poetry.lock",
    "Cargo.toml",
    "Cargo.lock",
];
const ADR_SECTIONS: &[&str] = &[
    "Context:",
    "Decision:",
    "Alternatives:",
    "Consequences:",
    "Migration:",
    "Owner:",
];

fn norm_rel(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    slashed.trim_start_matches("./").to_string()
}

/// Extracts touched repo-relative paths from a unified diff's text.
fn extract_touched_from_patch(repo_root: &Path, patch_text: &str) -> Vec<String> {
    let root = repo_root.to_string_lossy().replace('\\', "/");
    let root = root.trim_end_matches('/');

    let mut touched = Vec::new();
    for line in patch_text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("diff --git ") {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            if parts.len() >= 2 {
                touched.push(parts[1].to_string());
            }
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            if let Some(path) = rest.split_whitespace().next() {
                touched.push(path.to_string());
            }
        }
    }

    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for raw in touched {
        let mut p = norm_rel(&raw);
        if p == "/dev/null" || p == "dev/null" {
            continue;
        }
        if let Some(stripped) = p.strip_prefix("a/").or_else(|| p.strip_prefix("b/")) {
            p = stripped.to_string();
        }
        let root_prefix = format!("{root}/");
        if p.to_lowercase().starts_with(&root_prefix.to_lowercase()) {
            p = p[root_prefix.len()..].to_string();
        }
        let p = norm_rel(&p);
        if p.is_empty() || !seen.insert(p.clone()) {
            continue;
        }
        out.push(p);
    }
    out
}

fn adr_is_valid(text: &str) -> bool {
    ADR_SECTIONS
        .iter()
        .all(|section| text.lines().any(|line| line.starts_with(section)))
}

/// `repo_root` and an optional patch file read (already loaded by the
/// caller, since the gate itself is pure and filesystem-free by
/// convention — see `services::policy_gate` for the I/O wrapper).
pub fn run(
    repo_root: &Path,
    report: &SubmitReport,
    patch_text: Option<&str>,
    adr_reader: impl Fn(&str) -> Option<String>,
) -> Vec<FailCode> {
    let mut errors = Vec::new();

    let mut touched: Vec<String> = report.changed_files.iter().map(|s| norm_rel(s)).collect();
    touched.extend(report.new_files.iter().map(|s| norm_rel(s)));
    if let Some(patch_text) = patch_text {
        touched.extend(extract_touched_from_patch(repo_root, patch_text));
    }

    let triggers = touched.iter().any(|p| {
        PROTECTED_PREFIXES.iter().any(|prefix| p.starts_with(prefix))
            || p == "factory_policy.json"
            || Path::new(p)
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| DEP_FILES.contains(&name))
    });

    let adr_files: Vec<&String> = touched
        .iter()
        .filter(|p| p.starts_with("docs/adr/ADR-") && p.ends_with(".md"))
        .collect();

    if triggers && adr_files.is_empty() {
        errors.push(FailCode::new(
            "ADR_REQUIRED",
            "ADR required for protected-path changes (add docs/adr/ADR-YYYYMMDD-*.md)",
        ));
    }

    for path in adr_files {
        match adr_reader(path) {
            None => errors.push(FailCode::new(
                "ADR_MALFORMED",
                format!("ADR listed but missing on disk: {path}"),
            )),
            Some(text) if !adr_is_valid(&text) => errors.push(FailCode::new(
                "ADR_MALFORMED",
                format!("ADR missing required section prefixes: {path}"),
            )),
            Some(_) => {}
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn repo() -> PathBuf {
        PathBuf::from("/repo")
    }

    #[test]
    fn non_protected_change_passes() {
        let report = SubmitReport {
            changed_files: vec!["src/lib.rs".to_string()],
            ..Default::default()
        };
        assert!(run(&repo(), &report, None, |_| None).is_empty());
    }

    #[test]
    fn protected_change_without_adr_fails() {
        let report = SubmitReport {
            changed_files: vec!["contracts/api.yaml".to_string()],
            ..Default::default()
        };
        let errors = run(&repo(), &report, None, |_| None);
        assert_eq!(errors[0].code, "ADR_REQUIRED");
    }

    #[test]
    fn protected_change_with_valid_adr_passes() {
        let report = SubmitReport {
            changed_files: vec!["roles/worker.yaml".to_string()],
            new_files: vec!["docs/adr/ADR-20260101-roles.md".to_string()],
            ..Default::default()
        };
        let adr_body = "Context: x\nDecision: y\nAlternatives: z\nConsequences: w\nMigration: v\nOwner: u\n";
        let errors = run(&repo(), &report, None, |_| Some(adr_body.to_string()));
        assert!(errors.is_empty());
    }

    #[test]
    fn adr_missing_sections_fails() {
        let report = SubmitReport {
            changed_files: vec!["roles/worker.yaml".to_string()],
            new_files: vec!["docs/adr/ADR-20260101-roles.md".to_string()],
            ..Default::default()
        };
        let errors = run(&repo(), &report, None, |_| Some("Context: x\n".to_string()));
        assert_eq!(errors[0].code, "ADR_MALFORMED");
    }

    #[test]
    fn dependency_manifest_triggers_adr_requirement() {
        let report = SubmitReport {
            changed_files: vec!["Cargo.toml".to_string()],
            ..Default::default()
        };
        let errors = run(&repo(), &report, None, |_| None);
        assert_eq!(errors[0].code, "ADR_REQUIRED");
    }

    #[test]
    fn patch_diff_extracts_touched_paths() {
        let patch = "diff --git a/contracts/api.yaml b/contracts/api.yaml\n--- a/contracts/api.yaml\n+++ b/contracts/api.yaml\n";
        let report = SubmitReport::default();
        let errors = run(&repo(), &report, Some(patch), |_| None);
        assert_eq!(errors[0].code, "ADR_REQUIRED");
    }
}
