//! PolicyGate (C8): RBAC, rate limiting, SSE cap, and submission gates.
//!
//! Aggregates `domain::models::Role`'s permission matrix with the
//! submission gates under `services::gates`, following spec.md §4.8's
//! "declarative rule list" re-architecture cue.

use std::path::PathBuf;

use crate::domain::errors::{HubError, HubResult};
use crate::domain::models::{PolicyGateConfig, Role};
use crate::services::gates::{
    doclink_gate, import_scan_gate, schema_gate, semantic_context_gate, signature_gate, FailCode,
    SubmitReport,
};
use crate::services::rate_limiter::{RateLimiter, SseGuard};

pub struct PolicyGate {
    config: PolicyGateConfig,
    repo_root: PathBuf,
    rate_limiter: RateLimiter,
    sse_guard: SseGuard,
}

impl PolicyGate {
    pub fn new(
        config: PolicyGateConfig,
        repo_root: impl Into<PathBuf>,
        rate_limiter: RateLimiter,
        sse_guard: SseGuard,
    ) -> Self {
        Self {
            config,
            repo_root: repo_root.into(),
            rate_limiter,
            sse_guard,
        }
    }

    /// RBAC check: deny unless `role` holds `permission`.
    pub fn authorize(&self, role: Role, permission: crate::domain::models::Permission) -> HubResult<()> {
        if role.has_permission(permission) {
            Ok(())
        } else {
            Err(HubError::Forbidden)
        }
    }

    pub fn check_rate_limit(&self, route: &str, token: &str) -> HubResult<()> {
        self.rate_limiter.check(route, token)
    }

    pub fn acquire_sse_slot(&self) -> HubResult<crate::services::rate_limiter::SseLease> {
        self.sse_guard.try_acquire()
    }

    /// Runs every enabled submission gate over `report`, fail-closed.
    /// `read_file`/`file_digest` are injected so this method stays
    /// testable without real disk I/O; production callers pass
    /// closures backed by `adapters::fs`.
    pub fn run_submission_gates(
        &self,
        report: &SubmitReport,
        task_class_id: Option<&str>,
        patch_text: Option<&str>,
        read_file: impl Fn(&str) -> Option<String>,
        file_digest: impl Fn(&str) -> Option<String>,
        signature_map: Option<&signature_gate::SignatureMap>,
        semantic_context_raw: Option<&str>,
    ) -> Vec<FailCode> {
        let mut failures = Vec::new();

        if self.config.schema_gate_enabled {
            failures.extend(schema_gate::run(report));
        }

        if self.config.doclink_gate_enabled {
            failures.extend(doclink_gate::run(&self.repo_root, report, patch_text, &read_file));
        }

        let signature_required = task_class_id
            .is_some_and(|tc| self.config.signature_required_task_classes.contains(tc));
        if signature_required {
            if let Some(map) = signature_map {
                failures.extend(signature_gate::run(map, &file_digest));
            }
        }

        if self.config.semantic_context_gate_enabled {
            failures.extend(semantic_context_gate::run(semantic_context_raw));
        }

        if self.config.import_scan_gate_enabled {
            let changed: Vec<String> = report
                .changed_files
                .iter()
                .chain(report.new_files.iter())
                .cloned()
                .collect();
            failures.extend(import_scan_gate::run(&changed, &read_file));
        }

        failures
    }

    pub fn protected_paths(&self) -> &[String] {
        &self.config.protected_path_prefixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Permission, RateLimitConfig};

    fn gate() -> PolicyGate {
        PolicyGate::new(
            PolicyGateConfig::default(),
            "/repo",
            RateLimiter::new(&RateLimitConfig { requests_per_minute: 100 }),
            SseGuard::new(5),
        )
    }

    #[test]
    fn submitter_may_create_but_not_report_result() {
        let gate = gate();
        assert!(gate.authorize(Role::Submitter, Permission::Create).is_ok());
        assert!(gate
            .authorize(Role::Submitter, Permission::ReportResult)
            .is_err());
    }

    #[test]
    fn clean_submission_passes_all_gates() {
        let gate = gate();
        let report = SubmitReport {
            schema_version: "scc.submit.v1".to_string(),
            status: "PASS".to_string(),
            changed_files: vec!["src/lib.rs".to_string()],
            ..Default::default()
        };
        let context = serde_json::json!({
            "schema_version": "scc.semantic_context_entry.v1",
            "entry_id": "e1",
            "created_at": "2026-01-01T00:00:00Z",
            "title": "t",
            "content": "c",
            "permissions": {"read_roles": ["worker"]},
            "sources": [],
        })
        .to_string();
        let failures = gate.run_submission_gates(
            &report,
            None,
            None,
            |_| Some("use crate::signals;".to_string()),
            |_| None,
            None,
            Some(&context),
        );
        assert!(failures.is_empty());
    }

    #[test]
    fn protected_path_without_adr_fails_the_bundle() {
        let gate = gate();
        let report = SubmitReport {
            schema_version: "scc.submit.v1".to_string(),
            status: "PASS".to_string(),
            changed_files: vec!["contracts/api.yaml".to_string()],
            ..Default::default()
        };
        let context = serde_json::json!({
            "schema_version": "scc.semantic_context_entry.v1",
            "entry_id": "e1",
            "created_at": "2026-01-01T00:00:00Z",
            "title": "t",
            "content": "c",
            "permissions": {"read_roles": ["worker"]},
            "sources": [],
        })
        .to_string();
        let failures = gate.run_submission_gates(
            &report,
            None,
            None,
            |_| None,
            |_| None,
            None,
            Some(&context),
        );
        assert!(failures.iter().any(|f| f.code == "ADR_REQUIRED"));
    }
}
