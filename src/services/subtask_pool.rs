//! SubtaskPool: spawn child tasks and track them per-parent.
//!
//! Grounded on `original_source/scc-bd/L6_agent_layer/orchestrators/
//! subtask_index.py` (dedup-by-child index, index-first read with
//! scan fallback) and `subtask_summary.py` (`record_subtask_summary`'s
//! SUBMIT-block extraction and event-tail capture).

use std::sync::Arc;

use regex::Regex;
use uuid::Uuid;

use crate::adapters::fs::{FsEventLog, FsEvidenceStore};
use crate::domain::errors::HubResult;
use crate::domain::models::{
    Event, EventKind, Role, SubtaskIndexEntry, SubtaskSummary, Task, TaskStatus, EVENT_TAIL_MAX_LINES,
    SUBMIT_BLOCK_MAX_CHARS,
};
use crate::domain::ports::{EventLogPort, EvidenceStorePort, SubtaskIndexPort, TaskFilter, TaskRepository};

/// Child task kind, per spec.md §4.10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtaskType {
    Explore,
    Plan,
    Code,
    General,
}

impl SubtaskType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Explore => "explore",
            Self::Plan => "plan",
            Self::Code => "code",
            Self::General => "general",
        }
    }
}

pub struct SubtaskPool {
    tasks: Arc<dyn TaskRepository>,
    index: Arc<dyn SubtaskIndexPort>,
    evidence_store: Arc<FsEvidenceStore>,
    event_log: Arc<FsEventLog>,
}

impl SubtaskPool {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        index: Arc<dyn SubtaskIndexPort>,
        evidence_store: Arc<FsEvidenceStore>,
        event_log: Arc<FsEventLog>,
    ) -> Self {
        Self { tasks, index, evidence_store, event_log }
    }

    /// Creates a child task linked to `parent`, recording the link both
    /// in the child's `request.meta.parent_task_id` and in the parent's
    /// subtask index.
    pub async fn submit_subtask(
        &self,
        parent: &Task,
        subtask_type: SubtaskType,
        mut payload: serde_json::Value,
    ) -> HubResult<Task> {
        if let Some(obj) = payload.as_object_mut() {
            let meta = obj
                .entry("meta")
                .or_insert_with(|| serde_json::json!({}));
            if let Some(meta_obj) = meta.as_object_mut() {
                meta_obj.insert(
                    "parent_task_id".to_string(),
                    serde_json::Value::String(parent.task_id.to_string()),
                );
            }
        }

        let child_code = format!("{}-{}", parent.task_code, subtask_type.as_str());
        let mut child = Task::new(child_code, Role::Worker, payload)
            .with_parent(parent.task_id)
            .with_required_capability(
                parent
                    .required_capability
                    .clone()
                    .unwrap_or_default(),
            );
        child.transition_to(TaskStatus::Ready)?;
        self.tasks.create(&child).await?;

        self.index
            .append(
                parent.task_id,
                SubtaskIndexEntry {
                    child_task_id: child.task_id,
                    task_type: subtask_type.as_str().to_string(),
                    created_utc: child.created_utc,
                },
            )
            .await?;

        Ok(child)
    }

    /// Reads the parent's subtask index first; falls back to a full task
    /// scan by `parent_task_id` if the index is empty (spec.md §4.10).
    pub async fn list_subtasks(&self, parent_task_id: Uuid) -> HubResult<Vec<SubtaskIndexEntry>> {
        let indexed = self.index.list(parent_task_id).await?;
        if !indexed.is_empty() {
            return Ok(indexed);
        }

        let scanned = self
            .tasks
            .list(TaskFilter {
                parent_task_id: Some(parent_task_id),
                ..Default::default()
            })
            .await?;
        Ok(scanned
            .into_iter()
            .map(|t| SubtaskIndexEntry {
                child_task_id: t.task_id,
                task_type: "general".to_string(),
                created_utc: t.created_utc,
            })
            .collect())
    }

    /// Records `child`'s outcome into `parent`'s evidence folder: the
    /// child's status/verdict/run_id, its SUBMIT block (if its
    /// `report_path` contains one), and its last 60 event-log lines.
    /// Appends `subtask_summary_recorded` to the parent's event log.
    ///
    /// Grounded verbatim on `subtask_summary.py::record_subtask_summary`.
    pub async fn record_subtask_summary(&self, parent_task_id: Uuid, child_task_id: Uuid) -> HubResult<SubtaskSummary> {
        let child = self
            .tasks
            .get(child_task_id)
            .await?
            .ok_or(crate::domain::errors::HubError::TaskNotFound(child_task_id))?;

        let submit_block = match &child.report_path {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .ok()
                .and_then(|report_md| extract_submit_block(&report_md)),
            None => None,
        };

        let mut tail_lines = Vec::new();
        let mut cursor = 0u64;
        loop {
            let (events, next_cursor) = self.event_log.tail(child_task_id, cursor, 500).await?;
            if events.is_empty() {
                break;
            }
            for event in &events {
                tail_lines.push(serde_json::to_string(event).unwrap_or_default());
            }
            cursor = next_cursor;
        }
        let tail_start = tail_lines.len().saturating_sub(EVENT_TAIL_MAX_LINES);
        let child_recent_events_tail = tail_lines.split_off(tail_start);

        let summary = SubtaskSummary {
            parent_task_id,
            child_task_id,
            recorded_utc: chrono::Utc::now(),
            status: child.status.as_str().to_string(),
            verdict: child.verdict.map(|v| v.as_str().to_string()),
            run_id: child.run_id,
            exit_code: child.exit_code,
            report_md: child.report_path.clone(),
            evidence_dir: child.evidence_dir.clone(),
            submit_block,
            child_recent_events_tail,
        };

        self.evidence_store.write_subtask_summary(&summary).await?;

        self.event_log
            .emit(
                parent_task_id,
                &Event::new(
                    parent_task_id,
                    EventKind::Event,
                    "subtask_summary_recorded",
                    serde_json::json!({
                        "child_task_id": child_task_id,
                        "status": summary.status,
                        "verdict": summary.verdict,
                    }),
                ),
            )
            .await?;

        Ok(summary)
    }
}

/// Extracts a ```SUBMIT ... ``` (or ```submit```) fenced block from a
/// report body, capped at `SUBMIT_BLOCK_MAX_CHARS`. Returns `None` if no
/// such block is present.
fn extract_submit_block(report_md: &str) -> Option<String> {
    let re = Regex::new(r"(?is)```(?:SUBMIT|submit)\s*\n(.*?)\n```").ok()?;
    let captured = re.captures(report_md)?.get(1)?.as_str().trim();
    if captured.is_empty() {
        return None;
    }
    Some(captured.chars().take(SUBMIT_BLOCK_MAX_CHARS).collect())
}

#[cfg(test)]
mod submit_block_tests {
    use super::extract_submit_block;

    #[test]
    fn extracts_fenced_submit_block() {
        let report = "intro text\n```SUBMIT\nreport_path: foo\n```\ntrailing";
        assert_eq!(extract_submit_block(report).as_deref(), Some("report_path: foo"));
    }

    #[test]
    fn returns_none_when_absent() {
        assert_eq!(extract_submit_block("no fenced block here"), None);
    }

    #[test]
    fn caps_at_max_chars() {
        let body = "x".repeat(SUBMIT_BLOCK_MAX_CHARS_TEST + 500);
        let report = format!("```submit\n{body}\n```");
        let extracted = extract_submit_block(&report).unwrap();
        assert_eq!(extracted.len(), SUBMIT_BLOCK_MAX_CHARS_TEST);
    }

    const SUBMIT_BLOCK_MAX_CHARS_TEST: usize = super::SUBMIT_BLOCK_MAX_CHARS;
}
