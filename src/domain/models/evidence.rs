//! Per-task evidence index and subtask summary records.
//!
//! Grounded verbatim on `examples/original_source/scc-bd/L6_agent_layer/
//! orchestrators/subtask_summary.py` (field shape, 8000-char submit-block
//! cap, 60-line event tail) and `subtask_index.py` (dedup-by-child index).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Known paths under a task's evidence directory, per SPEC_FULL.md §4.2.
pub const KNOWN_EVIDENCE_PATHS: &[&str] = &[
    "task.json",
    "events.jsonl",
    "evidence/patches/",
    "evidence/permission_decisions/",
    "evidence/subtask_summaries/",
    "codex_plan.json",
    "chat_context.json",
];

/// Maximum number of files listed per directory entry in the index.
pub const MAX_LISTED_FILES: usize = 200;

/// Stat info for one known path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidencePathEntry {
    pub path: String,
    pub exists: bool,
    pub size_bytes: u64,
    pub mtime_utc: Option<DateTime<Utc>>,
}

/// The rebuildable manifest produced by `EvidenceStore::build_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceIndex {
    pub task_id: Uuid,
    pub built_utc: DateTime<Utc>,
    pub entries: Vec<EvidencePathEntry>,
}

/// Record written to `<parent>/evidence/subtask_summaries/<child>.json`.
///
/// The submit block is capped at 8000 chars and the event tail at 60
/// lines, matching `subtask_summary.py`'s `_extract_submit_block` /
/// `_tail_events` limits exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskSummary {
    pub parent_task_id: Uuid,
    pub child_task_id: Uuid,
    pub recorded_utc: DateTime<Utc>,
    pub status: String,
    pub verdict: Option<String>,
    pub run_id: Option<Uuid>,
    pub exit_code: Option<i32>,
    pub report_md: Option<String>,
    pub evidence_dir: Option<String>,
    pub submit_block: Option<String>,
    pub child_recent_events_tail: Vec<String>,
}

pub const SUBMIT_BLOCK_MAX_CHARS: usize = 8000;
pub const EVENT_TAIL_MAX_LINES: usize = 60;

/// One entry in a parent task's `subtasks.json` child index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskIndexEntry {
    pub child_task_id: Uuid,
    pub task_type: String,
    pub created_utc: DateTime<Utc>,
}
