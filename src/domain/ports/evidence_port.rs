//! Filesystem-backed ports for per-task durable artifacts: event log,
//! evidence index, todo state, and the subtask child index.
//!
//! These are split from `task_repository`/`agent_repository` because the
//! spec requires them to live as JSONL/JSON files under
//! `artifacts/scc_tasks/<task_id>/` (spec.md §6), not in the relational
//! store — the cross-process source-of-truth re-architecture cue from
//! spec.md §9.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::HubResult;
use crate::domain::models::{Event, EvidenceIndex, SubtaskIndexEntry, SubtaskSummary, TodoState};

#[async_trait]
pub trait EventLogPort: Send + Sync {
    async fn emit(&self, task_id: Uuid, event: &Event) -> HubResult<()>;

    /// Returns up to `limit` events at or after `cursor` (an opaque byte
    /// offset into the JSONL file; `0` means from the start).
    async fn tail(&self, task_id: Uuid, cursor: u64, limit: usize) -> HubResult<(Vec<Event>, u64)>;
}

#[async_trait]
pub trait EvidenceStorePort: Send + Sync {
    async fn build_index(&self, task_id: Uuid) -> HubResult<EvidenceIndex>;

    async fn write_subtask_summary(&self, summary: &SubtaskSummary) -> HubResult<()>;

    async fn read_subtask_summary(
        &self,
        parent_task_id: Uuid,
        child_task_id: Uuid,
    ) -> HubResult<Option<SubtaskSummary>>;
}

#[async_trait]
pub trait TodoStorePort: Send + Sync {
    async fn read(&self, task_id: Uuid) -> HubResult<TodoState>;

    async fn write(&self, task_id: Uuid, state: &TodoState) -> HubResult<()>;
}

#[async_trait]
pub trait SubtaskIndexPort: Send + Sync {
    async fn append(&self, parent_task_id: Uuid, entry: SubtaskIndexEntry) -> HubResult<()>;

    async fn list(&self, parent_task_id: Uuid) -> HubResult<Vec<SubtaskIndexEntry>>;
}
