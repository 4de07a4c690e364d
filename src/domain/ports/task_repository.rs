//! Task repository port.
//!
//! Grounded on the teacher's `domain/ports/task_repository.rs` trait
//! shape (`TaskFilter`, `#[async_trait]`), extended with the
//! lease/scheduling queries SPEC_FULL.md §4.3/§4.6 require.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::HubResult;
use crate::domain::models::{Task, TaskStatus};

/// Filter criteria for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub parent_task_id: Option<Uuid>,
    pub assigned_agent: Option<String>,
    pub task_code: Option<String>,
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> HubResult<()>;

    async fn get(&self, id: Uuid) -> HubResult<Option<Task>>;

    /// Replace the full row for `task`. Callers are expected to have gone
    /// through `Task::transition_to` first; the repository does not
    /// itself enforce the state machine.
    async fn update(&self, task: &Task) -> HubResult<()>;

    async fn list(&self, filter: TaskFilter) -> HubResult<Vec<Task>>;

    /// Tasks in `ready` whose `required_capability` is satisfied by
    /// `agent_capabilities` (or has none), ordered by
    /// `(priority desc, created_utc asc, task_id asc)` per SPEC_FULL.md
    /// §4.6 step 5. Callers apply priority aging on the returned snapshot.
    async fn list_ready_for_capabilities(&self, agent_capabilities: &[String]) -> HubResult<Vec<Task>>;

    /// Count of tasks in `{leased, in_progress}` assigned to `agent_id`
    /// (the computed `current_load` from SPEC_FULL.md §4.5).
    async fn count_active_for_agent(&self, agent_id: &str) -> HubResult<u32>;

    /// Atomically transition `task_id` from `ready` to `leased`, setting
    /// `assigned_agent`/`lease_expiry`. Returns `false` (no mutation) if
    /// the task was not in `ready` when the update ran — the
    /// compare-and-set loser case from SPEC_FULL.md §4.6.
    async fn try_lease(
        &self,
        task_id: Uuid,
        agent_id: &str,
        lease_expiry: chrono::DateTime<chrono::Utc>,
    ) -> HubResult<bool>;

    /// Tasks in `{leased, in_progress}` whose `lease_expiry` has passed.
    async fn list_expired_leases(&self) -> HubResult<Vec<Task>>;

    async fn get_by_task_code(&self, task_code: &str) -> HubResult<Option<Task>>;
}
