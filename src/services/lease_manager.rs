//! Background lease sweep, renewal, release, and DLQ replay.
//!
//! Grounded on the teacher's adapter-sweep idiom (periodic
//! `tokio::time::interval` loop over a repository query) and
//! `spec.md` §4.7's exact sweep/DLQ/replay contract.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::errors::{HubError, HubResult};
use crate::domain::models::{Task, TaskStatus, Verdict};
use crate::domain::ports::TaskRepository;

pub struct LeaseManager {
    tasks: Arc<dyn TaskRepository>,
}

impl LeaseManager {
    pub fn new(tasks: Arc<dyn TaskRepository>) -> Self {
        Self { tasks }
    }

    /// One sweep pass over every task in `{leased, in_progress}` whose
    /// lease has expired.
    ///
    /// `leased → ready` is unconditional (spec.md §4.3: a lease that
    /// timed out before the worker ever heartbeated is not a failed
    /// attempt). A task that was `in_progress` and timed out is treated
    /// as a failed attempt (`in_progress → failed`), then routed to
    /// `ready` or `dlq` by the normal retry-budget rule.
    pub async fn sweep_once(&self) -> HubResult<u32> {
        let expired = self.tasks.list_expired_leases().await?;
        let mut swept = 0u32;
        for mut task in expired {
            if task.status == TaskStatus::InProgress {
                task.retry_count += 1;
                task.transition_to(TaskStatus::Failed)?;
                if task.can_retry() {
                    task.transition_to(TaskStatus::Ready)?;
                    warn!(task_id = %task.task_id, retry_count = task.retry_count, "lease_expired");
                } else {
                    task.transition_to(TaskStatus::Dlq)?;
                    warn!(task_id = %task.task_id, "lease exhausted, moved to dlq");
                }
            } else {
                task.transition_to(TaskStatus::Ready)?;
                warn!(task_id = %task.task_id, "lease_expired");
            }
            self.tasks.update(&task).await?;
            swept += 1;
        }
        Ok(swept)
    }

    /// Runs `sweep_once` on a fixed interval until the returned handle is
    /// dropped or aborted.
    pub fn spawn_background(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match self.sweep_once().await {
                    Ok(n) if n > 0 => info!(swept = n, "lease sweep moved tasks"),
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "lease sweep failed"),
                }
            }
        })
    }

    pub async fn renew(&self, task_id: uuid::Uuid, agent_id: &str, ttl_secs: i64) -> HubResult<()> {
        let mut task = self
            .tasks
            .get(task_id)
            .await?
            .ok_or(HubError::TaskNotFound(task_id))?;
        if task.assigned_agent.as_deref() != Some(agent_id) || !task.status.holds_lease() {
            return Err(HubError::LeaseInvalid(task_id));
        }
        task.lease_expiry = Some(Utc::now() + chrono::Duration::seconds(ttl_secs));
        self.tasks.update(&task).await
    }

    pub async fn release(
        &self,
        task_id: uuid::Uuid,
        agent_id: &str,
        verdict: Verdict,
    ) -> HubResult<Task> {
        let mut task = self
            .tasks
            .get(task_id)
            .await?
            .ok_or(HubError::TaskNotFound(task_id))?;
        if task.assigned_agent.as_deref() != Some(agent_id) || !task.status.holds_lease() {
            return Err(HubError::LeaseInvalid(task_id));
        }
        let target = match verdict {
            Verdict::Pass => TaskStatus::Done,
            Verdict::Fail | Verdict::Unknown => TaskStatus::Failed,
        };
        task.verdict = Some(verdict);
        task.transition_to(target)?;
        self.tasks.update(&task).await?;
        Ok(task)
    }

    /// Clones the DLQed task's request into a new `ready` task linked via
    /// `parent_task_id`, `retry_count` reset to zero.
    pub async fn replay_dlq(&self, task_id: uuid::Uuid) -> HubResult<Task> {
        let dlqed = self
            .tasks
            .get(task_id)
            .await?
            .ok_or(HubError::TaskNotFound(task_id))?;
        if dlqed.status != TaskStatus::Dlq {
            return Err(HubError::StateIllegal {
                from: dlqed.status.as_str().to_string(),
                to: "ready".to_string(),
            });
        }
        let replayed = dlqed.replay();
        self.tasks.create(&replayed).await?;
        info!(parent = %task_id, child = %replayed.task_id, "replayed dlq task");
        Ok(replayed)
    }
}
