//! Dispatch algorithm for `next_task(agent_id)`.
//!
//! Grounded on the teacher's `services/priority_calculator.rs` concept
//! (effective priority rises while a task ages) rewritten against this
//! crate's actual `Task`/`Agent` fields, and on
//! `original_source/.../test_priority_scheduler.py` for the exact
//! dispatch ordering scenario this module is tested against.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::errors::{HubError, HubResult};
use crate::domain::models::{Agent, AgentStatus, SchedulerConfig, Task};
use crate::domain::ports::{AgentRepository, TaskRepository};
use crate::services::resource_governor::ResourceGovernor;

/// Completion events observed in the trailing 60s window, used for the
/// per-agent rate limit check (spec.md §4.6 step 3).
#[async_trait::async_trait]
pub trait CompletionWindow: Send + Sync {
    async fn completions_last_minute(&self, agent_id: &str) -> HubResult<u32>;
}

pub struct PriorityScheduler {
    tasks: Arc<dyn TaskRepository>,
    agents: Arc<dyn AgentRepository>,
    completions: Arc<dyn CompletionWindow>,
    governor: Arc<ResourceGovernor>,
    config: SchedulerConfig,
}

impl PriorityScheduler {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        agents: Arc<dyn AgentRepository>,
        completions: Arc<dyn CompletionWindow>,
        governor: Arc<ResourceGovernor>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            tasks,
            agents,
            completions,
            governor,
            config,
        }
    }

    /// Runs the 7-step dispatch algorithm from SPEC_FULL.md §4.6.
    pub async fn next_task(&self, agent_id: &str) -> HubResult<Task> {
        let agent = self
            .agents
            .get(agent_id)
            .await?
            .ok_or_else(|| HubError::AgentNotFound(agent_id.to_string()))?;

        if agent.status == AgentStatus::Offline {
            return Err(HubError::AgentOffline(agent_id.to_string()));
        }

        let current_load = self.tasks.count_active_for_agent(agent_id).await?;
        if current_load >= agent.capacity {
            return Err(HubError::AgentQuotaExceeded(agent_id.to_string()));
        }

        let recent_completions = self.completions.completions_last_minute(agent_id).await?;
        if recent_completions >= agent.completion_limit_per_minute {
            return Err(HubError::AgentRateLimited(agent_id.to_string()));
        }

        // Governor's current ceiling caps how many tasks may be
        // outstanding across the whole hub, independent of this agent's
        // own capacity.
        let outstanding_cap = self.governor.current_max_outstanding().await;
        let total_active = self.tasks.count_active_for_agent(agent_id).await?;
        if total_active >= outstanding_cap {
            return Err(HubError::AgentQuotaExceeded(format!(
                "{agent_id} (governor ceiling {outstanding_cap})"
            )));
        }

        let capabilities: Vec<String> = agent.capabilities.iter().cloned().collect();
        let candidates = self.tasks.list_ready_for_capabilities(&capabilities).await?;

        let eligible: Vec<Task> = candidates
            .into_iter()
            .filter(|task| self.agent_eligible(task, &agent))
            .collect();

        let Some(chosen) = self.pick_highest_priority(eligible) else {
            return Err(HubError::NoEligibleAgent);
        };

        let lease_expiry = Utc::now() + chrono::Duration::seconds(self.config.lease_ttl_secs);
        let leased = self
            .tasks
            .try_lease(chosen.task_id, agent_id, lease_expiry)
            .await?;

        if !leased {
            // Lost the CAS race to another scheduler invocation; caller
            // retries from step 4 per spec.md §4.6 edge case.
            warn!(task_id = %chosen.task_id, agent_id, "lost lease race, caller should retry");
            return Err(HubError::StateIllegal {
                from: "ready".to_string(),
                to: "leased".to_string(),
            });
        }

        let mut granted = self
            .tasks
            .get(chosen.task_id)
            .await?
            .ok_or(HubError::TaskNotFound(chosen.task_id))?;
        granted.assigned_agent = Some(agent_id.to_string());
        info!(task_id = %granted.task_id, agent_id, "task_leased");
        Ok(granted)
    }

    fn agent_eligible(&self, task: &Task, agent: &Agent) -> bool {
        if !agent.satisfies_capability(task.required_capability.as_deref()) {
            return false;
        }
        if task.owner_role != agent.owner_role {
            return false;
        }
        match &task.assigned_agent {
            Some(pinned) => pinned == &agent.agent_id,
            None => true,
        }
    }

    /// Orders by effective priority desc, `created_utc` asc, `task_id`
    /// asc and returns the first candidate, applying non-persisted
    /// priority aging (spec.md §4.6 edge case) as the sort key.
    fn pick_highest_priority(&self, mut candidates: Vec<Task>) -> Option<Task> {
        let now = Utc::now();
        candidates.sort_by(|a, b| {
            let pa = self.effective_priority(a, now);
            let pb = self.effective_priority(b, now);
            pb.cmp(&pa)
                .then_with(|| a.created_utc.cmp(&b.created_utc))
                .then_with(|| a.task_id.cmp(&b.task_id))
        });
        candidates.into_iter().next()
    }

    fn effective_priority(&self, task: &Task, now: chrono::DateTime<Utc>) -> u16 {
        let waited = now - task.created_utc;
        let threshold = Duration::from_secs(self.config.aging_threshold_secs.max(1) as u64);
        let waited_secs = waited.num_seconds().max(0) as u64;
        let intervals = waited_secs / threshold.as_secs().max(1);
        u16::from(task.priority) + intervals.min(u16::MAX as u64) as u16 * u16::from(self.config.aging_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Role, TaskStatus};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    struct FixedWindow(u32);

    #[async_trait]
    impl CompletionWindow for FixedWindow {
        async fn completions_last_minute(&self, _agent_id: &str) -> HubResult<u32> {
            Ok(self.0)
        }
    }

    struct MemTasks(StdMutex<HashMap<uuid::Uuid, Task>>);

    #[async_trait]
    impl TaskRepository for MemTasks {
        async fn create(&self, task: &Task) -> HubResult<()> {
            self.0.lock().unwrap().insert(task.task_id, task.clone());
            Ok(())
        }
        async fn get(&self, id: uuid::Uuid) -> HubResult<Option<Task>> {
            Ok(self.0.lock().unwrap().get(&id).cloned())
        }
        async fn update(&self, task: &Task) -> HubResult<()> {
            self.0.lock().unwrap().insert(task.task_id, task.clone());
            Ok(())
        }
        async fn list(&self, _filter: crate::domain::ports::TaskFilter) -> HubResult<Vec<Task>> {
            Ok(self.0.lock().unwrap().values().cloned().collect())
        }
        async fn list_ready_for_capabilities(&self, _caps: &[String]) -> HubResult<Vec<Task>> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.status == TaskStatus::Ready)
                .cloned()
                .collect())
        }
        async fn count_active_for_agent(&self, agent_id: &str) -> HubResult<u32> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .values()
                .filter(|t| {
                    t.assigned_agent.as_deref() == Some(agent_id)
                        && matches!(t.status, TaskStatus::Leased | TaskStatus::InProgress)
                })
                .count() as u32)
        }
        async fn try_lease(
            &self,
            task_id: uuid::Uuid,
            agent_id: &str,
            lease_expiry: chrono::DateTime<Utc>,
        ) -> HubResult<bool> {
            let mut guard = self.0.lock().unwrap();
            let Some(task) = guard.get_mut(&task_id) else {
                return Ok(false);
            };
            if task.status != TaskStatus::Ready {
                return Ok(false);
            }
            task.status = TaskStatus::Leased;
            task.assigned_agent = Some(agent_id.to_string());
            task.lease_expiry = Some(lease_expiry);
            Ok(true)
        }
        async fn list_expired_leases(&self) -> HubResult<Vec<Task>> {
            Ok(vec![])
        }
        async fn get_by_task_code(&self, code: &str) -> HubResult<Option<Task>> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .values()
                .find(|t| t.task_code == code)
                .cloned())
        }
    }

    struct MemAgents(StdMutex<HashMap<String, Agent>>);

    #[async_trait]
    impl AgentRepository for MemAgents {
        async fn upsert(&self, agent: &Agent) -> HubResult<()> {
            self.0
                .lock()
                .unwrap()
                .insert(agent.agent_id.clone(), agent.clone());
            Ok(())
        }
        async fn get(&self, agent_id: &str) -> HubResult<Option<Agent>> {
            Ok(self.0.lock().unwrap().get(agent_id).cloned())
        }
        async fn delete(&self, agent_id: &str) -> HubResult<()> {
            self.0.lock().unwrap().remove(agent_id);
            Ok(())
        }
        async fn list(&self, _filter: crate::domain::ports::AgentFilter) -> HubResult<Vec<Agent>> {
            Ok(self.0.lock().unwrap().values().cloned().collect())
        }
        async fn next_available_numeric_code(&self) -> HubResult<Option<u16>> {
            Ok(Some(1))
        }
        async fn touch_heartbeat(&self, _agent_id: &str) -> HubResult<()> {
            Ok(())
        }
    }

    fn governor() -> Arc<ResourceGovernor> {
        Arc::new(ResourceGovernor::new(Default::default()))
    }

    #[tokio::test]
    async fn unknown_agent_is_not_found() {
        let tasks = Arc::new(MemTasks(StdMutex::new(HashMap::new())));
        let agents = Arc::new(MemAgents(StdMutex::new(HashMap::new())));
        let scheduler = PriorityScheduler::new(
            tasks,
            agents,
            Arc::new(FixedWindow(0)),
            governor(),
            SchedulerConfig::default(),
        );
        let err = scheduler.next_task("ghost").await.unwrap_err();
        assert_eq!(err.reason_code(), "AGENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn quota_exceeded_when_load_at_capacity() {
        let mut t1 = Task::new("t1", Role::Worker, serde_json::json!({}));
        t1.transition_to(TaskStatus::Ready).unwrap();
        t1.transition_to(TaskStatus::Leased).unwrap();
        t1.assigned_agent = Some("a1".to_string());

        let tasks = Arc::new(MemTasks(StdMutex::new(HashMap::from([(t1.task_id, t1)]))));
        let agent = Agent::new("a1", 1, Role::Worker, 1);
        let agents = Arc::new(MemAgents(StdMutex::new(HashMap::from([(
            "a1".to_string(),
            agent,
        )]))));
        let scheduler = PriorityScheduler::new(
            tasks,
            agents,
            Arc::new(FixedWindow(0)),
            governor(),
            SchedulerConfig::default(),
        );
        let err = scheduler.next_task("a1").await.unwrap_err();
        assert_eq!(err.reason_code(), "AGENT_QUOTA_EXCEEDED");
    }

    #[tokio::test]
    async fn picks_highest_priority_then_fifo() {
        let mut low = Task::new("low", Role::Worker, serde_json::json!({}));
        low.priority = 1;
        low.transition_to(TaskStatus::Ready).unwrap();
        let mut high = Task::new("high", Role::Worker, serde_json::json!({}));
        high.priority = 3;
        high.transition_to(TaskStatus::Ready).unwrap();

        let tasks = Arc::new(MemTasks(StdMutex::new(HashMap::from([
            (low.task_id, low),
            (high.task_id, high.clone()),
        ]))));
        let agent = Agent::new("a1", 1, Role::Worker, 5);
        let agents = Arc::new(MemAgents(StdMutex::new(HashMap::from([(
            "a1".to_string(),
            agent,
        )]))));
        let scheduler = PriorityScheduler::new(
            tasks,
            agents,
            Arc::new(FixedWindow(0)),
            governor(),
            SchedulerConfig::default(),
        );
        let granted = scheduler.next_task("a1").await.unwrap();
        assert_eq!(granted.task_code, "high");
        assert_eq!(granted.status, TaskStatus::Leased);
    }
}
