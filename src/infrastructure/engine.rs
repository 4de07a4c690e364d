//! Wires adapters and services into the aggregate the gateway and CLI
//! both hold, following the teacher's single `Engine` composition root
//! pattern (previously `infrastructure/database::DatabaseConnection`
//! plus ad hoc service construction scattered across `cli::service::*`).

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::adapters::fs::{FsEventLog, FsEvidenceStore, FsSubtaskIndex, FsTodoStore};
use crate::adapters::sqlite::{
    initialize_database, SqliteAgentRepository, SqliteCompletionWindow, SqliteMessageRepository,
    SqliteTaskRepository,
};
use crate::domain::models::Config;
use crate::domain::ports::{AgentRepository, MessageRepository, SubtaskIndexPort, TaskRepository, TodoStorePort};
use crate::services::{
    A2ABus, LeaseManager, OrchestratorCore, PolicyGate, PriorityScheduler, RateLimiter, ResourceGovernor,
    SseGuard, SubtaskPool,
};

/// The fully-wired service graph for one running hub instance.
pub struct Engine {
    pub config: Config,
    pub pool: SqlitePool,
    pub tasks: Arc<dyn TaskRepository>,
    pub agents: Arc<dyn AgentRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub completions: Arc<SqliteCompletionWindow>,
    pub todo_store: Arc<dyn TodoStorePort>,
    pub subtask_index: Arc<dyn SubtaskIndexPort>,
    pub event_log: Arc<FsEventLog>,
    pub evidence_store: Arc<FsEvidenceStore>,
    pub scheduler: Arc<PriorityScheduler>,
    pub lease_manager: Arc<LeaseManager>,
    pub governor: Arc<ResourceGovernor>,
    pub policy_gate: Arc<PolicyGate>,
    pub a2a_bus: Arc<A2ABus>,
    pub orchestrator: Arc<OrchestratorCore>,
    pub subtask_pool: Arc<SubtaskPool>,
}

impl Engine {
    /// Opens the database, runs migrations, and constructs every
    /// service against its adapters. `config.repo_root` roots both the
    /// filesystem adapters and the policy gate's path-prefix checks.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let database_url = format!("sqlite:{}", config.database.path);
        let pool = initialize_database(&database_url).await?;
        Self::from_pool(config, pool).await
    }

    /// Builds the engine against an already-open pool (tests, or a
    /// caller that wants to control pool lifecycle itself).
    pub async fn from_pool(config: Config, pool: SqlitePool) -> anyhow::Result<Self> {
        let repo_root = PathBuf::from(&config.repo_root);

        let tasks: Arc<dyn TaskRepository> = Arc::new(SqliteTaskRepository::new(pool.clone()));
        let agents: Arc<dyn AgentRepository> = Arc::new(SqliteAgentRepository::new(pool.clone()));
        let messages: Arc<dyn MessageRepository> = Arc::new(SqliteMessageRepository::new(pool.clone()));
        let completions = Arc::new(SqliteCompletionWindow::new(pool.clone()));

        let todo_store: Arc<dyn TodoStorePort> = Arc::new(FsTodoStore::new(repo_root.clone()));
        let subtask_index: Arc<dyn SubtaskIndexPort> = Arc::new(FsSubtaskIndex::new(repo_root.clone()));
        let event_log = Arc::new(FsEventLog::new(repo_root.clone()));
        let evidence_store = Arc::new(FsEvidenceStore::new(repo_root.clone()));

        let governor = Arc::new(ResourceGovernor::new(config.governor.clone()));
        let scheduler = Arc::new(PriorityScheduler::new(
            tasks.clone(),
            agents.clone(),
            completions.clone(),
            governor.clone(),
            config.scheduler.clone(),
        ));
        let lease_manager = Arc::new(LeaseManager::new(tasks.clone()));

        let rate_limiter = RateLimiter::new(&config.rate_limit);
        let sse_guard = SseGuard::new(config.server.sse_max_connections);
        let policy_gate = Arc::new(PolicyGate::new(
            config.policy_gate.clone(),
            repo_root.clone(),
            rate_limiter,
            sse_guard,
        ));

        let a2a_bus = Arc::new(A2ABus::new(agents.clone(), messages.clone()));
        let orchestrator = Arc::new(OrchestratorCore::new(todo_store.clone()));
        let subtask_pool = Arc::new(SubtaskPool::new(
            tasks.clone(),
            subtask_index.clone(),
            evidence_store.clone(),
            event_log.clone(),
        ));

        Ok(Self {
            config,
            pool,
            tasks,
            agents,
            messages,
            completions,
            todo_store,
            subtask_index,
            event_log,
            evidence_store,
            scheduler,
            lease_manager,
            governor,
            policy_gate,
            a2a_bus,
            orchestrator,
            subtask_pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    #[tokio::test]
    async fn wires_all_services_against_a_migrated_pool() {
        let pool = create_migrated_test_pool().await.unwrap();
        let engine = Engine::from_pool(Config::default(), pool).await.unwrap();
        assert_eq!(engine.agents.list(Default::default()).await.unwrap().len(), 0);
    }
}
