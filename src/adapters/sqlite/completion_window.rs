//! Trailing-60s completion counter backing `PriorityScheduler`'s per-agent
//! rate limit (spec.md §4.6 step 3), persisted in `task_completions`.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{HubError, HubResult};
use crate::services::priority_scheduler::CompletionWindow;

#[derive(Clone)]
pub struct SqliteCompletionWindow {
    pool: SqlitePool,
}

impl SqliteCompletionWindow {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records a completion event for `agent_id`/`task_id` at the current
    /// time. Called by the gateway's report-result handler on `Done`.
    pub async fn record(&self, agent_id: &str, task_id: Uuid) -> HubResult<()> {
        sqlx::query("INSERT INTO task_completions (agent_id, task_id, completed_utc) VALUES (?, ?, ?)")
            .bind(agent_id)
            .bind(task_id.to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(HubError::from)?;
        Ok(())
    }
}

#[async_trait]
impl CompletionWindow for SqliteCompletionWindow {
    async fn completions_last_minute(&self, agent_id: &str) -> HubResult<u32> {
        let cutoff = (Utc::now() - chrono::Duration::seconds(60)).to_rfc3339();
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM task_completions WHERE agent_id = ? AND completed_utc >= ?",
        )
        .bind(agent_id)
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await
        .map_err(HubError::from)?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}
