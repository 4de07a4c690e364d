//! SQLite implementation of `TaskRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Emit a warning when a serialized request JSON blob exceeds this size.
const JSON_SIZE_WARN_BYTES: usize = 64 * 1024;

use crate::domain::errors::{HubError, HubResult};
use crate::domain::models::{Role, Task, TaskStatus, Verdict};
use crate::domain::ports::{TaskFilter, TaskRepository};

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, task: &Task) -> HubResult<()> {
        let request_json = serde_json::to_string(&task.request)?;
        if request_json.len() > JSON_SIZE_WARN_BYTES {
            tracing::warn!(
                task_id = %task.task_id,
                size_bytes = request_json.len(),
                "request JSON in create() exceeds size threshold"
            );
        }
        let pins_json = serde_json::to_string(&task.pins)?;
        let allowed_tests_json = serde_json::to_string(&task.allowed_tests)?;
        let acceptance_json = serde_json::to_string(&task.acceptance)?;
        let stop_conditions_json = serde_json::to_string(&task.stop_conditions)?;

        sqlx::query(
            r#"INSERT INTO tasks (task_id, parent_task_id, task_code, status, verdict, priority,
               owner_role, required_capability, assigned_agent, retry_count, max_retries,
               lease_expiry, request, task_class_id, pins, allowed_tests, acceptance,
               stop_conditions, created_utc, updated_utc, run_id, exit_code, report_path, evidence_dir)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(task.task_id.to_string())
        .bind(task.parent_task_id.map(|id| id.to_string()))
        .bind(&task.task_code)
        .bind(task.status.as_str())
        .bind(task.verdict.map(verdict_str))
        .bind(i64::from(task.priority))
        .bind(task.owner_role.as_str())
        .bind(&task.required_capability)
        .bind(&task.assigned_agent)
        .bind(i64::from(task.retry_count))
        .bind(i64::from(task.max_retries))
        .bind(task.lease_expiry.map(|t| t.to_rfc3339()))
        .bind(&request_json)
        .bind(&task.task_class_id)
        .bind(&pins_json)
        .bind(&allowed_tests_json)
        .bind(&acceptance_json)
        .bind(&stop_conditions_json)
        .bind(task.created_utc.to_rfc3339())
        .bind(task.updated_utc.to_rfc3339())
        .bind(task.run_id.map(|id| id.to_string()))
        .bind(task.exit_code)
        .bind(&task.report_path)
        .bind(&task.evidence_dir)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> HubResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE task_id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn update(&self, task: &Task) -> HubResult<()> {
        let request_json = serde_json::to_string(&task.request)?;
        let pins_json = serde_json::to_string(&task.pins)?;
        let allowed_tests_json = serde_json::to_string(&task.allowed_tests)?;
        let acceptance_json = serde_json::to_string(&task.acceptance)?;
        let stop_conditions_json = serde_json::to_string(&task.stop_conditions)?;

        let result = sqlx::query(
            r#"UPDATE tasks SET parent_task_id = ?, status = ?, verdict = ?, priority = ?,
               owner_role = ?, required_capability = ?, assigned_agent = ?, retry_count = ?,
               max_retries = ?, lease_expiry = ?, request = ?, task_class_id = ?, pins = ?,
               allowed_tests = ?, acceptance = ?, stop_conditions = ?, updated_utc = ?,
               run_id = ?, exit_code = ?, report_path = ?, evidence_dir = ?
               WHERE task_id = ?"#,
        )
        .bind(task.parent_task_id.map(|id| id.to_string()))
        .bind(task.status.as_str())
        .bind(task.verdict.map(verdict_str))
        .bind(i64::from(task.priority))
        .bind(task.owner_role.as_str())
        .bind(&task.required_capability)
        .bind(&task.assigned_agent)
        .bind(i64::from(task.retry_count))
        .bind(i64::from(task.max_retries))
        .bind(task.lease_expiry.map(|t| t.to_rfc3339()))
        .bind(&request_json)
        .bind(&task.task_class_id)
        .bind(&pins_json)
        .bind(&allowed_tests_json)
        .bind(&acceptance_json)
        .bind(&stop_conditions_json)
        .bind(task.updated_utc.to_rfc3339())
        .bind(task.run_id.map(|id| id.to_string()))
        .bind(task.exit_code)
        .bind(&task.report_path)
        .bind(&task.evidence_dir)
        .bind(task.task_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(HubError::TaskNotFound(task.task_id));
        }
        Ok(())
    }

    async fn list(&self, filter: TaskFilter) -> HubResult<Vec<Task>> {
        let mut query = String::from("SELECT * FROM tasks WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(status) = &filter.status {
            query.push_str(" AND status = ?");
            bindings.push(status.as_str().to_string());
        }
        if let Some(parent) = &filter.parent_task_id {
            query.push_str(" AND parent_task_id = ?");
            bindings.push(parent.to_string());
        }
        if let Some(agent) = &filter.assigned_agent {
            query.push_str(" AND assigned_agent = ?");
            bindings.push(agent.clone());
        }
        if let Some(code) = &filter.task_code {
            query.push_str(" AND task_code = ?");
            bindings.push(code.clone());
        }
        query.push_str(" ORDER BY created_utc ASC");

        let mut q = sqlx::query_as::<_, TaskRow>(&query);
        for binding in &bindings {
            q = q.bind(binding);
        }
        let rows: Vec<TaskRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_ready_for_capabilities(&self, agent_capabilities: &[String]) -> HubResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE status = 'ready' ORDER BY priority DESC, created_utc ASC, task_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(TryInto::<Task>::try_into)
            .collect::<HubResult<Vec<Task>>>()
            .map(|tasks| {
                tasks
                    .into_iter()
                    .filter(|t| match &t.required_capability {
                        None => true,
                        Some(cap) => agent_capabilities.iter().any(|c| c == cap),
                    })
                    .collect()
            })
    }

    async fn count_active_for_agent(&self, agent_id: &str) -> HubResult<u32> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE assigned_agent = ? AND status IN ('leased', 'in_progress')",
        )
        .bind(agent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0 as u32)
    }

    async fn try_lease(
        &self,
        task_id: Uuid,
        agent_id: &str,
        lease_expiry: DateTime<Utc>,
    ) -> HubResult<bool> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"UPDATE tasks SET status = 'leased', assigned_agent = ?, lease_expiry = ?, updated_utc = ?
               WHERE task_id = ? AND status = 'ready'"#,
        )
        .bind(agent_id)
        .bind(lease_expiry.to_rfc3339())
        .bind(&now)
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_expired_leases(&self) -> HubResult<Vec<Task>> {
        let now = Utc::now().to_rfc3339();
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE status IN ('leased', 'in_progress') AND lease_expiry IS NOT NULL AND lease_expiry < ?",
        )
        .bind(&now)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_by_task_code(&self, task_code: &str) -> HubResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE task_code = ?")
            .bind(task_code)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }
}

const fn verdict_str(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Pass => "PASS",
        Verdict::Fail => "FAIL",
        Verdict::Unknown => "UNKNOWN",
    }
}

fn verdict_from_str(s: &str) -> Verdict {
    match s {
        "PASS" => Verdict::Pass,
        "FAIL" => Verdict::Fail,
        _ => Verdict::Unknown,
    }
}

fn verdict_from_opt_str(s: Option<&str>) -> Option<Verdict> {
    s.map(verdict_from_str)
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    task_id: String,
    parent_task_id: Option<String>,
    task_code: String,
    status: String,
    verdict: Option<String>,
    priority: i64,
    owner_role: String,
    required_capability: Option<String>,
    assigned_agent: Option<String>,
    retry_count: i64,
    max_retries: i64,
    lease_expiry: Option<String>,
    request: String,
    task_class_id: Option<String>,
    pins: String,
    allowed_tests: String,
    acceptance: String,
    stop_conditions: String,
    created_utc: String,
    updated_utc: String,
    run_id: Option<String>,
    exit_code: Option<i32>,
    report_path: Option<String>,
    evidence_dir: Option<String>,
}

impl TryFrom<TaskRow> for Task {
    type Error = HubError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            task_id: Uuid::parse_str(&row.task_id).map_err(|e| HubError::Internal(e.to_string()))?,
            parent_task_id: row
                .parent_task_id
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .map_err(|e| HubError::Internal(e.to_string()))?,
            task_code: row.task_code,
            status: TaskStatus::from_str(&row.status)
                .ok_or_else(|| HubError::Internal(format!("invalid status: {}", row.status)))?,
            verdict: verdict_from_opt_str(row.verdict.as_deref()),
            priority: row.priority as u8,
            owner_role: Role::from_str(&row.owner_role),
            required_capability: row.required_capability,
            assigned_agent: row.assigned_agent,
            retry_count: row.retry_count as u32,
            max_retries: row.max_retries as u32,
            lease_expiry: row
                .lease_expiry
                .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
                .transpose()
                .map_err(|e| HubError::Internal(e.to_string()))?,
            request: serde_json::from_str(&row.request)?,
            task_class_id: row.task_class_id,
            pins: serde_json::from_str(&row.pins)?,
            allowed_tests: serde_json::from_str(&row.allowed_tests)?,
            acceptance: serde_json::from_str(&row.acceptance)?,
            stop_conditions: serde_json::from_str(&row.stop_conditions)?,
            created_utc: DateTime::parse_from_rfc3339(&row.created_utc)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| HubError::Internal(e.to_string()))?,
            updated_utc: DateTime::parse_from_rfc3339(&row.updated_utc)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| HubError::Internal(e.to_string()))?,
            run_id: row
                .run_id
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .map_err(|e| HubError::Internal(e.to_string()))?,
            exit_code: row.exit_code,
            report_path: row.report_path,
            evidence_dir: row.evidence_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_repo() -> SqliteTaskRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteTaskRepository::new(pool)
    }

    #[tokio::test]
    async fn create_and_get_round_trips() {
        let repo = setup_test_repo().await;
        let task = Task::new("t1", Role::Worker, serde_json::json!({"goal": "x"}));

        repo.create(&task).await.unwrap();

        let retrieved = repo.get(task.task_id).await.unwrap().unwrap();
        assert_eq!(retrieved.task_code, "t1");
        assert_eq!(retrieved.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn try_lease_only_succeeds_from_ready() {
        let repo = setup_test_repo().await;
        let mut task = Task::new("t1", Role::Worker, serde_json::json!({}));
        task.transition_to(TaskStatus::Ready).unwrap();
        repo.create(&task).await.unwrap();

        let expiry = Utc::now() + chrono::Duration::seconds(300);
        let first = repo.try_lease(task.task_id, "agent-a", expiry).await.unwrap();
        assert!(first);

        let second = repo.try_lease(task.task_id, "agent-b", expiry).await.unwrap();
        assert!(!second);
    }

    #[tokio::test]
    async fn list_ready_for_capabilities_filters_by_capability() {
        let repo = setup_test_repo().await;
        let mut needs_rust = Task::new("needs-rust", Role::Worker, serde_json::json!({}))
            .with_required_capability("rust");
        needs_rust.transition_to(TaskStatus::Ready).unwrap();
        let mut needs_go =
            Task::new("needs-go", Role::Worker, serde_json::json!({})).with_required_capability("go");
        needs_go.transition_to(TaskStatus::Ready).unwrap();
        repo.create(&needs_rust).await.unwrap();
        repo.create(&needs_go).await.unwrap();

        let eligible = repo
            .list_ready_for_capabilities(&["rust".to_string()])
            .await
            .unwrap();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].task_code, "needs-rust");
    }

    #[tokio::test]
    async fn count_active_for_agent_counts_leased_and_in_progress() {
        let repo = setup_test_repo().await;
        let mut task = Task::new("t1", Role::Worker, serde_json::json!({}));
        task.transition_to(TaskStatus::Ready).unwrap();
        task.transition_to(TaskStatus::Leased).unwrap();
        task.assigned_agent = Some("agent-a".to_string());
        repo.create(&task).await.unwrap();

        let count = repo.count_active_for_agent("agent-a").await.unwrap();
        assert_eq!(count, 1);
    }
}
