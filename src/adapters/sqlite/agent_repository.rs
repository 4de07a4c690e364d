//! SQLite implementation of `AgentRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{HubError, HubResult};
use crate::domain::models::{Agent, AgentStatus, Role, NUMERIC_CODE_MAX, NUMERIC_CODE_MIN};
use crate::domain::ports::{AgentFilter, AgentRepository};

#[derive(Clone)]
pub struct SqliteAgentRepository {
    pool: SqlitePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentRepository for SqliteAgentRepository {
    async fn upsert(&self, agent: &Agent) -> HubResult<()> {
        let capabilities_json = serde_json::to_string(&agent.capabilities)?;
        let allowed_tools_json = serde_json::to_string(&agent.allowed_tools)?;

        sqlx::query(
            r#"INSERT INTO agents (agent_id, numeric_code, owner_role, capabilities, allowed_tools,
               capacity, completion_limit_per_minute, send_enabled, status, registered_utc, last_heartbeat_utc)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(agent_id) DO UPDATE SET
                   owner_role = excluded.owner_role,
                   capabilities = excluded.capabilities,
                   allowed_tools = excluded.allowed_tools,
                   capacity = excluded.capacity,
                   completion_limit_per_minute = excluded.completion_limit_per_minute,
                   send_enabled = excluded.send_enabled,
                   status = excluded.status,
                   last_heartbeat_utc = excluded.last_heartbeat_utc"#,
        )
        .bind(&agent.agent_id)
        .bind(i64::from(agent.numeric_code))
        .bind(agent.owner_role.as_str())
        .bind(&capabilities_json)
        .bind(&allowed_tools_json)
        .bind(i64::from(agent.capacity))
        .bind(i64::from(agent.completion_limit_per_minute))
        .bind(agent.send_enabled)
        .bind(agent.status.as_str())
        .bind(agent.registered_utc.to_rfc3339())
        .bind(agent.last_heartbeat_utc.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, agent_id: &str) -> HubResult<Option<Agent>> {
        let row: Option<AgentRow> = sqlx::query_as("SELECT * FROM agents WHERE agent_id = ?")
            .bind(agent_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn delete(&self, agent_id: &str) -> HubResult<()> {
        let result = sqlx::query("DELETE FROM agents WHERE agent_id = ?")
            .bind(agent_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(HubError::AgentNotFound(agent_id.to_string()));
        }
        Ok(())
    }

    async fn list(&self, filter: AgentFilter) -> HubResult<Vec<Agent>> {
        let mut sql = String::from("SELECT * FROM agents WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(status) = &filter.status {
            sql.push_str(" AND status = ?");
            bindings.push(status.as_str().to_string());
        }
        sql.push_str(" ORDER BY numeric_code ASC");

        let mut q = sqlx::query_as::<_, AgentRow>(&sql);
        for binding in &bindings {
            q = q.bind(binding);
        }
        let rows: Vec<AgentRow> = q.fetch_all(&self.pool).await?;
        let agents: Vec<Agent> = rows.into_iter().map(TryInto::try_into).collect::<HubResult<_>>()?;

        Ok(match &filter.capability {
            None => agents,
            Some(cap) => agents.into_iter().filter(|a| a.has_capability(cap)).collect(),
        })
    }

    async fn next_available_numeric_code(&self) -> HubResult<Option<u16>> {
        let used: Vec<(i64,)> = sqlx::query_as("SELECT numeric_code FROM agents ORDER BY numeric_code ASC")
            .fetch_all(&self.pool)
            .await?;
        let used: std::collections::HashSet<u16> = used.into_iter().map(|(c,)| c as u16).collect();

        for code in NUMERIC_CODE_MIN..=NUMERIC_CODE_MAX {
            if !used.contains(&code) {
                return Ok(Some(code));
            }
        }
        Ok(None)
    }

    async fn touch_heartbeat(&self, agent_id: &str) -> HubResult<()> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("UPDATE agents SET last_heartbeat_utc = ? WHERE agent_id = ?")
            .bind(&now)
            .bind(agent_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(HubError::AgentNotFound(agent_id.to_string()));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct AgentRow {
    agent_id: String,
    numeric_code: i64,
    owner_role: String,
    capabilities: String,
    allowed_tools: String,
    capacity: i64,
    completion_limit_per_minute: i64,
    send_enabled: bool,
    status: String,
    registered_utc: String,
    last_heartbeat_utc: String,
}

impl TryFrom<AgentRow> for Agent {
    type Error = HubError;

    fn try_from(row: AgentRow) -> Result<Self, Self::Error> {
        let registered_utc: DateTime<Utc> = DateTime::parse_from_rfc3339(&row.registered_utc)
            .map_err(|e| HubError::Internal(e.to_string()))?
            .with_timezone(&Utc);
        let last_heartbeat_utc: DateTime<Utc> = DateTime::parse_from_rfc3339(&row.last_heartbeat_utc)
            .map_err(|e| HubError::Internal(e.to_string()))?
            .with_timezone(&Utc);

        Ok(Agent {
            agent_id: row.agent_id,
            numeric_code: row.numeric_code as u16,
            owner_role: Role::from_str(&row.owner_role),
            capabilities: serde_json::from_str(&row.capabilities)?,
            allowed_tools: serde_json::from_str(&row.allowed_tools)?,
            capacity: row.capacity as u32,
            completion_limit_per_minute: row.completion_limit_per_minute as u32,
            send_enabled: row.send_enabled,
            status: status_from_str(&row.status)
                .ok_or_else(|| HubError::Internal(format!("invalid agent status: {}", row.status)))?,
            registered_utc,
            last_heartbeat_utc,
        })
    }
}

fn status_from_str(s: &str) -> Option<AgentStatus> {
    match s {
        "available" => Some(AgentStatus::Available),
        "busy" => Some(AgentStatus::Busy),
        "offline" => Some(AgentStatus::Offline),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_repo() -> SqliteAgentRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteAgentRepository::new(pool)
    }

    #[tokio::test]
    async fn upsert_and_get_round_trips() {
        let repo = setup_test_repo().await;
        let agent = Agent::new("A1", 1, Role::Worker, 4).with_capability("rust");

        repo.upsert(&agent).await.unwrap();

        let retrieved = repo.get("A1").await.unwrap().unwrap();
        assert_eq!(retrieved.numeric_code, 1);
        assert!(retrieved.has_capability("rust"));
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_same_agent_id() {
        let repo = setup_test_repo().await;
        let mut agent = Agent::new("A1", 1, Role::Worker, 4);
        repo.upsert(&agent).await.unwrap();

        agent.capacity = 8;
        repo.upsert(&agent).await.unwrap();

        let all = repo.list(AgentFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].capacity, 8);
    }

    #[tokio::test]
    async fn next_available_numeric_code_skips_used() {
        let repo = setup_test_repo().await;
        repo.upsert(&Agent::new("A1", 1, Role::Worker, 4)).await.unwrap();
        repo.upsert(&Agent::new("A2", 2, Role::Worker, 4)).await.unwrap();

        let next = repo.next_available_numeric_code().await.unwrap();
        assert_eq!(next, Some(3));
    }

    #[tokio::test]
    async fn list_filters_by_capability() {
        let repo = setup_test_repo().await;
        repo.upsert(&Agent::new("A1", 1, Role::Worker, 4).with_capability("rust"))
            .await
            .unwrap();
        repo.upsert(&Agent::new("A2", 2, Role::Worker, 4).with_capability("go"))
            .await
            .unwrap();

        let rust_agents = repo
            .list(AgentFilter {
                capability: Some("rust".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(rust_agents.len(), 1);
        assert_eq!(rust_agents[0].agent_id, "A1");
    }
}
