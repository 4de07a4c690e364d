//! Agent repository port.

use async_trait::async_trait;

use crate::domain::errors::HubResult;
use crate::domain::models::Agent;

#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    pub capability: Option<String>,
    pub status: Option<crate::domain::models::AgentStatus>,
}

#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Insert or, if `agent_id` already exists, update in place
    /// (SPEC_FULL.md §4.5: idempotent register on identical spec).
    async fn upsert(&self, agent: &Agent) -> HubResult<()>;

    async fn get(&self, agent_id: &str) -> HubResult<Option<Agent>>;

    async fn delete(&self, agent_id: &str) -> HubResult<()>;

    async fn list(&self, filter: AgentFilter) -> HubResult<Vec<Agent>>;

    /// Smallest numeric code in `[1,100]` not currently assigned to any
    /// agent, or `None` if the space is exhausted.
    async fn next_available_numeric_code(&self) -> HubResult<Option<u16>>;

    async fn touch_heartbeat(&self, agent_id: &str) -> HubResult<()>;
}
