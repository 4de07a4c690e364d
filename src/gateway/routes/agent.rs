//! `/api/agent/register`, `/api/agent/{id}` (GET/PUT/DELETE).

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::domain::errors::HubError;
use crate::domain::models::{Agent, Permission, Role};
use crate::domain::ports::AgentRepository;
use crate::gateway::auth::AuthContext;
use crate::gateway::error::GatewayError;
use crate::gateway::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterAgentRequest {
    pub agent_id: String,
    pub owner_role: String,
    pub capacity: u32,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub completion_limit_per_minute: Option<u32>,
}

pub async fn register(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<RegisterAgentRequest>,
) -> Result<Json<Agent>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::Assign)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let existing = state
        .engine
        .agents
        .get(&req.agent_id)
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let numeric_code = match &existing {
        Some(agent) => agent.numeric_code,
        None => state
            .engine
            .agents
            .next_available_numeric_code()
            .await
            .map_err(|e| GatewayError::new(e, ctx.trace_id))?
            .ok_or_else(|| GatewayError::new(HubError::AgentCodeExhausted, ctx.trace_id))?,
    };

    let mut agent = Agent::new(&req.agent_id, numeric_code, Role::from_str(&req.owner_role), req.capacity)
        .with_capabilities(req.capabilities)
        .with_completion_limit(req.completion_limit_per_minute.unwrap_or(60));
    for tool in req.allowed_tools {
        agent = agent.with_allowed_tool(tool);
    }

    state
        .engine
        .agents
        .upsert(&agent)
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    Ok(Json(agent))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(agent_id): Path<String>,
) -> Result<Json<Agent>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::ReadAll)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let agent = state
        .engine
        .agents
        .get(&agent_id)
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?
        .ok_or_else(|| GatewayError::new(HubError::AgentNotFound(agent_id), ctx.trace_id))?;
    Ok(Json(agent))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAgentRequest {
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
    #[serde(default)]
    pub send_enabled: Option<bool>,
}

pub async fn put(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(agent_id): Path<String>,
    Json(req): Json<UpdateAgentRequest>,
) -> Result<Json<Agent>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::Assign)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let mut agent = state
        .engine
        .agents
        .get(&agent_id)
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?
        .ok_or_else(|| GatewayError::new(HubError::AgentNotFound(agent_id.clone()), ctx.trace_id))?;

    if let Some(capacity) = req.capacity {
        agent.capacity = capacity;
    }
    if let Some(caps) = req.capabilities {
        agent.capabilities = caps.into_iter().collect();
    }
    if let Some(send_enabled) = req.send_enabled {
        agent.send_enabled = send_enabled;
    }

    state
        .engine
        .agents
        .upsert(&agent)
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;
    Ok(Json(agent))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(agent_id): Path<String>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::Assign)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    state
        .engine
        .agents
        .delete(&agent_id)
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;
    Ok(Json(serde_json::json!({ "success": true })))
}
