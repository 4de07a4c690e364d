//! `POST /mcp` — thin JSON-RPC 2.0 multiplex over the same operations the
//! REST routes expose (spec.md §9: "REST as primary surface with
//! JSON-RPC as a thin multiplex at `/mcp`"). Each method maps onto one
//! permission, checked before the call is dispatched.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::HubError;
use crate::domain::models::{Agent, Permission, Role, Task, TaskStatus, Verdict};
use crate::domain::ports::{AgentRepository, TaskRepository};
use crate::gateway::auth::AuthContext;
use crate::gateway::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub reason_code: String,
}

impl RpcResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0", result: Some(result), error: None, id }
    }

    fn err(id: Value, err: HubError) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(RpcError {
                code: -32000,
                message: err.to_string(),
                reason_code: err.reason_code().to_string(),
            }),
            id,
        }
    }

    fn method_not_found(id: Value, method: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(RpcError {
                code: -32601,
                message: format!("method not found: {method}"),
                reason_code: "SCHEMA_INVALID".to_string(),
            }),
            id,
        }
    }

    fn invalid_params(id: Value, detail: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(RpcError {
                code: -32602,
                message: format!("invalid params: {detail}"),
                reason_code: "SCHEMA_INVALID".to_string(),
            }),
            id,
        }
    }
}

pub async fn rpc(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<RpcRequest>,
) -> Json<RpcResponse> {
    Json(dispatch(&state, &ctx, req).await)
}

async fn dispatch(state: &AppState, ctx: &AuthContext, req: RpcRequest) -> RpcResponse {
    let id = req.id;
    match req.method.as_str() {
        "task.create" => {
            if let Err(e) = state.engine.policy_gate.authorize(ctx.role, Permission::Create) {
                return RpcResponse::err(id, e);
            }
            let Ok(params) = serde_json::from_value::<CreateTaskParams>(req.params) else {
                return RpcResponse::invalid_params(id, "expected {task_code, request}");
            };
            let mut task = Task::new(params.task_code, ctx.role, params.request);
            if let Some(priority) = params.priority {
                task = task.with_priority(priority);
            }
            if let Some(cap) = params.required_capability {
                task = task.with_required_capability(cap);
            }
            if let Err(e) = task.transition_to(TaskStatus::Ready) {
                return RpcResponse::err(id, e);
            }
            match state.engine.tasks.create(&task).await {
                Ok(()) => RpcResponse::ok(id, serde_json::to_value(task).unwrap_or(Value::Null)),
                Err(e) => RpcResponse::err(id, e),
            }
        }
        "task.next" => {
            if let Err(e) = state.engine.policy_gate.authorize(ctx.role, Permission::ReadAll) {
                return RpcResponse::err(id, e);
            }
            let Some(agent_id) = req.params.get("agent_id").and_then(Value::as_str) else {
                return RpcResponse::invalid_params(id, "expected {agent_id}");
            };
            match state.engine.scheduler.next_task(agent_id).await {
                Ok(task) => RpcResponse::ok(id, serde_json::to_value(task).unwrap_or(Value::Null)),
                Err(e) => RpcResponse::err(id, e),
            }
        }
        "task.result" => {
            if let Err(e) = state.engine.policy_gate.authorize(ctx.role, Permission::ReportResult) {
                return RpcResponse::err(id, e);
            }
            let Ok(params) = serde_json::from_value::<ReportResultParams>(req.params) else {
                return RpcResponse::invalid_params(id, "expected {task_id, agent_id, verdict}");
            };
            match state.engine.lease_manager.release(params.task_id, &params.agent_id, params.verdict).await {
                Ok(task) => {
                    if task.status == TaskStatus::Done {
                        if let Err(e) = state.engine.completions.record(&params.agent_id, task.task_id).await {
                            return RpcResponse::err(id, e);
                        }
                        if let Some(parent_id) = task.parent_task_id {
                            if let Err(e) = state.engine.subtask_pool.record_subtask_summary(parent_id, task.task_id).await {
                                tracing::warn!(task_id = %task.task_id, error = %e, "failed to record subtask summary");
                            }
                        }
                    }
                    RpcResponse::ok(id, serde_json::to_value(task).unwrap_or(Value::Null))
                }
                Err(e) => RpcResponse::err(id, e),
            }
        }
        "task.status" => {
            if let Err(e) = state.engine.policy_gate.authorize(ctx.role, Permission::ReadAll) {
                return RpcResponse::err(id, e);
            }
            let task_id = req.params.get("task_id").and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok());
            let task_code = req.params.get("task_code").and_then(Value::as_str);
            let result = if let Some(tid) = task_id {
                state.engine.tasks.get(tid).await
            } else if let Some(code) = task_code {
                state.engine.tasks.get_by_task_code(code).await
            } else {
                return RpcResponse::invalid_params(id, "expected {task_id} or {task_code}");
            };
            match result {
                Ok(task) => RpcResponse::ok(id, serde_json::to_value(task).unwrap_or(Value::Null)),
                Err(e) => RpcResponse::err(id, e),
            }
        }
        "agent.register" => {
            if let Err(e) = state.engine.policy_gate.authorize(ctx.role, Permission::Assign) {
                return RpcResponse::err(id, e);
            }
            let Ok(params) = serde_json::from_value::<RegisterAgentParams>(req.params) else {
                return RpcResponse::invalid_params(id, "expected agent registration fields");
            };
            let existing = match state.engine.agents.get(&params.agent_id).await {
                Ok(existing) => existing,
                Err(e) => return RpcResponse::err(id, e),
            };
            let numeric_code = match existing {
                Some(agent) => agent.numeric_code,
                None => match state.engine.agents.next_available_numeric_code().await {
                    Ok(Some(code)) => code,
                    Ok(None) => return RpcResponse::err(id, HubError::AgentCodeExhausted),
                    Err(e) => return RpcResponse::err(id, e),
                },
            };
            let mut agent = Agent::new(&params.agent_id, numeric_code, Role::from_str(&params.owner_role), params.capacity)
                .with_capabilities(params.capabilities)
                .with_completion_limit(params.completion_limit_per_minute.unwrap_or(60));
            for tool in params.allowed_tools {
                agent = agent.with_allowed_tool(tool);
            }
            match state.engine.agents.upsert(&agent).await {
                Ok(()) => RpcResponse::ok(id, serde_json::to_value(agent).unwrap_or(Value::Null)),
                Err(e) => RpcResponse::err(id, e),
            }
        }
        "agent.get" => {
            if let Err(e) = state.engine.policy_gate.authorize(ctx.role, Permission::ReadAll) {
                return RpcResponse::err(id, e);
            }
            let Some(agent_id) = req.params.get("agent_id").and_then(Value::as_str) else {
                return RpcResponse::invalid_params(id, "expected {agent_id}");
            };
            match state.engine.agents.get(agent_id).await {
                Ok(Some(agent)) => RpcResponse::ok(id, serde_json::to_value(agent).unwrap_or(Value::Null)),
                Ok(None) => RpcResponse::err(id, HubError::AgentNotFound(agent_id.to_string())),
                Err(e) => RpcResponse::err(id, e),
            }
        }
        "dlq.get" => {
            if let Err(e) = state.engine.policy_gate.authorize(ctx.role, Permission::ReadAll) {
                return RpcResponse::err(id, e);
            }
            let Some(task_id) = req.params.get("task_id").and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok())
            else {
                return RpcResponse::invalid_params(id, "expected {task_id}");
            };
            match state.engine.tasks.get(task_id).await {
                Ok(Some(task)) if task.status == TaskStatus::Dlq => {
                    RpcResponse::ok(id, serde_json::to_value(task).unwrap_or(Value::Null))
                }
                Ok(_) => RpcResponse::err(id, HubError::TaskNotFound(task_id)),
                Err(e) => RpcResponse::err(id, e),
            }
        }
        "dlq.replay" => {
            if let Err(e) = state.engine.policy_gate.authorize(ctx.role, Permission::ReplayDlq) {
                return RpcResponse::err(id, e);
            }
            let Some(task_id) = req.params.get("task_id").and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok())
            else {
                return RpcResponse::invalid_params(id, "expected {task_id}");
            };
            match state.engine.lease_manager.replay_dlq(task_id).await {
                Ok(replayed) => RpcResponse::ok(id, serde_json::to_value(replayed).unwrap_or(Value::Null)),
                Err(e) => RpcResponse::err(id, e),
            }
        }
        "ata.send" => {
            if let Err(e) = state.engine.policy_gate.authorize(ctx.role, Permission::Create) {
                return RpcResponse::err(id, e);
            }
            let Ok(params) = serde_json::from_value::<AtaSendParams>(req.params) else {
                return RpcResponse::invalid_params(id, "expected {from, to, task_code, kind, payload}");
            };
            match state
                .engine
                .a2a_bus
                .ata_send(&params.from, &params.to, &params.task_code, params.kind, params.payload, params.priority, params.requires_response)
                .await
            {
                Ok(msg_id) => RpcResponse::ok(id, serde_json::json!({ "msg_id": msg_id })),
                Err(e) => RpcResponse::err(id, e),
            }
        }
        "ata.receive" => {
            if let Err(e) = state.engine.policy_gate.authorize(ctx.role, Permission::ReadAll) {
                return RpcResponse::err(id, e);
            }
            let Some(to) = req.params.get("to").and_then(Value::as_str) else {
                return RpcResponse::invalid_params(id, "expected {to}");
            };
            let from = req.params.get("from").and_then(Value::as_str);
            let unread_only = req.params.get("unread_only").and_then(Value::as_bool).unwrap_or(false);
            let limit = req.params.get("limit").and_then(Value::as_u64).map_or(50, |n| n as usize);
            match state.engine.a2a_bus.ata_receive(to, from, unread_only, limit).await {
                Ok(messages) => RpcResponse::ok(id, serde_json::to_value(messages).unwrap_or(Value::Null)),
                Err(e) => RpcResponse::err(id, e),
            }
        }
        other => RpcResponse::method_not_found(id, other),
    }
}

#[derive(Debug, Deserialize)]
struct CreateTaskParams {
    task_code: String,
    #[serde(default)]
    priority: Option<u8>,
    #[serde(default)]
    required_capability: Option<String>,
    #[serde(default)]
    request: Value,
}

#[derive(Debug, Deserialize)]
struct ReportResultParams {
    task_id: Uuid,
    agent_id: String,
    verdict: Verdict,
}

#[derive(Debug, Deserialize)]
struct RegisterAgentParams {
    agent_id: String,
    owner_role: String,
    capacity: u32,
    #[serde(default)]
    capabilities: Vec<String>,
    #[serde(default)]
    allowed_tools: Vec<String>,
    #[serde(default)]
    completion_limit_per_minute: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AtaSendParams {
    from: String,
    to: String,
    task_code: String,
    kind: crate::domain::models::MessageKind,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    priority: crate::domain::models::MessagePriority,
    #[serde(default)]
    requires_response: bool,
}
