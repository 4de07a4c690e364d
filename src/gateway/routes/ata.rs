//! `/api/ata/send`, `/api/ata/receive` — the A2A messaging surface.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::domain::models::{A2AMessage, MessageKind, MessagePriority, Permission};
use crate::gateway::auth::AuthContext;
use crate::gateway::error::GatewayError;
use crate::gateway::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub from: String,
    pub to: String,
    pub task_code: String,
    pub kind: MessageKind,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub priority: MessagePriority,
    #[serde(default)]
    pub requires_response: bool,
}

pub async fn send(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<SendRequest>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::Create)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let msg_id = state
        .engine
        .a2a_bus
        .ata_send(
            &body.from,
            &body.to,
            &body.task_code,
            body.kind,
            body.payload,
            body.priority,
            body.requires_response,
        )
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    Ok(Json(serde_json::json!({ "success": true, "msg_id": msg_id })))
}

#[derive(Debug, Deserialize)]
pub struct ReceiveQuery {
    pub to: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default = "default_receive_limit")]
    pub limit: usize,
}

const fn default_receive_limit() -> usize {
    50
}

pub async fn receive(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ReceiveQuery>,
) -> Result<Json<Vec<A2AMessage>>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::ReadAll)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let messages = state
        .engine
        .a2a_bus
        .ata_receive(&query.to, query.from.as_deref(), query.unread_only, query.limit)
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    Ok(Json(messages))
}
