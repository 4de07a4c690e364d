//! `/api/dlq/{task_id}`, `/api/dlq/replay`.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::errors::HubError;
use crate::domain::models::{Permission, Task, TaskStatus};
use crate::domain::ports::{EventLogPort, TaskRepository};
use crate::gateway::auth::AuthContext;
use crate::gateway::error::GatewayError;
use crate::gateway::state::AppState;

pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::ReadAll)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let task = state
        .engine
        .tasks
        .get(task_id)
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?
        .ok_or_else(|| GatewayError::new(HubError::TaskNotFound(task_id), ctx.trace_id))?;

    if task.status != TaskStatus::Dlq {
        return Err(GatewayError::new(HubError::TaskNotFound(task_id), ctx.trace_id));
    }
    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct ReplayRequest {
    pub task_id: Uuid,
}

pub async fn replay(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<ReplayRequest>,
) -> Result<Json<Task>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::ReplayDlq)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let replayed = state
        .engine
        .lease_manager
        .replay_dlq(body.task_id)
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    state
        .engine
        .event_log
        .emit(
            replayed.task_id,
            &crate::domain::models::Event::new(
                replayed.task_id,
                crate::domain::models::EventKind::Event,
                "replay_created",
                serde_json::json!({ "predecessor": body.task_id }),
            ),
        )
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    Ok(Json(replayed))
}
