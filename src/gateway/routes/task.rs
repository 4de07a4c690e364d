//! `/api/task/create`, `/api/task/next`, `/api/task/result`, `/api/task/status`.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::domain::models::{Permission, Task, TaskStatus, Verdict};
use crate::domain::ports::TaskRepository;
use crate::gateway::auth::AuthContext;
use crate::gateway::error::GatewayError;
use crate::gateway::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub task_code: String,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub required_capability: Option<String>,
    #[serde(default = "serde_json::Value::default")]
    pub request: serde_json::Value,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<Json<Task>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::Create)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let mut task = Task::new(body.task_code, ctx.role, body.request);
    if let Some(priority) = body.priority {
        task = task.with_priority(priority);
    }
    if let Some(cap) = body.required_capability {
        task = task.with_required_capability(cap);
    }
    task.transition_to(TaskStatus::Ready)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    state
        .engine
        .tasks
        .create(&task)
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct NextTaskQuery {
    pub agent_id: String,
}

pub async fn next(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<NextTaskQuery>,
) -> Result<Json<Task>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::ReadAll)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let task = state
        .engine
        .scheduler
        .next_task(&query.agent_id)
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct ReportResultRequest {
    pub task_id: Uuid,
    pub agent_id: String,
    pub verdict: Verdict,
}

pub async fn result(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<ReportResultRequest>,
) -> Result<Json<Task>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::ReportResult)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let task = state
        .engine
        .lease_manager
        .release(body.task_id, &body.agent_id, body.verdict)
        .await
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    if task.status == TaskStatus::Done {
        state
            .engine
            .completions
            .record(&body.agent_id, task.task_id)
            .await
            .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

        if let Some(parent_id) = task.parent_task_id {
            if let Err(e) = state.engine.subtask_pool.record_subtask_summary(parent_id, task.task_id).await {
                warn!(task_id = %task.task_id, error = %e, "failed to record subtask summary");
            }
        }
    }

    Ok(Json(task))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub task_id: Option<Uuid>,
    pub task_code: Option<String>,
}

pub async fn status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Option<Task>>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::ReadAll)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let task = if let Some(id) = query.task_id {
        state.engine.tasks.get(id).await
    } else if let Some(code) = query.task_code {
        state.engine.tasks.get_by_task_code(&code).await
    } else {
        state.engine.tasks.list(Default::default()).await.map(|v| v.into_iter().next())
    }
    .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    Ok(Json(task))
}
