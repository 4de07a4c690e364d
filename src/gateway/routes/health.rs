//! `/health` and `/health/ready` — no auth, no permission check.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::gateway::state::AppState;

pub async fn liveness() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn readiness(State(state): State<AppState>) -> Json<Value> {
    let db_ok = sqlx::query("SELECT 1").execute(&state.engine.pool).await.is_ok();
    Json(json!({ "status": if db_ok { "ok" } else { "degraded" }, "database": db_ok }))
}
