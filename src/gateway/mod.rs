//! HTTP gateway (C11): thin axum adapter over the services in
//! `crate::services`, enforcing `PolicyGate` at every route.
//!
//! Grounded on the teacher's orphaned `adapters/mcp/a2a_http.rs` router
//! assembly (CORS + trace layer over a `Router::with_state`), rebuilt
//! against spec.md §6's actual route table.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::infrastructure::Engine;
use state::AppState;

/// Builds the full application router over a wired `Engine`.
pub fn build_router(engine: Arc<Engine>) -> Router {
    let state = AppState::new(engine);

    let protected = Router::new()
        .route("/api/agent/register", post(routes::agent::register))
        .route(
            "/api/agent/{agent_id}",
            get(routes::agent::get).put(routes::agent::put).delete(routes::agent::delete),
        )
        .route("/api/task/create", post(routes::task::create))
        .route("/api/task/next", get(routes::task::next))
        .route("/api/task/result", post(routes::task::result))
        .route("/api/task/status", get(routes::task::status))
        .route("/api/dlq/{task_id}", get(routes::dlq::get))
        .route("/api/dlq/replay", post(routes::dlq::replay))
        .route("/api/ata/send", post(routes::ata::send))
        .route("/api/ata/receive", get(routes::ata::receive))
        .route("/sse", get(routes::sse::stream))
        .route("/mcp", post(routes::mcp::rpc))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::auth_middleware));

    let public = Router::new()
        .route("/health", get(routes::health::liveness))
        .route("/health/ready", get(routes::health::readiness));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}
