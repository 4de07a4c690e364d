//! Bearer-token auth middleware.
//!
//! Grounded on the `subtle`-based constant-time comparison idiom in
//! `SaintPepsi-spiral-core/src/auth.rs::auth_middleware`, adapted to
//! this hub's RBAC: the bearer token is `<role>:<shared_secret>` (see
//! DESIGN.md for why — spec.md's scenarios exercise fixed roles
//! directly, and the hub has no separate user/session store to resolve
//! a role from an opaque token against).

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::domain::errors::HubError;

use crate::domain::models::{AuthMode, Role};
use crate::gateway::error::ErrorBody;
use crate::gateway::state::AppState;

/// The caller's resolved role and raw token, threaded through request
/// extensions for handlers and the rate limiter to key off of.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub role: Role,
    pub token: String,
    pub trace_id: Uuid,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let trace_id = Uuid::now_v7();

    if state.engine.config.server.auth_mode == AuthMode::None {
        request.extensions_mut().insert(AuthContext {
            role: Role::Admin,
            token: "none".to_string(),
            trace_id,
        });
        return Ok(next.run(request).await);
    }

    let Some(raw) = headers.get("authorization").and_then(|v| v.to_str().ok()) else {
        return Err(unauthorized(trace_id));
    };
    let Some(presented) = raw.strip_prefix("Bearer ") else {
        return Err(unauthorized(trace_id));
    };
    let Some((role_str, secret)) = presented.split_once(':') else {
        return Err(unauthorized(trace_id));
    };

    let Some(expected) = &state.engine.config.server.bearer_token else {
        return Err(unauthorized(trace_id));
    };
    if secret.as_bytes().ct_eq(expected.as_bytes()).unwrap_u8() != 1 {
        return Err(unauthorized(trace_id));
    }

    let route = request.uri().path().to_string();
    if let Err(e) = state.engine.policy_gate.check_rate_limit(&route, presented) {
        return Err(rate_limited(trace_id, &e));
    }

    request.extensions_mut().insert(AuthContext {
        role: Role::from_str(role_str),
        token: presented.to_string(),
        trace_id,
    });
    Ok(next.run(request).await)
}

fn unauthorized(trace_id: Uuid) -> Response {
    let body = ErrorBody {
        success: false,
        reason_code: "UNAUTHORIZED".to_string(),
        message: "missing or invalid bearer token".to_string(),
        trace_id: trace_id.to_string(),
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

fn rate_limited(trace_id: Uuid, err: &HubError) -> Response {
    let body = ErrorBody {
        success: false,
        reason_code: err.reason_code().to_string(),
        message: err.to_string(),
        trace_id: trace_id.to_string(),
    };
    (StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::TOO_MANY_REQUESTS), Json(body)).into_response()
}
