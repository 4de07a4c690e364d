//! Maps `HubError` to the wire error body from spec.md §6:
//! `{success, reason_code, message, trace_id}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::HubError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub reason_code: String,
    pub message: String,
    pub trace_id: String,
}

/// Wraps a `HubError` with the `trace_id` of the request it failed
/// under, so the gateway's error body always carries one.
pub struct GatewayError {
    pub inner: HubError,
    pub trace_id: Uuid,
}

impl GatewayError {
    pub fn new(inner: HubError, trace_id: Uuid) -> Self {
        Self { inner, trace_id }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            success: false,
            reason_code: self.inner.reason_code().to_string(),
            message: self.inner.to_string(),
            trace_id: self.trace_id.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
