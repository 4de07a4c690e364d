//! Consolidated domain error type.
//!
//! The teacher crate carried two competing error modules (`domain::error`
//! and `domain::errors`); this crate keeps exactly one, with a stable
//! `reason_code` attached to every variant per the error taxonomy.

use thiserror::Error;
use uuid::Uuid;

/// All domain-level failures, each carrying a stable wire `reason_code`.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: role lacks permission for this route")]
    Forbidden,

    #[error("schema invalid: {0}")]
    SchemaInvalid(String),

    #[error("ADR required for protected path changes")]
    AdrRequired,

    #[error("ADR malformed: missing section(s) {0}")]
    AdrMalformed(String),

    #[error("signature mismatch for file {0}")]
    SignatureMismatch(String),

    #[error("semantic context invalid: {0}")]
    SemctxInvalid(String),

    #[error("import scan violation: {0}")]
    ImportScanViolation(String),

    #[error("ATA payload invalid: {0}")]
    AtaPayloadInvalid(String),

    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("agent offline: {0}")]
    AgentOffline(String),

    #[error("agent numeric code space exhausted")]
    AgentCodeExhausted,

    #[error("agent numeric code mismatch for {0}")]
    AgentCodeMismatch(String),

    #[error("agent at capacity: {0}")]
    AgentQuotaExceeded(String),

    #[error("agent rate limited: {0}")]
    AgentRateLimited(String),

    #[error("no eligible agent for required capability")]
    NoEligibleAgent,

    #[error("lease invalid for task {0}")]
    LeaseInvalid(Uuid),

    #[error("illegal state transition from {from} to {to}")]
    StateIllegal { from: String, to: String },

    #[error("rate limited")]
    RateLimited,

    #[error("SSE connection limit reached")]
    SseConnLimit,

    #[error("external call timed out")]
    ExternalTimeout,

    #[error("executor unavailable: {0}")]
    ExecutorUnavailable(String),

    #[error("task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("todo state invalid: {0}")]
    TodoInvalid(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// The stable wire-level reason code for this error.
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::SchemaInvalid(_) => "SCHEMA_INVALID",
            Self::AdrRequired => "ADR_REQUIRED",
            Self::AdrMalformed(_) => "ADR_MALFORMED",
            Self::SignatureMismatch(_) => "SIGNATURE_MISMATCH",
            Self::SemctxInvalid(_) => "SEMCTX_INVALID",
            Self::ImportScanViolation(_) => "IMPORT_SCAN_VIOLATION",
            Self::AtaPayloadInvalid(_) => "ATA_PAYLOAD_INVALID",
            Self::AgentNotFound(_) => "AGENT_NOT_FOUND",
            Self::AgentOffline(_) => "AGENT_OFFLINE",
            Self::AgentCodeExhausted => "AGENT_CODE_EXHAUSTED",
            Self::AgentCodeMismatch(_) => "AGENT_CODE_MISMATCH",
            Self::AgentQuotaExceeded(_) => "AGENT_QUOTA_EXCEEDED",
            Self::AgentRateLimited(_) => "AGENT_RATE_LIMITED",
            Self::NoEligibleAgent => "NO_ELIGIBLE_AGENT",
            Self::LeaseInvalid(_) => "LEASE_INVALID",
            Self::StateIllegal { .. } => "STATE_ILLEGAL",
            Self::RateLimited => "RATE_LIMITED",
            Self::SseConnLimit => "SSE_CONN_LIMIT",
            Self::ExternalTimeout => "EXTERNAL_TIMEOUT",
            Self::ExecutorUnavailable(_) => "EXECUTOR_UNAVAILABLE",
            Self::TaskNotFound(_) => "TASK_NOT_FOUND",
            Self::TodoInvalid(_) => "TODO_INVALID",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the underlying condition may clear on retry without
    /// caller intervention (used by `LeaseManager`'s retry/DLQ decision).
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ExternalTimeout | Self::ExecutorUnavailable(_) | Self::AgentRateLimited(_)
        )
    }

    /// The HTTP status this error maps to at the Gateway boundary.
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::AgentNotFound(_) | Self::TaskNotFound(_) => 404,
            Self::StateIllegal { .. } => 409,
            Self::RateLimited | Self::SseConnLimit | Self::AgentRateLimited(_) => 429,
            Self::Internal(_) => 500,
            _ => 400,
        }
    }
}

impl From<sqlx::Error> for HubError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        Self::SchemaInvalid(err.to_string())
    }
}

impl From<std::io::Error> for HubError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

pub type HubResult<T> = Result<T, HubError>;
