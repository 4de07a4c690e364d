//! Domain models.
//!
//! Pure domain entities with business logic and validation rules. These
//! models are framework-agnostic and contain no infrastructure concerns.

pub mod a2a;
pub mod agent;
pub mod config;
pub mod event;
pub mod evidence;
pub mod lease;
pub mod role;
pub mod task;
pub mod todo;

pub use a2a::{A2AMessage, DeliveryState, MessageKind, MessagePriority};
pub use agent::{Agent, AgentStatus, NUMERIC_CODE_MAX, NUMERIC_CODE_MIN};
pub use config::{
    AuthMode, Config, DatabaseConfig, GovernorConfig, LoggingConfig, PolicyGateConfig,
    RateLimitConfig, RetryConfig, SchedulerConfig, ServerConfig,
};
pub use event::{Event, EventKind};
pub use evidence::{
    EvidenceIndex, EvidencePathEntry, SubtaskIndexEntry, SubtaskSummary, EVENT_TAIL_MAX_LINES,
    KNOWN_EVIDENCE_PATHS, MAX_LISTED_FILES, SUBMIT_BLOCK_MAX_CHARS,
};
pub use lease::Lease;
pub use role::{Permission, Role};
pub use task::{Task, TaskStatus, Verdict};
pub use todo::{TodoItem, TodoState, TodoStatus, MAX_TODO_ITEMS};
