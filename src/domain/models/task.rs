//! Task domain model.
//!
//! A task is one node in the orchestrator's task graph: an opaque client
//! request plus the state-machine bookkeeping (status, lease, retries)
//! needed to dispatch it to exactly one agent at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;
use crate::domain::errors::HubError;

/// Status of a task in the orchestration lifecycle.
///
/// Transitions follow `valid_transitions()` below; any other transition is
/// rejected with `HubError::StateIllegal` and leaves the task in its prior
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Ready,
    Leased,
    InProgress,
    Done,
    Failed,
    Blocked,
    Dlq,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl TaskStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Leased => "leased",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Blocked => "blocked",
            Self::Dlq => "dlq",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "ready" => Some(Self::Ready),
            "leased" => Some(Self::Leased),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            "blocked" => Some(Self::Blocked),
            "dlq" => Some(Self::Dlq),
            _ => None,
        }
    }

    /// Whether a task in this state currently holds a lease (SPEC_FULL.md
    /// §3 Task invariant: `assigned_agent`/`lease_expiry` set iff leased or
    /// in_progress).
    pub const fn holds_lease(self) -> bool {
        matches!(self, Self::Leased | Self::InProgress)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Dlq)
    }

    /// Valid target states from this status (SPEC_FULL.md §4.3).
    ///
    /// `Blocked` is reachable from any state (explicit block) and every
    /// state can transition to itself's allowed targets only — `any →
    /// blocked` is handled specially in `transition_to` rather than
    /// duplicated into every arm here.
    pub fn valid_transitions(self) -> &'static [TaskStatus] {
        match self {
            Self::Pending => &[Self::Ready, Self::Blocked],
            Self::Ready => &[Self::Leased, Self::Blocked],
            Self::Leased => &[Self::InProgress, Self::Ready, Self::Blocked],
            Self::InProgress => &[Self::Done, Self::Failed, Self::Blocked],
            Self::Done => &[Self::Ready], // replay clones into a new ready task
            Self::Failed => &[Self::Ready, Self::Dlq],
            Self::Blocked => &[Self::Ready],
            Self::Dlq => &[Self::Ready], // replay_dlq
        }
    }

    pub fn can_transition_to(self, new_status: Self) -> bool {
        new_status == Self::Blocked || self.valid_transitions().contains(&new_status)
    }
}

/// PASS/FAIL/UNKNOWN verdict a worker (or gate) attaches on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
    Unknown,
}

impl Verdict {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// A task in the orchestrator's task graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    pub parent_task_id: Option<Uuid>,
    pub task_code: String,
    pub status: TaskStatus,
    pub verdict: Option<Verdict>,
    /// 0..3, 3 highest. Persisted priority; see `services::priority_scheduler`
    /// for the non-persisted "effective" priority used at dispatch time.
    pub priority: u8,
    pub owner_role: Role,
    pub required_capability: Option<String>,
    pub assigned_agent: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub lease_expiry: Option<DateTime<Utc>>,
    pub request: serde_json::Value,
    pub task_class_id: Option<String>,
    pub pins: Vec<String>,
    pub allowed_tests: Vec<String>,
    pub acceptance: serde_json::Value,
    pub stop_conditions: serde_json::Value,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub run_id: Option<Uuid>,
    pub exit_code: Option<i32>,
    pub report_path: Option<String>,
    pub evidence_dir: Option<String>,
}

impl Task {
    /// Create a new task in `pending`, owned by `owner_role`.
    pub fn new(task_code: impl Into<String>, owner_role: Role, request: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            task_id: Uuid::now_v7(),
            parent_task_id: None,
            task_code: task_code.into(),
            status: TaskStatus::Pending,
            verdict: None,
            priority: 1,
            owner_role,
            required_capability: None,
            assigned_agent: None,
            retry_count: 0,
            max_retries: 3,
            lease_expiry: None,
            request,
            task_class_id: None,
            pins: Vec::new(),
            allowed_tests: Vec::new(),
            acceptance: serde_json::Value::Null,
            stop_conditions: serde_json::Value::Null,
            created_utc: now,
            updated_utc: now,
            run_id: None,
            exit_code: None,
            report_path: None,
            evidence_dir: None,
        }
    }

    pub fn with_parent(mut self, parent_task_id: Uuid) -> Self {
        self.parent_task_id = Some(parent_task_id);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.min(3);
        self
    }

    pub fn with_required_capability(mut self, capability: impl Into<String>) -> Self {
        self.required_capability = Some(capability.into());
        self
    }

    pub fn with_task_class(mut self, task_class_id: impl Into<String>) -> Self {
        self.task_class_id = Some(task_class_id.into());
        self
    }

    /// Enforce the state machine; on success updates `updated_utc` and
    /// clears/sets lease fields consistently with the new state. On
    /// rejection the task is left untouched and `StateIllegal` is returned.
    pub fn transition_to(&mut self, new_status: TaskStatus) -> Result<(), HubError> {
        if !self.status.can_transition_to(new_status) {
            return Err(HubError::StateIllegal {
                from: self.status.as_str().to_string(),
                to: new_status.as_str().to_string(),
            });
        }
        self.status = new_status;
        self.updated_utc = Utc::now();
        if !new_status.holds_lease() {
            self.assigned_agent = None;
            self.lease_expiry = None;
        }
        Ok(())
    }

    /// Whether this task can be retried (failed with budget remaining).
    pub const fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Clone this task's request into a fresh `ready` task linked back to
    /// `self` as `parent_task_id` — used by both `done → replay` and
    /// `dlq → replay_dlq`.
    pub fn replay(&self) -> Self {
        let mut clone = Self::new(self.task_code.clone(), self.owner_role, self.request.clone());
        clone.parent_task_id = Some(self.task_id);
        clone.priority = self.priority;
        clone.required_capability = self.required_capability.clone();
        clone.task_class_id = self.task_class_id.clone();
        clone.pins = self.pins.clone();
        clone.allowed_tests = self.allowed_tests.clone();
        clone.acceptance = self.acceptance.clone();
        clone.stop_conditions = self.stop_conditions.clone();
        clone.status = TaskStatus::Ready;
        clone
    }
}
