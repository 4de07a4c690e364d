//! Unified action/event/span record appended to a task's event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminates the three shapes of record the event log carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Action,
    Event,
    Span,
}

/// One append-only record in `<task>/events.jsonl`.
///
/// Never mutated after being written; `cursor` in `EventLog::tail` is a
/// byte offset into the file, not an index into this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub ts_utc: DateTime<Utc>,
    pub kind: EventKind,
    pub name: String,
    pub data: serde_json::Value,
    pub task_id: Uuid,
    pub run_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub trace_id: Uuid,
    pub span_id: Option<Uuid>,
    pub parent_span_id: Option<Uuid>,
}

impl Event {
    pub fn new(task_id: Uuid, kind: EventKind, name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            ts_utc: Utc::now(),
            kind,
            name: name.into(),
            data,
            task_id,
            run_id: None,
            parent_id: None,
            trace_id: Uuid::now_v7(),
            span_id: None,
            parent_span_id: None,
        }
    }

    pub fn with_trace(mut self, trace_id: Uuid) -> Self {
        self.trace_id = trace_id;
        self
    }

    pub fn with_run(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }
}
