//! Agent-to-Agent (A2A) message envelope.
//!
//! Grounded on the teacher's `domain/models/a2a.rs` builder/factory idiom,
//! redesigned around this spec's `kind`-tagged envelope and per-kind
//! fail-closed required-field validation (SPEC_FULL.md §3 Message).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of an A2A envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Request,
    Response,
    Bootstrap,
    Ack,
    Message,
}

impl MessageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Bootstrap => "bootstrap",
            Self::Ack => "ack",
            Self::Message => "message",
        }
    }
}

/// Priority of an A2A message (distinct from task priority).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessagePriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for MessagePriority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Delivery state of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Queued,
    Delivered,
    Read,
    Failed,
}

/// An A2A envelope between two registered agents.
///
/// Envelopes that fail `validate_payload` are never constructed into a
/// stored `A2AMessage` — the bus rejects them before persistence
/// (SPEC_FULL.md §3: "Messages with missing required fields → reject,
/// never stored").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct A2AMessage {
    pub msg_id: Uuid,
    pub task_code: String,
    pub from_agent: String,
    pub to_agent: String,
    pub kind: MessageKind,
    pub priority: MessagePriority,
    pub requires_response: bool,
    pub payload: serde_json::Value,
    pub created_utc: DateTime<Utc>,
    pub delivery_state: DeliveryState,
}

impl A2AMessage {
    pub fn new(
        task_code: impl Into<String>,
        from_agent: impl Into<String>,
        to_agent: impl Into<String>,
        kind: MessageKind,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            msg_id: Uuid::now_v7(),
            task_code: task_code.into(),
            from_agent: from_agent.into(),
            to_agent: to_agent.into(),
            kind,
            priority: MessagePriority::default(),
            requires_response: false,
            payload,
            created_utc: Utc::now(),
            delivery_state: DeliveryState::Queued,
        }
    }

    pub fn with_priority(mut self, priority: MessagePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn requiring_response(mut self) -> Self {
        self.requires_response = true;
        self
    }

    /// Fail-closed per-kind required-field validation (SPEC_FULL.md §3).
    /// Returns the missing dotted field path on the first failure found.
    pub fn validate_payload(&self) -> Result<(), String> {
        match self.kind {
            MessageKind::Request => {
                let task = self.payload.get("task").ok_or("task")?;
                for field in ["task_code", "area", "goal", "success_criteria", "tasks"] {
                    if task.get(field).is_none() {
                        return Err(format!("task.{field}"));
                    }
                }
                if let Some(tasks) = task.get("tasks").and_then(|v| v.as_array()) {
                    if tasks.len() > 3 {
                        return Err("task.tasks (max 3)".to_string());
                    }
                }
                let constraints = self.payload.get("constraints").ok_or("constraints")?;
                for field in ["law_ref", "allowed_paths"] {
                    if constraints.get(field).is_none() {
                        return Err(format!("constraints.{field}"));
                    }
                }
                Ok(())
            }
            MessageKind::Response => {
                let triplet = self.payload.get("audit_triplet").ok_or("audit_triplet")?;
                for field in ["report_path", "selftest_log_path", "artifacts_dir"] {
                    if triplet.get(field).is_none() {
                        return Err(format!("audit_triplet.{field}"));
                    }
                }
                match self.payload.get("status").and_then(|v| v.as_str()) {
                    Some("PASS" | "FAIL" | "BLOCKED") => Ok(()),
                    _ => Err("status".to_string()),
                }
            }
            MessageKind::Bootstrap | MessageKind::Ack => {
                for field in ["from", "to", "timestamp"] {
                    if self.payload.get(field).is_none() {
                        return Err(field.to_string());
                    }
                }
                Ok(())
            }
            MessageKind::Message => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_requires_task_and_constraints() {
        let msg = A2AMessage::new("T1", "A1", "A2", MessageKind::Request, json!({}));
        assert_eq!(msg.validate_payload(), Err("task".to_string()));
    }

    #[test]
    fn request_rejects_more_than_three_tasks() {
        let payload = json!({
            "task": {"task_code": "T1", "area": "x", "goal": "g", "success_criteria": "c", "tasks": [1,2,3,4]},
            "constraints": {"law_ref": "L1", "allowed_paths": ["a"]},
        });
        let msg = A2AMessage::new("T1", "A1", "A2", MessageKind::Request, payload);
        assert!(msg.validate_payload().unwrap_err().contains("max 3"));
    }

    #[test]
    fn valid_request_passes() {
        let payload = json!({
            "task": {"task_code": "T1", "area": "x", "goal": "g", "success_criteria": "c", "tasks": [1,2]},
            "constraints": {"law_ref": "L1", "allowed_paths": ["a"]},
        });
        let msg = A2AMessage::new("T1", "A1", "A2", MessageKind::Request, payload);
        assert!(msg.validate_payload().is_ok());
    }

    #[test]
    fn response_requires_audit_triplet_and_status() {
        let msg = A2AMessage::new("T1", "A1", "A2", MessageKind::Response, json!({}));
        assert_eq!(msg.validate_payload(), Err("audit_triplet".to_string()));

        let payload = json!({
            "audit_triplet": {"report_path": "p", "selftest_log_path": "p", "artifacts_dir": "p"},
        });
        let msg = A2AMessage::new("T1", "A1", "A2", MessageKind::Response, payload);
        assert_eq!(msg.validate_payload(), Err("status".to_string()));
    }

    #[test]
    fn valid_response_passes() {
        let payload = json!({
            "audit_triplet": {"report_path": "p", "selftest_log_path": "p", "artifacts_dir": "p"},
            "status": "PASS",
        });
        let msg = A2AMessage::new("T1", "A1", "A2", MessageKind::Response, payload);
        assert!(msg.validate_payload().is_ok());
    }

    #[test]
    fn bootstrap_requires_handshake_fields() {
        let msg = A2AMessage::new("T1", "A1", "A2", MessageKind::Bootstrap, json!({"from": "A1"}));
        assert!(msg.validate_payload().is_err());
    }

    #[test]
    fn plain_message_has_no_required_fields() {
        let msg = A2AMessage::new("T1", "A1", "A2", MessageKind::Message, json!({}));
        assert!(msg.validate_payload().is_ok());
    }
}
