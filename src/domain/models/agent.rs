//! Agent domain model.
//!
//! Agents are registered workers (LLM executor adapters, human-triggered
//! jobs, internal services) addressed by `agent_id` and a stable numeric
//! code. Builder style follows the teacher's `with_*` idiom from
//! `domain/models/agent.rs`'s `AgentTemplate`, generalized to this spec's
//! flatter `Agent` record.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// Operational status of a registered agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Available,
    Busy,
    Offline,
}

impl AgentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy => "busy",
            Self::Offline => "offline",
        }
    }
}

/// Lower and upper bound (inclusive) of the numeric-code address space.
/// SPEC_FULL.md §9 keeps this at 100 per the spec's explicit invariant,
/// flagged as an Open Question rather than re-derived.
pub const NUMERIC_CODE_MIN: u16 = 1;
pub const NUMERIC_CODE_MAX: u16 = 100;

/// A registered agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: String,
    pub numeric_code: u16,
    pub owner_role: Role,
    pub capabilities: HashSet<String>,
    pub allowed_tools: Vec<String>,
    pub capacity: u32,
    pub completion_limit_per_minute: u32,
    pub send_enabled: bool,
    pub status: AgentStatus,
    pub registered_utc: DateTime<Utc>,
    pub last_heartbeat_utc: DateTime<Utc>,
}

impl Agent {
    pub fn new(agent_id: impl Into<String>, numeric_code: u16, owner_role: Role, capacity: u32) -> Self {
        let now = Utc::now();
        Self {
            agent_id: agent_id.into(),
            numeric_code,
            owner_role,
            capabilities: HashSet::new(),
            allowed_tools: Vec::new(),
            capacity,
            completion_limit_per_minute: 60,
            send_enabled: true,
            status: AgentStatus::Available,
            registered_utc: now,
            last_heartbeat_utc: now,
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = String>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn with_allowed_tool(mut self, tool: impl Into<String>) -> Self {
        self.allowed_tools.push(tool.into());
        self
    }

    pub fn with_completion_limit(mut self, limit: u32) -> Self {
        self.completion_limit_per_minute = limit;
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Whether this agent is eligible to be dispatched a task requiring
    /// `required_capability` (`None` means any agent qualifies).
    pub fn satisfies_capability(&self, required_capability: Option<&str>) -> bool {
        match required_capability {
            None => true,
            Some(cap) => self.has_capability(cap),
        }
    }

    pub fn touch_heartbeat(&mut self) {
        self.last_heartbeat_utc = Utc::now();
    }

    /// Two specs are "identical" for `register`'s idempotence rule
    /// (SPEC_FULL.md §4.5) when id, capabilities and capacity match.
    pub fn same_spec(&self, other: &Agent) -> bool {
        self.agent_id == other.agent_id
            && self.capabilities == other.capabilities
            && self.capacity == other.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_capabilities() {
        let a = Agent::new("A1", 1, Role::Worker, 4)
            .with_capability("cap1")
            .with_capability("cap2");
        assert!(a.has_capability("cap1"));
        assert!(a.has_capability("cap2"));
        assert!(!a.has_capability("cap3"));
    }

    #[test]
    fn no_required_capability_is_always_satisfied() {
        let a = Agent::new("A1", 1, Role::Worker, 4);
        assert!(a.satisfies_capability(None));
    }

    #[test]
    fn same_spec_ignores_status_and_heartbeat() {
        let a = Agent::new("A1", 1, Role::Worker, 4).with_capability("cap1");
        let mut b = a.clone();
        b.status = AgentStatus::Busy;
        b.numeric_code = 2; // numeric code is registry-assigned, not part of spec identity
        assert!(a.same_spec(&b));
    }

    #[test]
    fn differing_capacity_is_not_same_spec() {
        let a = Agent::new("A1", 1, Role::Worker, 4);
        let b = Agent::new("A1", 1, Role::Worker, 8);
        assert!(!a.same_spec(&b));
    }
}
