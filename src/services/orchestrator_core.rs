//! OrchestratorCore (C10): profile-gated phase state machine, TodoState
//! persistence, and the plan/execution-plan artifacts.
//!
//! Grounded on spec.md §4.10 verbatim; TodoState invariants delegate to
//! `domain::models::todo::TodoState::validate` (itself grounded on
//! `original_source/.../todo_state.py`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::HubResult;
use crate::domain::models::TodoState;
use crate::domain::ports::TodoStorePort;

/// Policy bundle selected at task creation, not a model choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Plan,
    Chat,
    FullAgent,
}

impl Profile {
    pub const fn model_calls_allowed(self) -> bool {
        matches!(self, Self::FullAgent)
    }

    pub const fn shell_allowed(self) -> bool {
        matches!(self, Self::FullAgent)
    }

    pub const fn max_steps(self) -> u32 {
        match self {
            Self::Plan => 8,
            Self::Chat => 12,
            Self::FullAgent => 64,
        }
    }

    /// Whether the phase loop terminates at `plan` with `verdict=UNKNOWN`
    /// rather than proceeding to `execute`.
    pub const fn stops_at_plan(self) -> bool {
        matches!(self, Self::Plan | Self::Chat)
    }
}

/// Phase of the orchestrator's state machine for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorPhase {
    Init,
    Explore,
    Plan,
    Execute,
    Verify,
    Done,
}

impl OrchestratorPhase {
    const ORDER: [Self; 6] = [
        Self::Init,
        Self::Explore,
        Self::Plan,
        Self::Execute,
        Self::Verify,
        Self::Done,
    ];

    /// The next phase in sequence, honoring `profile`'s early-stop rule.
    pub fn next(self, profile: Profile) -> Option<Self> {
        if self == Self::Plan && profile.stops_at_plan() {
            return None;
        }
        let idx = Self::ORDER.iter().position(|p| *p == self)?;
        Self::ORDER.get(idx + 1).copied()
    }
}

/// A step in the advisory `tool_execution_plan.json` (spec.md §4.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedStep {
    pub idx: u32,
    pub kind: String,
    pub cmd: String,
    pub risk: String,
    pub concurrency_safe: bool,
}

/// Consecutive `concurrency_safe` steps form a group; any unsafe step
/// breaks into its own sequential group of one. Execution itself remains
/// sequential regardless of grouping (spec.md §4.10).
pub fn group_execution_plan(steps: &[PlannedStep]) -> Vec<Vec<u32>> {
    let mut groups: Vec<Vec<u32>> = Vec::new();
    for step in steps {
        if step.concurrency_safe {
            if let Some(last) = groups.last_mut() {
                if last
                    .last()
                    .and_then(|idx| steps.iter().find(|s| s.idx == *idx))
                    .is_some_and(|prev| prev.concurrency_safe)
                {
                    last.push(step.idx);
                    continue;
                }
            }
            groups.push(vec![step.idx]);
        } else {
            groups.push(vec![step.idx]);
        }
    }
    groups
}

/// A node/edge graph written to `<evidence>/orchestrator_plan_graph.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlanGraph {
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String)>,
    pub meta: serde_json::Value,
}

pub struct OrchestratorCore {
    todo_store: Arc<dyn TodoStorePort>,
}

impl OrchestratorCore {
    pub fn new(todo_store: Arc<dyn TodoStorePort>) -> Self {
        Self { todo_store }
    }

    pub async fn read_todo_state(&self, task_id: Uuid) -> HubResult<TodoState> {
        self.todo_store.read(task_id).await
    }

    /// Validates before persisting; violations surface `TODO_INVALID`
    /// without writing a partial file.
    pub async fn write_todo_state(&self, task_id: Uuid, state: TodoState) -> HubResult<()> {
        state.validate()?;
        self.todo_store.write(task_id, &state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_profile_stops_before_execute() {
        assert_eq!(OrchestratorPhase::Plan.next(Profile::Plan), None);
    }

    #[test]
    fn fullagent_profile_continues_through_execute() {
        assert_eq!(
            OrchestratorPhase::Plan.next(Profile::FullAgent),
            Some(OrchestratorPhase::Execute)
        );
    }

    #[test]
    fn full_sequence_reaches_done() {
        let mut phase = OrchestratorPhase::Init;
        let mut steps = 0;
        while let Some(next) = phase.next(Profile::FullAgent) {
            phase = next;
            steps += 1;
            assert!(steps < 10);
        }
        assert_eq!(phase, OrchestratorPhase::Done);
    }

    #[test]
    fn consecutive_safe_steps_group_together() {
        let steps = vec![
            PlannedStep { idx: 0, kind: "read".into(), cmd: "cat a".into(), risk: "low".into(), concurrency_safe: true },
            PlannedStep { idx: 1, kind: "read".into(), cmd: "cat b".into(), risk: "low".into(), concurrency_safe: true },
            PlannedStep { idx: 2, kind: "write".into(), cmd: "rm a".into(), risk: "high".into(), concurrency_safe: false },
        ];
        let groups = group_execution_plan(&steps);
        assert_eq!(groups, vec![vec![0, 1], vec![2]]);
    }
}
