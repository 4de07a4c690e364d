//! `scc-hub submit-parent --id <task_code> --description <text>`.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::output::CommandOutput;
use crate::domain::models::{Role, Task, TaskStatus};
use crate::domain::ports::TaskRepository;
use crate::infrastructure::Engine;

#[derive(Debug, Serialize)]
pub struct SubmitParentOutput {
    pub task_id: uuid::Uuid,
    pub task_code: String,
    pub status: String,
}

impl CommandOutput for SubmitParentOutput {
    fn to_human(&self) -> String {
        format!("created task {} ({}) status={}", self.task_id, self.task_code, self.status)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn handle(engine: &Engine, task_code: String, description: String) -> Result<SubmitParentOutput> {
    let mut task = Task::new(task_code.clone(), Role::Admin, serde_json::json!({ "description": description }));
    task.transition_to(TaskStatus::Ready).context("new parent task must transition to ready")?;
    engine.tasks.create(&task).await.context("failed to persist parent task")?;

    Ok(SubmitParentOutput { task_id: task.task_id, task_code, status: task.status.as_str().to_string() })
}
