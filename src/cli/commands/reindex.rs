//! `scc-hub reindex-task-evidence [--task-id <id> | --limit <n>]`.

use anyhow::{Context, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::cli::output::CommandOutput;
use crate::domain::ports::{EvidenceStorePort, TaskFilter, TaskRepository};
use crate::infrastructure::Engine;

#[derive(Debug, Serialize)]
pub struct ReindexOutput {
    pub reindexed: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}

impl CommandOutput for ReindexOutput {
    fn to_human(&self) -> String {
        format!("reindexed {} task(s), {} failure(s)", self.reindexed.len(), self.failed.len())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn handle(engine: &Engine, task_id: Option<Uuid>, limit: usize) -> Result<ReindexOutput> {
    let targets = if let Some(id) = task_id {
        vec![id]
    } else {
        engine
            .tasks
            .list(TaskFilter::default())
            .await
            .context("failed to list tasks")?
            .into_iter()
            .take(limit)
            .map(|task| task.task_id)
            .collect()
    };

    let mut reindexed = Vec::new();
    let mut failed = Vec::new();
    for id in targets {
        match engine.evidence_store.build_index(id).await {
            Ok(_) => reindexed.push(id),
            Err(_) => failed.push(id),
        }
    }

    Ok(ReindexOutput { reindexed, failed })
}
