//! `scc-hub replay-bundle --bundle <path> [--dispatch]`.
//!
//! The bundle file is a JSON array of DLQ task IDs. Each is replayed via
//! `LeaseManager::replay_dlq`; with `--dispatch`, a `dispatch_requested`
//! event is also appended to the replayed task so a scheduler sweep
//! picks it up on the next tick.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::cli::output::CommandOutput;
use crate::domain::models::{Event, EventKind};
use crate::domain::ports::EventLogPort;
use crate::infrastructure::Engine;

#[derive(Debug, Serialize)]
pub struct ReplayBundleOutput {
    pub replayed: Vec<Uuid>,
    pub failed: Vec<Uuid>,
    pub dispatched: bool,
}

impl CommandOutput for ReplayBundleOutput {
    fn to_human(&self) -> String {
        format!(
            "replayed {} task(s), {} failure(s), dispatched={}",
            self.replayed.len(),
            self.failed.len(),
            self.dispatched
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn handle(engine: &Engine, bundle: &Path, dispatch: bool) -> Result<ReplayBundleOutput> {
    let raw = tokio::fs::read_to_string(bundle).await.context("failed to read bundle file")?;
    let task_ids: Vec<Uuid> = serde_json::from_str(&raw).context("bundle must be a JSON array of task IDs")?;

    let mut replayed = Vec::new();
    let mut failed = Vec::new();
    for task_id in task_ids {
        match engine.lease_manager.replay_dlq(task_id).await {
            Ok(new_task) => {
                if dispatch {
                    let event = Event::new(new_task.task_id, EventKind::Event, "dispatch_requested", serde_json::json!({}));
                    let _ = engine.event_log.emit(new_task.task_id, &event).await;
                }
                replayed.push(new_task.task_id);
            }
            Err(_) => failed.push(task_id),
        }
    }

    Ok(ReplayBundleOutput { replayed, failed, dispatched: dispatch })
}
