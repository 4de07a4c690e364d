//! Append-only JSONL event log, one file per task.

use std::io::SeekFrom;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use uuid::Uuid;

use crate::domain::errors::{HubError, HubResult};
use crate::domain::models::Event;
use crate::domain::ports::EventLogPort;

use super::task_evidence_dir;

#[derive(Clone)]
pub struct FsEventLog {
    root: PathBuf,
}

impl FsEventLog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn log_path(&self, task_id: Uuid) -> PathBuf {
        task_evidence_dir(&self.root, task_id).join("events.jsonl")
    }
}

#[async_trait]
impl EventLogPort for FsEventLog {
    async fn emit(&self, task_id: Uuid, event: &Event) -> HubResult<()> {
        let path = self.log_path(task_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| HubError::Internal(e.to_string()))?;
        }

        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| HubError::Internal(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| HubError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn tail(&self, task_id: Uuid, cursor: u64, limit: usize) -> HubResult<(Vec<Event>, u64)> {
        let path = self.log_path(task_id);
        let mut file = match tokio::fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), cursor)),
            Err(e) => return Err(HubError::Internal(e.to_string())),
        };

        file.seek(SeekFrom::Start(cursor))
            .await
            .map_err(|e| HubError::Internal(e.to_string()))?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)
            .await
            .map_err(|e| HubError::Internal(e.to_string()))?;

        let mut events = Vec::new();
        let mut consumed_bytes = 0u64;
        for line in buf.lines() {
            if events.len() >= limit {
                break;
            }
            consumed_bytes += line.len() as u64 + 1;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(line)?);
        }

        Ok((events, cursor + consumed_bytes))
    }
}
