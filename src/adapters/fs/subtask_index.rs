//! Per-parent subtask child index (`<parent>/subtasks.json`).
//!
//! Grounded on `original_source/scc-bd/L6_agent_layer/orchestrators/
//! subtask_index.py`: append-dedup-by-child, full list read back for
//! `SubtaskPool::list_subtasks`'s index-first path.

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::{HubError, HubResult};
use crate::domain::models::SubtaskIndexEntry;
use crate::domain::ports::SubtaskIndexPort;

use super::{task_evidence_dir, write_atomic};

#[derive(Clone)]
pub struct FsSubtaskIndex {
    root: PathBuf,
}

impl FsSubtaskIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn index_path(&self, parent_task_id: Uuid) -> PathBuf {
        task_evidence_dir(&self.root, parent_task_id).join("subtasks.json")
    }

    async fn read_all(&self, parent_task_id: Uuid) -> HubResult<Vec<SubtaskIndexEntry>> {
        match tokio::fs::read(self.index_path(parent_task_id)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(HubError::Internal(e.to_string())),
        }
    }
}

#[async_trait]
impl SubtaskIndexPort for FsSubtaskIndex {
    async fn append(&self, parent_task_id: Uuid, entry: SubtaskIndexEntry) -> HubResult<()> {
        let mut entries = self.read_all(parent_task_id).await?;
        if !entries.iter().any(|e| e.child_task_id == entry.child_task_id) {
            entries.push(entry);
        }
        let bytes = serde_json::to_vec_pretty(&entries)?;
        write_atomic(&self.index_path(parent_task_id), &bytes)
            .await
            .map_err(|e| HubError::Internal(e.to_string()))
    }

    async fn list(&self, parent_task_id: Uuid) -> HubResult<Vec<SubtaskIndexEntry>> {
        self.read_all(parent_task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(child: Uuid) -> SubtaskIndexEntry {
        SubtaskIndexEntry {
            child_task_id: child,
            task_type: "explore".to_string(),
            created_utc: Utc::now(),
        }
    }

    #[tokio::test]
    async fn append_then_list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let index = FsSubtaskIndex::new(dir.path());
        let parent = Uuid::now_v7();
        let child = Uuid::now_v7();

        index.append(parent, entry(child)).await.unwrap();

        let listed = index.list(parent).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].child_task_id, child);
    }

    #[tokio::test]
    async fn append_dedups_by_child_task_id() {
        let dir = tempfile::tempdir().unwrap();
        let index = FsSubtaskIndex::new(dir.path());
        let parent = Uuid::now_v7();
        let child = Uuid::now_v7();

        index.append(parent, entry(child)).await.unwrap();
        index.append(parent, entry(child)).await.unwrap();

        let listed = index.list(parent).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn list_of_unknown_parent_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = FsSubtaskIndex::new(dir.path());
        let listed = index.list(Uuid::now_v7()).await.unwrap();
        assert!(listed.is_empty());
    }
}
