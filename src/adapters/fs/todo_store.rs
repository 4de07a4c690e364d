//! Per-task todo state persistence.
//!
//! Writes go through `write_atomic` (tmp+rename) so a reader never
//! observes a partially written `todo_state.json`, per the invariant
//! documented on `domain::models::todo::TodoState`.

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::{HubError, HubResult};
use crate::domain::models::TodoState;
use crate::domain::ports::TodoStorePort;

use super::{task_evidence_dir, write_atomic};

#[derive(Clone)]
pub struct FsTodoStore {
    root: PathBuf,
}

impl FsTodoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn state_path(&self, task_id: Uuid) -> PathBuf {
        task_evidence_dir(&self.root, task_id).join("todo_state.json")
    }
}

#[async_trait]
impl TodoStorePort for FsTodoStore {
    async fn read(&self, task_id: Uuid) -> HubResult<TodoState> {
        let path = self.state_path(task_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TodoState::new(Vec::new()),
            Err(e) => Err(HubError::Internal(e.to_string())),
        }
    }

    async fn write(&self, task_id: Uuid, state: &TodoState) -> HubResult<()> {
        let path = self.state_path(task_id);
        let bytes = serde_json::to_vec_pretty(state)?;
        write_atomic(&path, &bytes)
            .await
            .map_err(|e| HubError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{TodoItem, TodoStatus};

    #[tokio::test]
    async fn read_of_unwritten_task_returns_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTodoStore::new(dir.path());
        let state = store.read(Uuid::now_v7()).await.unwrap();
        assert!(state.items.is_empty());
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTodoStore::new(dir.path());
        let task_id = Uuid::now_v7();

        let state = TodoState::new(vec![TodoItem {
            content: "explore".to_string(),
            status: TodoStatus::InProgress,
            active_form: "exploring".to_string(),
        }])
        .unwrap();
        store.write(task_id, &state).await.unwrap();

        let read_back = store.read(task_id).await.unwrap();
        assert_eq!(read_back.items.len(), 1);
        assert_eq!(read_back.items[0].content, "explore");
    }
}
