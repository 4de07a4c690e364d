//! Evidence index builder and subtask summary persistence.
//!
//! Grounded on `original_source/scc-bd/L6_agent_layer/orchestrators/
//! subtask_summary.py`: summaries live at
//! `<parent>/evidence/subtask_summaries/<child>.json`, capped fields
//! enforced by the domain model before this adapter ever sees them.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::{HubError, HubResult};
use crate::domain::models::{EvidenceIndex, EvidencePathEntry, SubtaskSummary, KNOWN_EVIDENCE_PATHS};
use crate::domain::ports::EvidenceStorePort;

use super::{task_evidence_dir, write_atomic};

#[derive(Clone)]
pub struct FsEvidenceStore {
    root: PathBuf,
}

impl FsEvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn summary_path(&self, parent_task_id: Uuid, child_task_id: Uuid) -> PathBuf {
        task_evidence_dir(&self.root, parent_task_id)
            .join("evidence")
            .join("subtask_summaries")
            .join(format!("{child_task_id}.json"))
    }
}

#[async_trait]
impl EvidenceStorePort for FsEvidenceStore {
    async fn build_index(&self, task_id: Uuid) -> HubResult<EvidenceIndex> {
        let dir = task_evidence_dir(&self.root, task_id);
        let mut entries = Vec::with_capacity(KNOWN_EVIDENCE_PATHS.len());

        for known in KNOWN_EVIDENCE_PATHS {
            let full_path = dir.join(known);
            let metadata = tokio::fs::metadata(&full_path).await.ok();
            entries.push(EvidencePathEntry {
                path: (*known).to_string(),
                exists: metadata.is_some(),
                size_bytes: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
                mtime_utc: metadata
                    .as_ref()
                    .and_then(|m| m.modified().ok())
                    .map(chrono::DateTime::<Utc>::from),
            });
        }

        Ok(EvidenceIndex {
            task_id,
            built_utc: Utc::now(),
            entries,
        })
    }

    async fn write_subtask_summary(&self, summary: &SubtaskSummary) -> HubResult<()> {
        let path = self.summary_path(summary.parent_task_id, summary.child_task_id);
        let bytes = serde_json::to_vec_pretty(summary)?;
        write_atomic(&path, &bytes)
            .await
            .map_err(|e| HubError::Internal(e.to_string()))
    }

    async fn read_subtask_summary(
        &self,
        parent_task_id: Uuid,
        child_task_id: Uuid,
    ) -> HubResult<Option<SubtaskSummary>> {
        let path = self.summary_path(parent_task_id, child_task_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HubError::Internal(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary(parent: Uuid, child: Uuid) -> SubtaskSummary {
        SubtaskSummary {
            parent_task_id: parent,
            child_task_id: child,
            recorded_utc: Utc::now(),
            status: "done".to_string(),
            verdict: Some("PASS".to_string()),
            run_id: None,
            exit_code: Some(0),
            report_md: None,
            evidence_dir: None,
            submit_block: None,
            child_recent_events_tail: vec![],
        }
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsEvidenceStore::new(dir.path());
        let parent = Uuid::now_v7();
        let child = Uuid::now_v7();

        store.write_subtask_summary(&sample_summary(parent, child)).await.unwrap();

        let read = store.read_subtask_summary(parent, child).await.unwrap().unwrap();
        assert_eq!(read.status, "done");
    }

    #[tokio::test]
    async fn read_missing_summary_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsEvidenceStore::new(dir.path());
        let result = store.read_subtask_summary(Uuid::now_v7(), Uuid::now_v7()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn build_index_reports_missing_paths_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsEvidenceStore::new(dir.path());
        let task_id = Uuid::now_v7();

        let index = store.build_index(task_id).await.unwrap();
        assert_eq!(index.entries.len(), KNOWN_EVIDENCE_PATHS.len());
        assert!(index.entries.iter().all(|e| !e.exists));
    }
}
