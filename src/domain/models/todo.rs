//! Per-task todo state.
//!
//! Grounded verbatim on `examples/original_source/scc-bd/L6_agent_layer/
//! orchestrators/todo_state.py`: a bounded list of items with at most one
//! `in_progress`, persisted atomically (tmp+rename, see
//! `adapters::fs::todo_store`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::HubError;

pub const MAX_TODO_ITEMS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    pub content: String,
    pub status: TodoStatus,
    #[serde(rename = "activeForm")]
    pub active_form: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoState {
    pub updated_utc: DateTime<Utc>,
    pub items: Vec<TodoItem>,
}

impl TodoState {
    pub fn new(items: Vec<TodoItem>) -> Result<Self, HubError> {
        let state = Self {
            updated_utc: Utc::now(),
            items,
        };
        state.validate()?;
        Ok(state)
    }

    /// `validate_todos(items, max_items=20)` from `todo_state.py`: non-empty
    /// `content`/`activeForm`, at most one `in_progress`, bounded length.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.items.len() > MAX_TODO_ITEMS {
            return Err(HubError::TodoInvalid(format!(
                "too many items: {} > {MAX_TODO_ITEMS}",
                self.items.len()
            )));
        }
        let in_progress_count = self
            .items
            .iter()
            .filter(|i| i.status == TodoStatus::InProgress)
            .count();
        if in_progress_count > 1 {
            return Err(HubError::TodoInvalid(format!(
                "at most one item may be in_progress, found {in_progress_count}"
            )));
        }
        for item in &self.items {
            if item.content.trim().is_empty() {
                return Err(HubError::TodoInvalid("item content must be non-empty".to_string()));
            }
            if item.active_form.trim().is_empty() {
                return Err(HubError::TodoInvalid("item activeForm must be non-empty".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(content: &str, status: TodoStatus) -> TodoItem {
        TodoItem {
            content: content.to_string(),
            status,
            active_form: format!("doing {content}"),
        }
    }

    #[test]
    fn empty_state_is_valid() {
        assert!(TodoState::new(vec![]).is_ok());
    }

    #[test]
    fn twenty_first_item_is_invalid() {
        let items: Vec<_> = (0..21).map(|i| item(&format!("t{i}"), TodoStatus::Pending)).collect();
        let err = TodoState::new(items).unwrap_err();
        assert_eq!(err.reason_code(), "TODO_INVALID");
    }

    #[test]
    fn twenty_items_is_valid() {
        let items: Vec<_> = (0..20).map(|i| item(&format!("t{i}"), TodoStatus::Pending)).collect();
        assert!(TodoState::new(items).is_ok());
    }

    #[test]
    fn two_in_progress_is_invalid() {
        let items = vec![
            item("a", TodoStatus::InProgress),
            item("b", TodoStatus::InProgress),
        ];
        assert!(TodoState::new(items).is_err());
    }

    #[test]
    fn empty_content_is_invalid() {
        let items = vec![item("", TodoStatus::Pending)];
        assert!(TodoState::new(items).is_err());
    }
}
