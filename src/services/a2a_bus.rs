//! A2ABus (C9): validated agent-to-agent message send/receive.
//!
//! Grounded on the teacher's `domain/ports/task_repository.rs` port-call
//! idiom; address parsing (`@AgentName#NN`) and fail-closed payload
//! validation follow spec.md §4.9 and `domain::models::a2a` exactly.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::errors::{HubError, HubResult};
use crate::domain::models::{A2AMessage, MessageKind, MessagePriority};
use crate::domain::ports::{AgentRepository, MessageRepository};

/// A parsed `@AgentName#NN` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub agent_name: String,
    pub numeric_code: Option<u16>,
}

/// Parses `@AgentName#NN` (the `#NN` suffix is optional). Bare names
/// without a leading `@` are also accepted.
pub fn parse_address(raw: &str) -> Address {
    let trimmed = raw.trim_start_matches('@');
    match trimmed.split_once('#') {
        Some((name, code)) => Address {
            agent_name: name.to_string(),
            numeric_code: code.parse().ok(),
        },
        None => Address {
            agent_name: trimmed.to_string(),
            numeric_code: None,
        },
    }
}

pub struct A2ABus {
    agents: Arc<dyn AgentRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl A2ABus {
    pub fn new(agents: Arc<dyn AgentRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { agents, messages }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn ata_send(
        &self,
        from: &str,
        to: &str,
        task_code: &str,
        kind: MessageKind,
        payload: serde_json::Value,
        priority: MessagePriority,
        requires_response: bool,
    ) -> HubResult<Uuid> {
        let from_addr = parse_address(from);
        let to_addr = parse_address(to);

        let sender = self
            .agents
            .get(&from_addr.agent_name)
            .await?
            .ok_or_else(|| HubError::AgentNotFound(from_addr.agent_name.clone()))?;
        if !sender.send_enabled {
            return Err(HubError::Forbidden);
        }

        let receiver = self
            .agents
            .get(&to_addr.agent_name)
            .await?
            .ok_or_else(|| HubError::AgentNotFound(to_addr.agent_name.clone()))?;

        if let Some(expected_code) = to_addr.numeric_code {
            if expected_code != receiver.numeric_code {
                return Err(HubError::AgentCodeMismatch(to_addr.agent_name.clone()));
            }
        }

        let mut message = A2AMessage::new(task_code, &from_addr.agent_name, &to_addr.agent_name, kind, payload)
            .with_priority(priority);
        if requires_response {
            message = message.requiring_response();
        }

        message
            .validate_payload()
            .map_err(HubError::AtaPayloadInvalid)?;

        self.messages.enqueue(&message).await?;
        info!(msg_id = %message.msg_id, from = %from_addr.agent_name, to = %to_addr.agent_name, "ata_sent");
        Ok(message.msg_id)
    }

    pub async fn ata_receive(
        &self,
        to: &str,
        from: Option<&str>,
        unread_only: bool,
        limit: usize,
    ) -> HubResult<Vec<A2AMessage>> {
        self.messages.deliver(to, from, unread_only, limit).await
    }
}
