//! A2A message repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::HubResult;
use crate::domain::models::A2AMessage;

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist an already-validated envelope (see
    /// `A2AMessage::validate_payload`); callers must not call this with
    /// an invalid envelope — rejection happens before persistence.
    async fn enqueue(&self, message: &A2AMessage) -> HubResult<()>;

    /// Deliver messages addressed to `to_agent`, ordered by
    /// `(priority desc, created_utc asc, msg_id asc)`. When
    /// `unread_only` is true, only `queued` messages are returned and
    /// they transition to `delivered` atomically as part of the fetch.
    async fn deliver(
        &self,
        to_agent: &str,
        from_agent: Option<&str>,
        unread_only: bool,
        limit: usize,
    ) -> HubResult<Vec<A2AMessage>>;

    /// Move messages to `read`. Never implicit.
    async fn ack(&self, msg_ids: &[Uuid]) -> HubResult<()>;

    async fn count_for_agent(&self, to_agent: &str) -> HubResult<u64>;
}
