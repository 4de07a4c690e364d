//! SQLite implementation of `MessageRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{HubError, HubResult};
use crate::domain::models::{A2AMessage, DeliveryState, MessageKind, MessagePriority};
use crate::domain::ports::MessageRepository;

#[derive(Clone)]
pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn enqueue(&self, message: &A2AMessage) -> HubResult<()> {
        let payload_json = serde_json::to_string(&message.payload)?;

        sqlx::query(
            r#"INSERT INTO a2a_messages (msg_id, task_code, from_agent, to_agent, kind, priority,
               requires_response, payload, created_utc, delivery_state)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.msg_id.to_string())
        .bind(&message.task_code)
        .bind(&message.from_agent)
        .bind(&message.to_agent)
        .bind(kind_str(message.kind))
        .bind(priority_str(message.priority))
        .bind(message.requires_response)
        .bind(&payload_json)
        .bind(message.created_utc.to_rfc3339())
        .bind(delivery_state_str(message.delivery_state))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn deliver(
        &self,
        to_agent: &str,
        from_agent: Option<&str>,
        unread_only: bool,
        limit: usize,
    ) -> HubResult<Vec<A2AMessage>> {
        let mut sql = String::from(
            "SELECT * FROM a2a_messages WHERE to_agent = ?",
        );
        if unread_only {
            sql.push_str(" AND delivery_state = 'queued'");
        }
        if from_agent.is_some() {
            sql.push_str(" AND from_agent = ?");
        }
        sql.push_str(
            " ORDER BY CASE priority WHEN 'urgent' THEN 0 WHEN 'high' THEN 1 WHEN 'normal' THEN 2 ELSE 3 END ASC, \
               created_utc ASC, msg_id ASC LIMIT ?",
        );

        let mut q = sqlx::query_as::<_, MessageRow>(&sql).bind(to_agent);
        if let Some(from) = from_agent {
            q = q.bind(from);
        }
        q = q.bind(limit as i64);

        let rows: Vec<MessageRow> = q.fetch_all(&self.pool).await?;
        let messages: Vec<A2AMessage> = rows.into_iter().map(TryInto::try_into).collect::<HubResult<_>>()?;

        if unread_only && !messages.is_empty() {
            let ids: Vec<Uuid> = messages.iter().map(|m| m.msg_id).collect();
            self.mark_delivered(&ids).await?;
        }

        Ok(messages)
    }

    async fn ack(&self, msg_ids: &[Uuid]) -> HubResult<()> {
        for id in msg_ids {
            sqlx::query("UPDATE a2a_messages SET delivery_state = 'read' WHERE msg_id = ?")
                .bind(id.to_string())
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn count_for_agent(&self, to_agent: &str) -> HubResult<u64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM a2a_messages WHERE to_agent = ? AND delivery_state = 'queued'")
                .bind(to_agent)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0 as u64)
    }
}

impl SqliteMessageRepository {
    async fn mark_delivered(&self, msg_ids: &[Uuid]) -> HubResult<()> {
        for id in msg_ids {
            sqlx::query("UPDATE a2a_messages SET delivery_state = 'delivered' WHERE msg_id = ?")
                .bind(id.to_string())
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}

const fn kind_str(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Request => "request",
        MessageKind::Response => "response",
        MessageKind::Bootstrap => "bootstrap",
        MessageKind::Ack => "ack",
        MessageKind::Message => "message",
    }
}

fn kind_from_str(s: &str) -> Option<MessageKind> {
    match s {
        "request" => Some(MessageKind::Request),
        "response" => Some(MessageKind::Response),
        "bootstrap" => Some(MessageKind::Bootstrap),
        "ack" => Some(MessageKind::Ack),
        "message" => Some(MessageKind::Message),
        _ => None,
    }
}

const fn priority_str(priority: MessagePriority) -> &'static str {
    match priority {
        MessagePriority::Low => "low",
        MessagePriority::Normal => "normal",
        MessagePriority::High => "high",
        MessagePriority::Urgent => "urgent",
    }
}

fn priority_from_str(s: &str) -> Option<MessagePriority> {
    match s {
        "low" => Some(MessagePriority::Low),
        "normal" => Some(MessagePriority::Normal),
        "high" => Some(MessagePriority::High),
        "urgent" => Some(MessagePriority::Urgent),
        _ => None,
    }
}

const fn delivery_state_str(state: DeliveryState) -> &'static str {
    match state {
        DeliveryState::Queued => "queued",
        DeliveryState::Delivered => "delivered",
        DeliveryState::Read => "read",
        DeliveryState::Failed => "failed",
    }
}

fn delivery_state_from_str(s: &str) -> Option<DeliveryState> {
    match s {
        "queued" => Some(DeliveryState::Queued),
        "delivered" => Some(DeliveryState::Delivered),
        "read" => Some(DeliveryState::Read),
        "failed" => Some(DeliveryState::Failed),
        _ => None,
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    msg_id: String,
    task_code: String,
    from_agent: String,
    to_agent: String,
    kind: String,
    priority: String,
    requires_response: bool,
    payload: String,
    created_utc: String,
    delivery_state: String,
}

impl TryFrom<MessageRow> for A2AMessage {
    type Error = HubError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(A2AMessage {
            msg_id: Uuid::parse_str(&row.msg_id).map_err(|e| HubError::Internal(e.to_string()))?,
            task_code: row.task_code,
            from_agent: row.from_agent,
            to_agent: row.to_agent,
            kind: kind_from_str(&row.kind)
                .ok_or_else(|| HubError::Internal(format!("invalid message kind: {}", row.kind)))?,
            priority: priority_from_str(&row.priority)
                .ok_or_else(|| HubError::Internal(format!("invalid message priority: {}", row.priority)))?,
            requires_response: row.requires_response,
            payload: serde_json::from_str(&row.payload)?,
            created_utc: DateTime::parse_from_rfc3339(&row.created_utc)
                .map_err(|e| HubError::Internal(e.to_string()))?
                .with_timezone(&Utc),
            delivery_state: delivery_state_from_str(&row.delivery_state)
                .ok_or_else(|| HubError::Internal(format!("invalid delivery state: {}", row.delivery_state)))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use serde_json::json;

    async fn setup_test_repo() -> SqliteMessageRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteMessageRepository::new(pool)
    }

    #[tokio::test]
    async fn enqueue_and_deliver_round_trips() {
        let repo = setup_test_repo().await;
        let msg = A2AMessage::new("T1", "A1", "A2", MessageKind::Message, json!({"hi": true}));
        repo.enqueue(&msg).await.unwrap();

        let delivered = repo.deliver("A2", None, false, 10).await.unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].from_agent, "A1");
    }

    #[tokio::test]
    async fn unread_only_transitions_to_delivered() {
        let repo = setup_test_repo().await;
        let msg = A2AMessage::new("T1", "A1", "A2", MessageKind::Message, json!({}));
        repo.enqueue(&msg).await.unwrap();

        let first = repo.deliver("A2", None, true, 10).await.unwrap();
        assert_eq!(first.len(), 1);

        let second = repo.deliver("A2", None, true, 10).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn higher_priority_delivered_first() {
        let repo = setup_test_repo().await;
        let low = A2AMessage::new("T1", "A1", "A2", MessageKind::Message, json!({})).with_priority(MessagePriority::Low);
        let urgent =
            A2AMessage::new("T1", "A1", "A2", MessageKind::Message, json!({})).with_priority(MessagePriority::Urgent);
        repo.enqueue(&low).await.unwrap();
        repo.enqueue(&urgent).await.unwrap();

        let delivered = repo.deliver("A2", None, false, 10).await.unwrap();
        assert_eq!(delivered[0].priority, MessagePriority::Urgent);
    }

    #[tokio::test]
    async fn count_for_agent_counts_queued_only() {
        let repo = setup_test_repo().await;
        let msg = A2AMessage::new("T1", "A1", "A2", MessageKind::Message, json!({}));
        repo.enqueue(&msg).await.unwrap();

        assert_eq!(repo.count_for_agent("A2").await.unwrap(), 1);
        repo.deliver("A2", None, true, 10).await.unwrap();
        assert_eq!(repo.count_for_agent("A2").await.unwrap(), 0);
    }
}
