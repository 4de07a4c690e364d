//! `GET /sse` — tails a task's event log as a Server-Sent Events stream.
//!
//! Grounded on the teacher's `adapters/mcp/a2a_http.rs::stream_task`
//! poll-and-diff pattern, adapted to this hub's cursor-based
//! `EventLogPort::tail` instead of an in-memory task map.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::Extension;
use futures::stream::{self, Stream};
use serde::Deserialize;

use crate::domain::models::Permission;
use crate::domain::ports::EventLogPort;
use crate::gateway::auth::AuthContext;
use crate::gateway::error::GatewayError;
use crate::gateway::state::AppState;

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const TAIL_BATCH: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SseQuery {
    pub task_id: uuid::Uuid,
    #[serde(default)]
    pub cursor: u64,
}

pub async fn stream(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, GatewayError> {
    state
        .engine
        .policy_gate
        .authorize(ctx.role, Permission::ReadAll)
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let lease = state
        .engine
        .policy_gate
        .acquire_sse_slot()
        .map_err(|e| GatewayError::new(e, ctx.trace_id))?;

    let engine = state.engine.clone();
    let task_id = query.task_id;
    let initial = (engine, task_id, query.cursor, std::collections::VecDeque::new(), lease);

    let events = stream::unfold(initial, move |(engine, task_id, mut cursor, mut buffer, lease)| async move {
        loop {
            if let Some(event) = buffer.pop_front() {
                let sse_event = SseEvent::default()
                    .event(event.name.clone())
                    .data(serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string()));
                return Some((Ok(sse_event), (engine, task_id, cursor, buffer, lease)));
            }

            match engine.event_log.tail(task_id, cursor, TAIL_BATCH).await {
                Ok((new_events, new_cursor)) => {
                    cursor = new_cursor;
                    if new_events.is_empty() {
                        tokio::time::sleep(POLL_INTERVAL).await;
                    } else {
                        buffer.extend(new_events);
                    }
                }
                Err(_) => return None,
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL).text("heartbeat")))
}
