//! scc-hub — multi-agent task orchestration and A2A messaging hub.
//!
//! A task queue, priority scheduler, and agent-to-agent message bus
//! behind an RBAC-gated HTTP gateway, backed by SQLite for transactional
//! task state and append-only JSONL for event/evidence logs.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod gateway;
pub mod infrastructure;
pub mod services;

pub use infrastructure::Engine;
