//! Domain ports (interfaces) for the SCC hub.

pub mod agent_repository;
pub mod evidence_port;
pub mod message_repository;
pub mod task_repository;

pub use agent_repository::{AgentFilter, AgentRepository};
pub use evidence_port::{EventLogPort, EvidenceStorePort, SubtaskIndexPort, TodoStorePort};
pub use message_repository::MessageRepository;
pub use task_repository::{TaskFilter, TaskRepository};
