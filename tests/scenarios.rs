//! End-to-end scenarios S1-S6 from spec.md §8, exercised against a
//! fully-wired `Engine` over a migrated in-memory SQLite pool plus a
//! temp-dir-backed filesystem evidence tree.

use scc_hub::adapters::sqlite::create_migrated_test_pool;
use scc_hub::domain::models::{
    Agent, Config, MessageKind, MessagePriority, Permission, Role, Task, TaskStatus, Verdict,
};
use scc_hub::domain::ports::{AgentRepository, EventLogPort, EvidenceStorePort, TaskRepository};
use scc_hub::infrastructure::Engine;

async fn test_engine(repo_root: &std::path::Path) -> Engine {
    let pool = create_migrated_test_pool().await.expect("migrated test pool");
    let mut config = Config::default();
    config.repo_root = repo_root.to_string_lossy().into_owned();
    // S2 drives 8 outstanding leases on one agent; the default governor
    // ceiling (3) exists to shed load under real resource pressure, not
    // to cap a single agent's declared capacity.
    config.governor.max_outstanding = 16;
    Engine::from_pool(config, pool).await.expect("wire engine")
}

fn ready_task(task_code: &str, owner_role: Role, priority: u8, required_capability: &str) -> Task {
    let mut task = Task::new(task_code, owner_role, serde_json::json!({}))
        .with_priority(priority)
        .with_required_capability(required_capability);
    task.transition_to(TaskStatus::Ready).unwrap();
    task
}

async fn register_agent(engine: &Engine, agent_id: &str, owner_role: Role, capacity: u32, capability: &str) {
    let agent = Agent::new(agent_id, 1, owner_role, capacity).with_capabilities([capability.to_string()]);
    engine.agents.upsert(&agent).await.unwrap();
}

/// S1 - Capacity limit: a one-slot agent can hold exactly one active
/// task; a second eligible task is refused with `AGENT_QUOTA_EXCEEDED`.
#[tokio::test]
async fn s1_capacity_limit() {
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(dir.path()).await;

    register_agent(&engine, "A1", Role::Worker, 1, "cap1").await;

    let t1 = ready_task("T1", Role::Worker, 1, "cap1");
    engine.tasks.create(&t1).await.unwrap();

    let granted = engine.scheduler.next_task("A1").await.unwrap();
    assert_eq!(granted.task_id, t1.task_id);

    let t2 = ready_task("T2", Role::Worker, 1, "cap1");
    engine.tasks.create(&t2).await.unwrap();

    let err = engine.scheduler.next_task("A1").await.unwrap_err();
    assert_eq!(err.reason_code(), "AGENT_QUOTA_EXCEEDED");
}

/// S2 - Priority + FIFO: eight tasks submitted in one order are drained
/// by priority desc, then creation order within a tier.
#[tokio::test]
async fn s2_priority_and_fifo() {
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(dir.path()).await;

    register_agent(&engine, "A1", Role::Worker, 8, "cap1").await;

    let priorities = [0u8, 1, 2, 3, 3, 2, 1, 0];
    for (i, priority) in priorities.iter().enumerate() {
        let task = ready_task(&format!("T{}", i + 1), Role::Worker, *priority, "cap1");
        engine.tasks.create(&task).await.unwrap();
        // Ensure distinct `created_utc` ordering within a priority tier
        // even on a fast clock.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let expected = ["T4", "T5", "T3", "T6", "T2", "T7", "T1", "T8"];
    for task_code in expected {
        let granted = engine.scheduler.next_task("A1").await.unwrap();
        assert_eq!(granted.task_code, task_code);
    }
}

/// S3 - RBAC: `task/result` is forbidden for `submitter`, succeeds for
/// `worker` holding the lease, and is `LEASE_INVALID` for `worker`
/// without one.
#[tokio::test]
async fn s3_rbac() {
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(dir.path()).await;

    assert!(!Role::Submitter.has_permission(Permission::ReportResult));
    let submitter_check = engine.policy_gate.authorize(Role::Submitter, Permission::ReportResult);
    assert!(submitter_check.is_err());

    assert!(Role::Worker.has_permission(Permission::ReportResult));
    engine.policy_gate.authorize(Role::Worker, Permission::ReportResult).unwrap();

    register_agent(&engine, "A1", Role::Worker, 1, "cap1").await;
    let leased_task = ready_task("T1", Role::Worker, 1, "cap1");
    engine.tasks.create(&leased_task).await.unwrap();
    let granted = engine.scheduler.next_task("A1").await.unwrap();

    let done = engine.lease_manager.release(granted.task_id, "A1", Verdict::Pass).await.unwrap();
    assert_eq!(done.status, TaskStatus::Done);

    let unleased_task = ready_task("T2", Role::Worker, 1, "cap1");
    engine.tasks.create(&unleased_task).await.unwrap();
    let err = engine.lease_manager.release(unleased_task.task_id, "A1", Verdict::Pass).await.unwrap_err();
    assert_eq!(err.reason_code(), "LEASE_INVALID");
}

/// S4 - ATA fail-closed: a `response` payload missing `audit_triplet`
/// is rejected and never enqueued; the same payload with a complete
/// triplet is delivered once under `unread_only=true`.
#[tokio::test]
async fn s4_ata_fail_closed() {
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(dir.path()).await;

    register_agent(&engine, "Sender", Role::Worker, 4, "cap1").await;
    register_agent(&engine, "Receiver", Role::Worker, 4, "cap1").await;

    let bad_payload = serde_json::json!({ "status": "PASS" });
    let rejected = engine
        .a2a_bus
        .ata_send("Sender", "Receiver", "T1", MessageKind::Response, bad_payload, MessagePriority::Normal, false)
        .await;
    assert_eq!(rejected.unwrap_err().reason_code(), "ATA_PAYLOAD_INVALID");

    let good_payload = serde_json::json!({
        "status": "PASS",
        "audit_triplet": {
            "report_path": "p",
            "selftest_log_path": "p",
            "artifacts_dir": "p",
        },
    });
    engine
        .a2a_bus
        .ata_send("Sender", "Receiver", "T1", MessageKind::Response, good_payload, MessagePriority::Normal, false)
        .await
        .unwrap();

    let delivered = engine.a2a_bus.ata_receive("Receiver", None, true, 10).await.unwrap();
    assert_eq!(delivered.len(), 1);

    let delivered_again = engine.a2a_bus.ata_receive("Receiver", None, true, 10).await.unwrap();
    assert!(delivered_again.is_empty(), "unread_only must not redeliver");
}

/// S5 - DLQ replay: replay is forbidden for `auditor` and, for `admin`,
/// clones the DLQed task into a new `ready` task linked by
/// `parent_task_id`.
#[tokio::test]
async fn s5_dlq_replay() {
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(dir.path()).await;

    assert!(!Role::Auditor.has_permission(Permission::ReplayDlq));
    assert!(Role::Admin.has_permission(Permission::ReplayDlq));

    let mut dlqed = ready_task("T1", Role::Worker, 1, "cap1");
    dlqed.transition_to(TaskStatus::Leased).unwrap();
    dlqed.transition_to(TaskStatus::InProgress).unwrap();
    dlqed.transition_to(TaskStatus::Failed).unwrap();
    dlqed.transition_to(TaskStatus::Dlq).unwrap();
    engine.tasks.create(&dlqed).await.unwrap();

    let replayed = engine.lease_manager.replay_dlq(dlqed.task_id).await.unwrap();
    assert_eq!(replayed.status, TaskStatus::Ready);
    assert_eq!(replayed.parent_task_id, Some(dlqed.task_id));
}

/// S6 - Subtask summary: a child's SUBMIT block and event tail are
/// recorded into the parent's evidence folder, and a
/// `subtask_summary_recorded` event lands on the parent's log.
#[tokio::test]
async fn s6_subtask_summary() {
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(dir.path()).await;

    let parent = ready_task("P", Role::Worker, 1, "cap1");
    engine.tasks.create(&parent).await.unwrap();

    let child = engine
        .subtask_pool
        .submit_subtask(&parent, scc_hub::services::subtask_pool::SubtaskType::Code, serde_json::json!({}))
        .await
        .unwrap();

    let report_path = dir.path().join("report.md");
    tokio::fs::write(&report_path, "preamble\n```SUBMIT\nreport_path: p\n```\ntrailer").await.unwrap();

    let mut child = child;
    child.transition_to(TaskStatus::Leased).unwrap();
    child.transition_to(TaskStatus::InProgress).unwrap();
    child.verdict = Some(Verdict::Pass);
    child.report_path = Some(report_path.to_string_lossy().into_owned());
    child.transition_to(TaskStatus::Done).unwrap();
    engine.tasks.update(&child).await.unwrap();

    let summary = engine.subtask_pool.record_subtask_summary(parent.task_id, child.task_id).await.unwrap();
    assert_eq!(summary.submit_block.as_deref(), Some("report_path: p"));
    assert!(summary.child_recent_events_tail.len() <= 60);

    let on_disk = engine
        .evidence_store
        .read_subtask_summary(parent.task_id, child.task_id)
        .await
        .unwrap()
        .expect("summary persisted");
    assert_eq!(on_disk.submit_block, summary.submit_block);

    let expected_path = dir
        .path()
        .join("artifacts")
        .join("scc_tasks")
        .join(parent.task_id.to_string())
        .join("evidence")
        .join("subtask_summaries")
        .join(format!("{}.json", child.task_id));
    assert!(tokio::fs::metadata(&expected_path).await.is_ok());

    let (events, _) = engine.event_log.tail(parent.task_id, 0, 100).await.unwrap();
    assert!(events.iter().any(|e| e.name == "subtask_summary_recorded"));
}
