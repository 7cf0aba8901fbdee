//! Tests for audit sink

use std::sync::Arc;

use frame_scheduler::builders::SchedulerBuilder;
use frame_scheduler::config::SchedulerConfig;
use frame_scheduler::core::{
    AuditAction, AuditSink, ExecutionTarget, InMemoryAuditSink, LifecycleToken, TickContext,
    ToggleGate, build_audit_event,
};
use parking_lot::Mutex;

fn scheduler_with_sink(
    sink: Arc<Mutex<InMemoryAuditSink>>,
    gate: Arc<ToggleGate>,
) -> frame_scheduler::core::Scheduler {
    SchedulerBuilder::new()
        .with_config(SchedulerConfig::new().with_worker_enabled(false))
        .with_gate(gate)
        .with_audit(sink)
        .build()
        .expect("scheduler")
}

#[test]
fn test_in_memory_audit_sink() {
    let sink = Arc::new(Mutex::new(InMemoryAuditSink::new(10)));
    let scheduler = scheduler_with_sink(sink.clone(), Arc::new(ToggleGate::new()));
    let owner = Arc::new(LifecycleToken::new());

    let task = scheduler.schedule_once(&owner, || {}, "task1", ExecutionTarget::NextFrame);
    let events = sink.lock().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].task_id, task.id());
    assert_eq!(events[0].task_name, "task1");
    assert_eq!(events[0].action, AuditAction::Admitted);
}

#[test]
fn test_audit_sink_overflow() {
    let sink = Arc::new(Mutex::new(InMemoryAuditSink::new(2)));
    let scheduler = scheduler_with_sink(sink.clone(), Arc::new(ToggleGate::new()));
    let owner = Arc::new(LifecycleToken::new());

    scheduler.schedule_once(&owner, || {}, "a", ExecutionTarget::NextFrame);
    scheduler.tick(TickContext::Sync);

    // Admitted is popped; Ran and Finished remain.
    let actions: Vec<_> = sink.lock().events().iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![AuditAction::Ran, AuditAction::Finished]);
}

#[test]
fn test_audit_records_veto() {
    let sink = Arc::new(Mutex::new(InMemoryAuditSink::new(10)));
    let gate = Arc::new(ToggleGate::new());
    gate.close();
    let scheduler = scheduler_with_sink(sink.clone(), gate);
    let owner = Arc::new(LifecycleToken::new());

    scheduler.schedule_once(&owner, || {}, "denied", ExecutionTarget::Sync);
    let events = sink.lock().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::Vetoed);
}

#[test]
fn test_zero_capacity_sink_keeps_nothing() {
    let mut sink = InMemoryAuditSink::new(0);
    let owner = Arc::new(LifecycleToken::new());
    let scheduler = SchedulerBuilder::new().build().expect("scheduler");
    let task = scheduler.schedule_once(&owner, || {}, "ignored", ExecutionTarget::Sync);

    sink.record(build_audit_event(&task, AuditAction::Ran));
    assert!(sink.events().is_empty());
}

#[test]
fn test_build_audit_event() {
    let owner = Arc::new(LifecycleToken::new());
    let scheduler = SchedulerBuilder::new().build().expect("scheduler");
    let task = scheduler.schedule_once(&owner, || {}, "evt", ExecutionTarget::Sync);

    let a = build_audit_event(&task, AuditAction::Cancelled);
    let b = build_audit_event(&task, AuditAction::Cancelled);
    assert_ne!(a.event_id, b.event_id);
    assert_eq!(a.task_id, task.id());
    assert!(a.created_at_ms > 0);

    let json = serde_json::to_value(&a).expect("serialize");
    assert_eq!(json["action"], "cancelled");
    assert_eq!(json["task_name"], "evt");
}
