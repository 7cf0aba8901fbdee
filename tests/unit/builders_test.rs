//! Tests for builder modules

use std::sync::Arc;
use std::time::Duration;

use frame_scheduler::builders::SchedulerBuilder;
use frame_scheduler::config::SchedulerConfig;
use frame_scheduler::core::{ExecutionTarget, LifecycleToken, SchedulerError, ToggleGate};
use frame_scheduler::util::{Clock, ManualClock};

#[test]
fn test_scheduler_builder_defaults() {
    let scheduler = SchedulerBuilder::new().build().expect("defaults are valid");
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.registered(), 0);
    assert_eq!(scheduler.stats().admitted, 0);
}

#[test]
fn test_scheduler_builder_uses_clock() {
    let clock = Arc::new(ManualClock::new());
    let scheduler = SchedulerBuilder::new()
        .with_config(SchedulerConfig::new().with_worker_enabled(false))
        .with_clock(clock.clone())
        .build()
        .expect("scheduler");

    assert_eq!(scheduler.now(), clock.now());
    clock.advance(Duration::from_secs(3));
    assert_eq!(scheduler.now(), clock.now());
}

#[test]
fn test_scheduler_builder_wires_gate() {
    let gate = Arc::new(ToggleGate::new());
    gate.close();
    let scheduler = SchedulerBuilder::new()
        .with_gate(gate)
        .build()
        .expect("scheduler");

    let owner = Arc::new(LifecycleToken::new());
    let task = scheduler.schedule_once(&owner, || {}, "gated", ExecutionTarget::Sync);
    assert!(task.is_cancelled());
}

#[test]
fn test_scheduler_builder_rejects_invalid_config() {
    let result = SchedulerBuilder::new()
        .with_config(SchedulerConfig::new().with_worker_stack_size(0))
        .build();
    assert!(matches!(result, Err(SchedulerError::Config(_))));
}
