//! Tests for runtime adapters and diagnostics

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use frame_scheduler::builders::SchedulerBuilder;
use frame_scheduler::config::SchedulerConfig;
use frame_scheduler::core::{ExecutionTarget, LifecycleToken, Scheduler, TaskState, TickContext};
use frame_scheduler::runtime::{health, list_tasks};
use frame_scheduler::util::{Clock, ManualClock};

fn manual() -> (Scheduler, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let scheduler = SchedulerBuilder::new()
        .with_config(SchedulerConfig::new().with_worker_enabled(false))
        .with_clock(clock.clone())
        .build()
        .expect("scheduler");
    (scheduler, clock)
}

#[test]
fn test_list_tasks_snapshots() {
    let (scheduler, clock) = manual();
    let owner = Arc::new(LifecycleToken::new());
    let dead = Arc::new(LifecycleToken::new());

    let periodic = scheduler
        .schedule_periodically(&owner, || {}, "tick-stats", Duration::from_millis(100), None, false)
        .expect("valid period");
    let when = clock.now() + Duration::from_millis(500);
    scheduler.schedule_at(&owner, || {}, "later", when, true);
    scheduler.schedule_once(&dead, || {}, "hidden", ExecutionTarget::EveryFrame);
    dead.deactivate();

    clock.advance(Duration::from_millis(100));
    scheduler.tick(TickContext::Sync);
    clock.advance(Duration::from_millis(30));

    let snapshots = list_tasks(&scheduler);
    assert_eq!(snapshots.len(), 2);

    assert_eq!(snapshots[0].task_id, periodic.id());
    assert_eq!(snapshots[0].state, TaskState::Scheduled);
    assert_eq!(snapshots[0].period_ms, Some(100));
    assert_eq!(snapshots[0].since_last_run_ms, Some(30));
    assert_eq!(snapshots[0].starts_in_ms, None);

    assert_eq!(snapshots[1].name, "later");
    assert_eq!(snapshots[1].target, ExecutionTarget::Async);
    assert_eq!(snapshots[1].since_last_run_ms, None);
    assert_eq!(snapshots[1].starts_in_ms, Some(370));

    let json = serde_json::to_value(&snapshots[1]).expect("serialize");
    assert_eq!(json["target"], "async");
    assert_eq!(json["state"], "scheduled");
}

#[test]
fn test_health_follows_lifecycle() {
    let scheduler = SchedulerBuilder::new().build().expect("scheduler");
    assert!(!health(&scheduler).ok);

    scheduler.start().expect("start");
    let report = health(&scheduler);
    assert!(report.ok);
    assert!(report.worker_alive);
    assert_eq!(report.stats.registered, 0);

    scheduler.shutdown();
    let report = health(&scheduler);
    assert!(!report.ok);
    assert!(!report.worker_alive);
}

#[cfg(feature = "tokio-runtime")]
mod tick_driver {
    use super::*;
    use frame_scheduler::core::SchedulerError;
    use frame_scheduler::runtime::TickDriver;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tick_driver_ticks_until_stopped() {
        let scheduler = SchedulerBuilder::new()
            .with_config(SchedulerConfig::new().with_worker_enabled(false))
            .build()
            .expect("scheduler");
        let owner = Arc::new(LifecycleToken::new());
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        scheduler.schedule_once(
            &owner,
            move || {
                c.fetch_add(1, Ordering::SeqCst);
            },
            "per-frame",
            ExecutionTarget::EveryFrame,
        );

        let driver = TickDriver::spawn(scheduler.clone(), TickContext::Sync, Duration::from_millis(5))
            .expect("driver");
        tokio::time::sleep(Duration::from_millis(60)).await;
        let ticks = driver.stop().await;

        assert!(ticks > 0);
        assert_eq!(count.load(Ordering::SeqCst) as u64, ticks);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst) as u64, ticks);
    }

    #[tokio::test]
    async fn test_tick_driver_rejects_zero_interval() {
        let scheduler = SchedulerBuilder::new().build().expect("scheduler");
        let result = TickDriver::spawn(scheduler, TickContext::Physics, Duration::ZERO);
        assert!(matches!(result, Err(SchedulerError::Config(_))));
    }
}
