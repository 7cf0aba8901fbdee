//! Tests for utility functions

use std::sync::Arc;
use std::time::Duration;

use frame_scheduler::util::{init_tracing_with_default, Clock, ManualClock, SystemClock, TaskLogger, TracingLogger};

#[test]
fn test_manual_clock_shared_between_handles() {
    let clock = Arc::new(ManualClock::new());
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let before = dyn_clock.now();
    clock.advance(Duration::from_millis(16));
    assert_eq!(dyn_clock.now() - before, Duration::from_millis(16));
}

#[test]
fn test_system_clock_advances() {
    let clock = SystemClock;
    let a = clock.now();
    std::thread::sleep(Duration::from_millis(2));
    assert!(clock.now() > a);
}

#[test]
fn test_tracing_logger_does_not_panic() {
    init_tracing_with_default("frame_scheduler=debug");
    // second install is a no-op
    init_tracing_with_default("info");
    TracingLogger.log_failure("task `x` failed", &anyhow::anyhow!("cause"));
}
