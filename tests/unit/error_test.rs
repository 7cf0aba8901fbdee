//! Tests for error types

use std::time::Duration;

use frame_scheduler::core::SchedulerError;

#[test]
fn test_invalid_period_error() {
    let err = SchedulerError::InvalidPeriod {
        name: "autosave".to_string(),
    };
    assert_eq!(
        format!("{err}"),
        "invalid period for task `autosave`: period must be greater than zero"
    );
}

#[test]
fn test_invalid_window_error() {
    let err = SchedulerError::InvalidWindow {
        name: "fade".to_string(),
        gap: Duration::from_millis(250),
    };
    assert_eq!(
        format!("{err}"),
        "invalid window for task `fade`: end is 250ms before start"
    );
}

#[test]
fn test_lifecycle_errors() {
    assert_eq!(format!("{}", SchedulerError::AlreadyStarted), "scheduler already started");
    assert_eq!(format!("{}", SchedulerError::ShutDown), "scheduler has been shut down");
}

#[test]
fn test_config_error() {
    let err = SchedulerError::Config("poll_interval_ms must be greater than 0".to_string());
    assert_eq!(
        format!("{err}"),
        "config invalid: poll_interval_ms must be greater than 0"
    );
}

#[test]
fn test_worker_spawn_error_from_io() {
    let io = std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no threads left");
    let err: SchedulerError = io.into();
    assert!(matches!(err, SchedulerError::WorkerSpawn(_)));
    assert_eq!(format!("{err}"), "failed to spawn async worker: no threads left");
}
