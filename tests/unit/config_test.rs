//! Tests for configuration validation

use std::time::Duration;

use frame_scheduler::config::SchedulerConfig;

#[test]
fn test_scheduler_config_defaults() {
    let config = SchedulerConfig::default();
    assert_eq!(config.poll_interval_ms, 20);
    assert_eq!(config.sweep_interval_ms, 1_000);
    assert!(config.worker_enabled);
    assert_eq!(config.worker_thread_name, "frame-scheduler-async");
    assert_eq!(config.shutdown_timeout(), Duration::from_secs(2));
    assert!(config.validate().is_ok());
}

#[test]
fn test_scheduler_config_invalid_poll_interval() {
    let invalid = SchedulerConfig::new().with_poll_interval_ms(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_thread_name() {
    let invalid = SchedulerConfig::new().with_worker_thread_name("   ");
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_stack_size() {
    let invalid = SchedulerConfig::new().with_worker_stack_size(1024);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_shutdown_timeout() {
    let invalid = SchedulerConfig::new().with_shutdown_timeout_ms(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "poll_interval_ms": 5,
        "sweep_interval_ms": 0,
        "worker_thread_name": "plugin-async"
    }"#;

    let config = SchedulerConfig::from_json_str(json).expect("valid json");
    assert_eq!(config.poll_interval(), Duration::from_millis(5));
    assert_eq!(config.sweep_interval(), None);
    assert_eq!(config.worker_thread_name, "plugin-async");
    assert!(config.worker_enabled);
}

#[test]
fn test_scheduler_config_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str(r#"{ "poll_interval_ms": 0 }"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_scheduler_config_json_round_trip() {
    let config = SchedulerConfig::new()
        .with_worker_enabled(false)
        .with_sweep_interval_ms(250);
    let json = serde_json::to_string(&config).expect("serialize");
    assert_eq!(SchedulerConfig::from_json_str(&json).expect("parse"), config);
}
