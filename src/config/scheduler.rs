//! Scheduler configuration structures.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Prefix for environment overrides read by [`SchedulerConfig::from_env`].
pub const ENV_PREFIX: &str = "FRAME_SCHEDULER_";

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Async worker wait between cycles while async tasks are pending.
    pub poll_interval_ms: u64,
    /// Interval of the dead-owner sweep; `0` disables the automatic sweep.
    pub sweep_interval_ms: u64,
    /// Spawn the async worker thread on `start()`. When disabled the host
    /// drives async tasks with `tick(TickContext::Async)`.
    pub worker_enabled: bool,
    /// Name of the async worker thread.
    pub worker_thread_name: String,
    /// Stack size of the async worker thread in bytes.
    pub worker_stack_size: usize,
    /// Upper bound on waiting for the worker to exit during shutdown.
    pub shutdown_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 20,
            sweep_interval_ms: 1_000,
            worker_enabled: true,
            worker_thread_name: "frame-scheduler-async".into(),
            worker_stack_size: 2 * 1024 * 1024,
            shutdown_timeout_ms: 2_000,
        }
    }
}

impl SchedulerConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the async poll interval.
    #[must_use]
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the dead-owner sweep interval (`0` disables it).
    #[must_use]
    pub fn with_sweep_interval_ms(mut self, ms: u64) -> Self {
        self.sweep_interval_ms = ms;
        self
    }

    /// Enable or disable the async worker thread.
    #[must_use]
    pub fn with_worker_enabled(mut self, enabled: bool) -> Self {
        self.worker_enabled = enabled;
        self
    }

    /// Set the worker thread name.
    #[must_use]
    pub fn with_worker_thread_name(mut self, name: impl Into<String>) -> Self {
        self.worker_thread_name = name.into();
        self
    }

    /// Set the worker stack size.
    #[must_use]
    pub fn with_worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = bytes;
        self
    }

    /// Set the shutdown timeout.
    #[must_use]
    pub fn with_shutdown_timeout_ms(mut self, ms: u64) -> Self {
        self.shutdown_timeout_ms = ms;
        self
    }

    /// Poll interval as a `Duration`.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Sweep interval, `None` when disabled.
    #[must_use]
    pub const fn sweep_interval(&self) -> Option<Duration> {
        if self.sweep_interval_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.sweep_interval_ms))
        }
    }

    /// Shutdown timeout as a `Duration`.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Describes the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".into());
        }
        if self.worker_thread_name.trim().is_empty() {
            return Err("worker_thread_name must not be empty".into());
        }
        if self.worker_stack_size < 64 * 1024 {
            return Err("worker_stack_size must be at least 65536 bytes".into());
        }
        if self.shutdown_timeout_ms == 0 {
            return Err("shutdown_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate. Missing fields
    /// take their defaults.
    ///
    /// # Errors
    ///
    /// Parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by `FRAME_SCHEDULER_*` environment variables
    /// (a `.env` file is loaded first if present), then validated.
    ///
    /// # Errors
    ///
    /// Unparsable variable or validation failure.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_env_prefixed(ENV_PREFIX)
    }

    /// Like [`from_env`](Self::from_env) with a custom variable prefix, for
    /// hosts running several schedulers. Does not load `.env`.
    ///
    /// # Errors
    ///
    /// Unparsable variable or validation failure.
    pub fn from_env_prefixed(prefix: &str) -> Result<Self, String> {
        let mut cfg = Self::default();
        if let Some(v) = read_env(prefix, "POLL_INTERVAL_MS")? {
            cfg.poll_interval_ms = v;
        }
        if let Some(v) = read_env(prefix, "SWEEP_INTERVAL_MS")? {
            cfg.sweep_interval_ms = v;
        }
        if let Some(v) = read_env(prefix, "WORKER_ENABLED")? {
            cfg.worker_enabled = v;
        }
        if let Some(v) = read_env::<String>(prefix, "WORKER_THREAD_NAME")? {
            cfg.worker_thread_name = v;
        }
        if let Some(v) = read_env(prefix, "WORKER_STACK_SIZE")? {
            cfg.worker_stack_size = v;
        }
        if let Some(v) = read_env(prefix, "SHUTDOWN_TIMEOUT_MS")? {
            cfg.shutdown_timeout_ms = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn read_env<T>(prefix: &str, suffix: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: Display,
{
    let key = format!("{prefix}{suffix}");
    match env::var(&key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("{key}: {e}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = SchedulerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.poll_interval(), Duration::from_millis(20));
        assert_eq!(cfg.sweep_interval(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_zero_sweep_disables() {
        let cfg = SchedulerConfig::new().with_sweep_interval_ms(0);
        assert!(cfg.sweep_interval().is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        // Names unique to this test; nothing else in the process reads them.
        const PREFIX: &str = "FRAME_SCHEDULER_TEST_ENV_OVERRIDES_";
        env::set_var(format!("{PREFIX}POLL_INTERVAL_MS"), "7");
        env::set_var(format!("{PREFIX}WORKER_ENABLED"), "false");
        let cfg = SchedulerConfig::from_env_prefixed(PREFIX).unwrap();
        assert_eq!(cfg.poll_interval_ms, 7);
        assert!(!cfg.worker_enabled);

        env::set_var(format!("{PREFIX}POLL_INTERVAL_MS"), "soon");
        let err = SchedulerConfig::from_env_prefixed(PREFIX).unwrap_err();
        assert!(err.contains("FRAME_SCHEDULER_TEST_ENV_OVERRIDES_POLL_INTERVAL_MS"));

        env::remove_var(format!("{PREFIX}POLL_INTERVAL_MS"));
        env::remove_var(format!("{PREFIX}WORKER_ENABLED"));
    }

    #[test]
    fn test_unset_prefix_yields_defaults() {
        let cfg = SchedulerConfig::from_env_prefixed("FRAME_SCHEDULER_TEST_UNSET_").unwrap();
        assert_eq!(cfg, SchedulerConfig::default());
    }
}
