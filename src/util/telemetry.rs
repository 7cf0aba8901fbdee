//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Sink for task failures.
///
/// Implementations must not panic: they are called from inside the tick and
/// worker loops, which keep going after every failure.
pub trait TaskLogger: Send + Sync {
    /// Report that `message` happened because of `cause`.
    fn log_failure(&self, message: &str, cause: &anyhow::Error);
}

/// Logger forwarding failures to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TaskLogger for TracingLogger {
    fn log_failure(&self, message: &str, cause: &anyhow::Error) {
        tracing::error!(error = %cause, "{message}");
    }
}

/// Initialize tracing/telemetry. Users can install their own subscriber; this
/// helper installs a default env-based subscriber if none is set.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Like [`init_tracing`], falling back to `default_directive` when `RUST_LOG`
/// is unset or invalid.
pub fn init_tracing_with_default(default_directive: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
