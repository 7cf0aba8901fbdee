//! Error types for scheduler operations.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by scheduler components.
///
/// Only programming misuse surfaces here. Vetoed admissions and repeated
/// cancellations are ordinary runtime outcomes and are reported through the
/// returned task state or a `bool` instead.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Periodic task requested with a zero period.
    #[error("invalid period for task `{name}`: period must be greater than zero")]
    InvalidPeriod {
        /// Name of the rejected task.
        name: String,
    },
    /// End of the execution window lies before its start.
    #[error("invalid window for task `{name}`: end is {gap:?} before start")]
    InvalidWindow {
        /// Name of the rejected task.
        name: String,
        /// Distance between the requested end and the requested start.
        gap: Duration,
    },
    /// `start()` called on a scheduler whose worker is already running.
    #[error("scheduler already started")]
    AlreadyStarted,
    /// Operation attempted after `shutdown()`.
    #[error("scheduler has been shut down")]
    ShutDown,
    /// Configuration failed validation.
    #[error("config invalid: {0}")]
    Config(String),
    /// The background worker thread could not be spawned.
    #[error("failed to spawn async worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
