//! API-facing diagnostics models.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::{ExecutionTarget, Scheduler, SchedulerStats, Task, TaskId, TaskState};

/// Serializable view of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Task identifier.
    pub task_id: TaskId,
    /// Diagnostic label.
    pub name: String,
    /// Execution target.
    pub target: ExecutionTarget,
    /// Lifecycle state.
    pub state: TaskState,
    /// Period in milliseconds, if periodic.
    pub period_ms: Option<u64>,
    /// Time since the last successful run, in milliseconds.
    pub since_last_run_ms: Option<u64>,
    /// Time until the start instant, if still in the future.
    pub starts_in_ms: Option<u64>,
}

impl TaskSnapshot {
    /// Capture `task` relative to `now`.
    #[must_use]
    pub fn capture(task: &Task, now: Instant) -> Self {
        Self {
            task_id: task.id(),
            name: task.name().to_string(),
            target: task.target(),
            state: task.state(),
            period_ms: task.period().map(millis),
            since_last_run_ms: task
                .last_run_time()
                .map(|last| millis(now.saturating_duration_since(last))),
            starts_in_ms: task
                .start_time()
                .filter(|start| *start > now)
                .map(|start| millis(start - now)),
        }
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Scheduler started and not shut down.
    pub ok: bool,
    /// Async worker thread alive.
    pub worker_alive: bool,
    /// Activity counters.
    pub stats: SchedulerStats,
}

/// Snapshots of live tasks, in registry order.
#[must_use]
pub fn list_tasks(scheduler: &Scheduler) -> Vec<TaskSnapshot> {
    let now = scheduler.now();
    scheduler
        .tasks()
        .iter()
        .map(|task| TaskSnapshot::capture(task, now))
        .collect()
}

/// Return a health payload.
#[must_use]
pub fn health(scheduler: &Scheduler) -> Health {
    Health {
        ok: scheduler.is_running(),
        worker_alive: scheduler.is_worker_alive(),
        stats: scheduler.stats(),
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
