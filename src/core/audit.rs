//! Audit sink implementations.
//!
//! Records task lifecycle transitions (admission, runs, failures, terminal
//! states) for diagnostics. Attaching a sink is optional.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::{Task, TaskId};
use crate::util::clock::now_ms;

/// Lifecycle transition being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Admitted into the registry.
    Admitted,
    /// Rejected by the admission gate.
    Vetoed,
    /// Action ran successfully.
    Ran,
    /// Action panicked or returned an error.
    Failed,
    /// Finalized after its last run or on reaching its end time.
    Finished,
    /// Cancelled explicitly or by shutdown.
    Cancelled,
    /// Removed by the dead-owner sweep.
    Purged,
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related task identifier.
    pub task_id: TaskId,
    /// Related task name.
    pub task_name: String,
    /// Transition recorded.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Shared sink: hand one clone to the scheduler and keep another to inspect.
impl<S: AuditSink> AuditSink for Arc<Mutex<S>> {
    fn record(&mut self, event: AuditEvent) {
        self.lock().record(event);
    }
}

/// Helper to build an audit event for `task`.
#[must_use]
pub fn build_audit_event(task: &Task, action: AuditAction) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        task_id: task.id(),
        task_name: task.name().to_string(),
        action,
        created_at_ms: now_ms(),
    }
}
