//! Shared collection of admitted tasks.
//!
//! Every walk over the registry works on a snapshot (an independent `Vec` of
//! `Arc<Task>`), so actions may schedule or cancel tasks mid-walk. Membership
//! changes and the matching state transition happen under one lock, which
//! keeps "present in the registry" and "not finished" consistent.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::core::{Task, TaskId};

#[derive(Debug, Default)]
struct Slots {
    tasks: Vec<Arc<Task>>,
    /// Set by shutdown; no admissions afterwards.
    closed: bool,
}

/// Insertion-ordered task registry.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    slots: Mutex<Slots>,
}

impl TaskRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a pending task to `Scheduled` and append it.
    ///
    /// Returns `false` (and does not insert) if the registry is closed or the
    /// task was cancelled while its admission was pending.
    pub(crate) fn admit(&self, task: Arc<Task>) -> bool {
        let mut slots = self.slots.lock();
        if slots.closed || !task.mark_scheduled() {
            return false;
        }
        slots.tasks.push(task);
        true
    }

    /// Cancel `task` and drop it from the registry. True exactly once.
    pub(crate) fn cancel(&self, task: &Task) -> bool {
        let mut slots = self.slots.lock();
        if !task.mark_cancelled() {
            return false;
        }
        slots.tasks.retain(|t| t.id() != task.id());
        true
    }

    /// Finish `task` and drop it from the registry. True exactly once.
    pub(crate) fn finish(&self, task: &Task, now: Instant) -> bool {
        let mut slots = self.slots.lock();
        if !task.mark_finished(now) {
            return false;
        }
        slots.tasks.retain(|t| t.id() != task.id());
        true
    }

    /// Independent copy of the current contents, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Task>> {
        self.slots.lock().tasks.clone()
    }

    /// Snapshot filtered to tasks whose owner is alive.
    #[must_use]
    pub fn live(&self) -> Vec<Arc<Task>> {
        self.snapshot()
            .into_iter()
            .filter(|t| !t.is_finished() && t.is_owner_alive())
            .collect()
    }

    /// Look up a task by id.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<Arc<Task>> {
        self.slots.lock().tasks.iter().find(|t| t.id() == id).cloned()
    }

    /// Number of registered tasks, dead owners included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().tasks.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().tasks.is_empty()
    }

    /// Refuse further admissions and remove everything, returning what was
    /// registered.
    pub(crate) fn close_and_drain(&self) -> Vec<Arc<Task>> {
        let mut slots = self.slots.lock();
        slots.closed = true;
        std::mem::take(&mut slots.tasks)
    }
}
