//! # Admission gate
//!
//! Every task built by the scheduler is offered to an [`AdmissionGate`]
//! before it becomes visible to execution. The gate receives the task and an
//! [`Admission`] continuation and decides, now or later, on any thread:
//!
//! - `admission.admit()`: the task enters the registry;
//! - `admission.veto()`: the task is cancelled and never registered;
//! - keep the `Admission` and resolve it later (deferred admission).
//!
//! ## Rules
//! - An `Admission` resolves exactly once; dropping it unresolved is a veto.
//! - Resolving after the scheduler has shut down (or been dropped) is a veto.
//! - With no gate configured, every offer is admitted immediately.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::warn;

use crate::core::scheduler::SchedulerInner;
use crate::core::Task;

/// Policy deciding whether a task may be scheduled.
pub trait AdmissionGate: Send + Sync {
    /// Decide on `task` by consuming `admission`, now or later.
    fn offer(&self, task: Arc<Task>, admission: Admission);
}

/// One-shot continuation handed to an [`AdmissionGate`].
pub struct Admission {
    task: Arc<Task>,
    scheduler: Weak<SchedulerInner>,
    resolved: bool,
}

impl Admission {
    pub(crate) fn new(task: Arc<Task>, scheduler: Weak<SchedulerInner>) -> Self {
        Self {
            task,
            scheduler,
            resolved: false,
        }
    }

    /// Task awaiting the decision.
    #[must_use]
    pub const fn task(&self) -> &Arc<Task> {
        &self.task
    }

    /// Let the task into the registry.
    pub fn admit(mut self) {
        self.resolve(true);
    }

    /// Reject the task; it ends up cancelled.
    pub fn veto(mut self) {
        self.resolve(false);
    }

    fn resolve(&mut self, admitted: bool) {
        self.resolved = true;
        match self.scheduler.upgrade() {
            Some(scheduler) => scheduler.complete_admission(&self.task, admitted),
            None => {
                self.task.mark_cancelled();
            }
        }
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        if !self.resolved {
            warn!(
                task_id = self.task.id(),
                task = self.task.name(),
                "admission dropped without a decision; treating as veto"
            );
            self.resolve(false);
        }
    }
}

impl fmt::Debug for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admission")
            .field("task", &self.task)
            .field("resolved", &self.resolved)
            .finish_non_exhaustive()
    }
}

/// Gate admitting everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmitAll;

impl AdmissionGate for AdmitAll {
    fn offer(&self, _task: Arc<Task>, admission: Admission) {
        admission.admit();
    }
}

/// Gate that can be closed, e.g. while the owning subsystem shuts down.
#[derive(Debug)]
pub struct ToggleGate {
    open: AtomicBool,
}

impl ToggleGate {
    /// New open gate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
        }
    }

    /// Admit subsequent offers.
    pub fn open(&self) {
        self.open.store(true, Ordering::Release);
    }

    /// Veto subsequent offers.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Whether offers are currently admitted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

impl Default for ToggleGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionGate for ToggleGate {
    fn offer(&self, _task: Arc<Task>, admission: Admission) {
        if self.is_open() {
            admission.admit();
        } else {
            admission.veto();
        }
    }
}

/// Gate admitting tasks for which a predicate holds.
pub struct PredicateGate<F> {
    predicate: F,
}

impl<F> PredicateGate<F>
where
    F: Fn(&Task) -> bool + Send + Sync,
{
    /// Wrap `predicate`.
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> AdmissionGate for PredicateGate<F>
where
    F: Fn(&Task) -> bool + Send + Sync,
{
    fn offer(&self, task: Arc<Task>, admission: Admission) {
        if (self.predicate)(&task) {
            admission.admit();
        } else {
            admission.veto();
        }
    }
}
