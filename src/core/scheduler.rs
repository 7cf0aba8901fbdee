//! Scheduler: task creation API, tick-driven execution, lifecycle.
//!
//! The scheduler owns the [`TaskRegistry`] and is its only writer. Hosts call
//! [`Scheduler::tick`] once per frame (`TickContext::Sync`) and once per
//! physics step (`TickContext::Physics`); async-targeted tasks are drained by
//! the [`AsyncWorkerPool`] started with [`Scheduler::start`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use frame_scheduler::builders::SchedulerBuilder;
//! use frame_scheduler::core::{ExecutionTarget, LifecycleToken, TickContext};
//!
//! let scheduler = SchedulerBuilder::new().build()?;
//! scheduler.start()?;
//!
//! let plugin = Arc::new(LifecycleToken::new());
//! scheduler.schedule_once(&plugin, || println!("hello"), "greet", ExecutionTarget::NextFrame);
//! scheduler.schedule_periodically(&plugin, || autosave(), "autosave", Duration::from_secs(60), None, true)?;
//!
//! // host frame loop
//! scheduler.tick(TickContext::Sync);
//!
//! scheduler.shutdown();
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::stats::{SchedulerCounters, SchedulerStats};
use crate::core::task::{build_task, Eligibility};
use crate::core::worker_pool::{AsyncWorkerPool, WakeSignal};
use crate::core::{
    Admission, AdmissionGate, ExecutionTarget, OwnerLiveness, SchedulerError, Task, TaskAction,
    TaskId, TaskRegistry, TaskSpec, TickContext,
};
use crate::util::{Clock, TaskLogger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    ShutDown,
}

/// State shared between scheduler handles, the async worker and pending
/// admissions.
pub(crate) struct SchedulerInner {
    config: SchedulerConfig,
    registry: TaskRegistry,
    clock: Arc<dyn Clock>,
    logger: Arc<dyn TaskLogger>,
    gate: Option<Arc<dyn AdmissionGate>>,
    audit: Option<Mutex<Box<dyn AuditSink>>>,
    counters: SchedulerCounters,
    wake: WakeSignal,
    lifecycle: Mutex<Lifecycle>,
    last_sweep: Mutex<Instant>,
    worker: Mutex<Option<AsyncWorkerPool>>,
}

impl SchedulerInner {
    pub(crate) const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub(crate) const fn wake(&self) -> &WakeSignal {
        &self.wake
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        *self.lifecycle.lock() == Lifecycle::ShutDown
    }

    /// Continuation target of [`Admission`].
    pub(crate) fn complete_admission(&self, task: &Arc<Task>, admitted: bool) {
        if admitted && self.registry.admit(Arc::clone(task)) {
            SchedulerCounters::bump(&self.counters.admitted);
            self.record(task, AuditAction::Admitted);
            debug!(
                task_id = task.id(),
                task = task.name(),
                target = ?task.target(),
                "task admitted"
            );
            if task.target().is_async() {
                self.wake.notify();
            }
        } else if task.mark_cancelled() {
            SchedulerCounters::bump(&self.counters.vetoed);
            self.record(task, AuditAction::Vetoed);
            warn!(task_id = task.id(), task = task.name(), "task vetoed at admission");
        }
    }

    /// Run `task` once if its guards allow it.
    pub(crate) fn run_task(&self, task: &Task) {
        let Some(_claim) = task.try_claim() else {
            return;
        };
        if !task.is_finished() && task.is_owner_alive() {
            let now = self.clock.now();
            match task.eligibility(now) {
                Eligibility::Wait => {}
                Eligibility::Expired => {
                    if self.registry.finish(task, now) {
                        SchedulerCounters::bump(&self.counters.finished);
                        self.record(task, AuditAction::Finished);
                        debug!(task_id = task.id(), task = task.name(), "task expired");
                    }
                }
                Eligibility::Ready => self.invoke(task, now),
            }
        }
    }

    fn invoke(&self, task: &Task, now: Instant) {
        task.record_attempt(now);
        match task.invoke() {
            Ok(()) => {
                task.record_run(now);
                SchedulerCounters::bump(&self.counters.runs);
                self.record(task, AuditAction::Ran);
            }
            Err(cause) => {
                SchedulerCounters::bump(&self.counters.failures);
                self.record(task, AuditAction::Failed);
                self.logger
                    .log_failure(&format!("task `{}` failed", task.name()), &cause);
            }
        }
        if task.finalizes_after_run() && self.registry.finish(task, self.clock.now()) {
            SchedulerCounters::bump(&self.counters.finished);
            self.record(task, AuditAction::Finished);
            debug!(task_id = task.id(), task = task.name(), "task finished");
        }
    }

    /// One async cycle. Returns how many async tasks were pending.
    pub(crate) fn run_async_cycle(&self) -> usize {
        self.maybe_sweep();
        let pending: Vec<_> = self
            .registry
            .snapshot()
            .into_iter()
            .filter(|t| !t.is_finished() && t.target().is_async())
            .collect();

        for task in pending
            .iter()
            .filter(|t| t.target() == ExecutionTarget::EveryAsyncFrame)
        {
            self.run_task(task);
        }
        for task in pending.iter().filter(|t| {
            matches!(
                t.target(),
                ExecutionTarget::NextAsyncFrame | ExecutionTarget::Async
            )
        }) {
            self.run_task(task);
        }
        pending.len()
    }

    fn run_tick(&self, context: TickContext) {
        self.maybe_sweep();
        for task in self.registry.snapshot() {
            if task.target().matches(context) {
                self.run_task(&task);
            }
        }
    }

    fn maybe_sweep(&self) {
        let Some(interval) = self.config.sweep_interval() else {
            return;
        };
        let now = self.clock.now();
        {
            let mut last = self.last_sweep.lock();
            if now.saturating_duration_since(*last) < interval {
                return;
            }
            *last = now;
        }
        self.purge_dead_owners();
    }

    fn purge_dead_owners(&self) -> usize {
        let now = self.clock.now();
        let mut purged = 0;
        for task in self.registry.snapshot() {
            if !task.is_owner_alive() && self.registry.finish(&task, now) {
                purged += 1;
                SchedulerCounters::bump(&self.counters.purged);
                self.record(&task, AuditAction::Purged);
            }
        }
        if purged > 0 {
            debug!(purged, "purged tasks with dead owners");
        }
        purged
    }

    fn cancel(&self, task: &Task) -> bool {
        if !self.registry.cancel(task) {
            return false;
        }
        SchedulerCounters::bump(&self.counters.cancelled);
        self.record(task, AuditAction::Cancelled);
        debug!(task_id = task.id(), task = task.name(), "task cancelled");
        true
    }

    fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        for task in self.registry.close_and_drain() {
            if task.mark_cancelled() {
                cancelled += 1;
                SchedulerCounters::bump(&self.counters.cancelled);
                self.record(&task, AuditAction::Cancelled);
            }
        }
        cancelled
    }

    fn record(&self, task: &Task, action: AuditAction) {
        if let Some(sink) = &self.audit {
            sink.lock().record(build_audit_event(task, action));
        }
    }
}

impl Drop for SchedulerInner {
    fn drop(&mut self) {
        for task in self.registry.close_and_drain() {
            task.mark_cancelled();
        }
    }
}

/// Task scheduler handle. Cheap to clone; clones share one registry.
///
/// Actions that capture a `Scheduler` clone keep it alive until they are
/// removed; call [`shutdown`](Self::shutdown) to break such cycles.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    pub(crate) fn from_parts(
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
        logger: Arc<dyn TaskLogger>,
        gate: Option<Arc<dyn AdmissionGate>>,
        audit: Option<Box<dyn AuditSink>>,
    ) -> Self {
        let now = clock.now();
        Self {
            inner: Arc::new(SchedulerInner {
                config,
                registry: TaskRegistry::new(),
                clock,
                logger,
                gate,
                audit: audit.map(Mutex::new),
                counters: SchedulerCounters::default(),
                wake: WakeSignal::new(),
                lifecycle: Mutex::new(Lifecycle::Idle),
                last_sweep: Mutex::new(now),
                worker: Mutex::new(None),
            }),
        }
    }

    /// Start the async worker (if enabled). Tasks may be scheduled and ticked
    /// before `start`; async tasks only run once it is called or the host
    /// ticks `TickContext::Async` itself.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::AlreadyStarted`], [`SchedulerError::ShutDown`], or
    /// [`SchedulerError::WorkerSpawn`].
    pub fn start(&self) -> Result<(), SchedulerError> {
        {
            let mut lifecycle = self.inner.lifecycle.lock();
            match *lifecycle {
                Lifecycle::Running => return Err(SchedulerError::AlreadyStarted),
                Lifecycle::ShutDown => return Err(SchedulerError::ShutDown),
                Lifecycle::Idle => *lifecycle = Lifecycle::Running,
            }
        }

        if self.inner.config.worker_enabled {
            match AsyncWorkerPool::spawn(&self.inner) {
                Ok(worker) => *self.inner.worker.lock() = Some(worker),
                Err(e) => {
                    *self.inner.lifecycle.lock() = Lifecycle::Idle;
                    return Err(SchedulerError::WorkerSpawn(e));
                }
            }
        }

        info!(
            worker_enabled = self.inner.config.worker_enabled,
            registered = self.inner.registry.len(),
            "scheduler started"
        );
        Ok(())
    }

    /// Cancel every outstanding task, clear the registry, stop the worker.
    /// Later admissions are vetoed. Idempotent; returns how many tasks were
    /// cancelled by this call.
    pub fn shutdown(&self) -> usize {
        {
            let mut lifecycle = self.inner.lifecycle.lock();
            if *lifecycle == Lifecycle::ShutDown {
                return 0;
            }
            *lifecycle = Lifecycle::ShutDown;
        }
        info!("shutting down scheduler");

        let cancelled = self.inner.cancel_all();
        self.inner.wake.notify();
        let worker = self.inner.worker.lock().take();
        if let Some(worker) = worker {
            worker.join(self.inner.config.shutdown_timeout());
        }

        info!(cancelled, "scheduler shut down");
        cancelled
    }

    /// Whether `start` succeeded and `shutdown` has not been called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        *self.inner.lifecycle.lock() == Lifecycle::Running
    }

    /// Whether the async worker thread is alive.
    #[must_use]
    pub fn is_worker_alive(&self) -> bool {
        self.inner
            .worker
            .lock()
            .as_ref()
            .is_some_and(AsyncWorkerPool::is_alive)
    }

    /// Current instant according to the scheduler clock.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.inner.clock.now()
    }

    /// Schedule a one-shot task (repeating for `Every*` targets).
    ///
    /// A vetoed task is returned already cancelled.
    pub fn schedule_once<O, A>(
        &self,
        owner: &Arc<O>,
        action: A,
        name: impl Into<String>,
        target: ExecutionTarget,
    ) -> Arc<Task>
    where
        O: OwnerLiveness + 'static,
        A: TaskAction,
    {
        self.submit(owner, action, TaskSpec::new(name, target))
    }

    /// Schedule a task every `period`, on the frame tick or the async worker.
    ///
    /// With `delay` the first run happens at `now + delay`; without it, one
    /// period after scheduling.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidPeriod`] for a zero period.
    pub fn schedule_periodically<O, A>(
        &self,
        owner: &Arc<O>,
        action: A,
        name: impl Into<String>,
        period: Duration,
        delay: Option<Duration>,
        run_async: bool,
    ) -> Result<Arc<Task>, SchedulerError>
    where
        O: OwnerLiveness + 'static,
        A: TaskAction,
    {
        let mut spec = TaskSpec::new(name, sync_or_async(run_async)).with_period(period);
        if let Some(delay) = delay {
            spec = spec.with_start(self.now() + delay);
        }
        self.schedule(owner, action, spec)
    }

    /// Schedule a one-shot task for `when`.
    pub fn schedule_at<O, A>(
        &self,
        owner: &Arc<O>,
        action: A,
        name: impl Into<String>,
        when: Instant,
        run_async: bool,
    ) -> Arc<Task>
    where
        O: OwnerLiveness + 'static,
        A: TaskAction,
    {
        self.submit(
            owner,
            action,
            TaskSpec::new(name, sync_or_async(run_async)).with_start(when),
        )
    }

    /// Schedule from a full [`TaskSpec`].
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidPeriod`] or [`SchedulerError::InvalidWindow`].
    pub fn schedule<O, A>(
        &self,
        owner: &Arc<O>,
        action: A,
        spec: TaskSpec,
    ) -> Result<Arc<Task>, SchedulerError>
    where
        O: OwnerLiveness + 'static,
        A: TaskAction,
    {
        spec.validate()?;
        Ok(self.submit(owner, action, spec))
    }

    fn submit<O, A>(&self, owner: &Arc<O>, action: A, spec: TaskSpec) -> Arc<Task>
    where
        O: OwnerLiveness + 'static,
        A: TaskAction,
    {
        let task = Arc::new(build_task(owner, action, spec, self.now()));
        let admission = Admission::new(Arc::clone(&task), Arc::downgrade(&self.inner));
        match &self.inner.gate {
            Some(gate) => gate.offer(Arc::clone(&task), admission),
            None => admission.admit(),
        }
        task
    }

    /// Cancel `task`. Returns `false` if it was already cancelled or finished.
    /// An invocation already in progress is not interrupted.
    pub fn cancel(&self, task: &Task) -> bool {
        self.inner.cancel(task)
    }

    /// Run the tasks belonging to one occurrence of `context`.
    pub fn tick(&self, context: TickContext) {
        match context {
            TickContext::Async => {
                self.inner.run_async_cycle();
            }
            TickContext::Sync | TickContext::Physics => self.inner.run_tick(context),
        }
    }

    /// Registered, unfinished tasks whose owner is alive.
    #[must_use]
    pub fn tasks(&self) -> Vec<Arc<Task>> {
        self.inner.registry.live()
    }

    /// Look up a registered task by id, dead owners included.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<Arc<Task>> {
        self.inner.registry.get(id)
    }

    /// Number of registry entries, dead owners included.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.inner.registry.len()
    }

    /// Finalize and remove tasks whose owner is dead. Returns how many.
    pub fn purge_dead_owners(&self) -> usize {
        self.inner.purge_dead_owners()
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.inner.counters.snapshot(self.inner.registry.len())
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("lifecycle", &*self.inner.lifecycle.lock())
            .field("registered", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

const fn sync_or_async(run_async: bool) -> ExecutionTarget {
    if run_async {
        ExecutionTarget::Async
    } else {
        ExecutionTarget::Sync
    }
}
