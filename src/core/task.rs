//! Task entity, execution targets, and owner liveness.
//!
//! A [`Task`] has an immutable identity (id, name, target, timing window) and a
//! small amount of mutable state (last run, end time, lifecycle state). Tasks
//! are shared as `Arc<Task>` between the scheduler, the tick driver, the async
//! worker and callers; every mutation goes through atomics or a short
//! `parking_lot` critical section.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, SchedulerError};

/// Process-unique task identifier.
pub type TaskId = u64;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Moment a task runs relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTarget {
    /// Next frame tick only.
    NextFrame,
    /// Every frame tick.
    EveryFrame,
    /// Next physics tick only.
    NextPhysicsUpdate,
    /// Every physics tick.
    EveryPhysicsUpdate,
    /// Frame tick; one-shot unless a period is set.
    Sync,
    /// Async worker; one-shot unless a period is set.
    Async,
    /// Next async worker cycle only.
    NextAsyncFrame,
    /// Every async worker cycle.
    EveryAsyncFrame,
}

impl ExecutionTarget {
    /// Whether the async worker (rather than a host tick) executes this target.
    #[must_use]
    pub const fn is_async(self) -> bool {
        matches!(self, Self::Async | Self::NextAsyncFrame | Self::EveryAsyncFrame)
    }

    /// `Next*` targets: run once and finalize regardless of period.
    #[must_use]
    pub const fn is_run_once(self) -> bool {
        matches!(
            self,
            Self::NextFrame | Self::NextPhysicsUpdate | Self::NextAsyncFrame
        )
    }

    /// `Every*` targets: repeat on every occurrence of their context.
    #[must_use]
    pub const fn is_every(self) -> bool {
        matches!(
            self,
            Self::EveryFrame | Self::EveryPhysicsUpdate | Self::EveryAsyncFrame
        )
    }

    /// Whether a tick of `context` executes this target.
    #[must_use]
    pub const fn matches(self, context: TickContext) -> bool {
        match context {
            TickContext::Sync => matches!(self, Self::NextFrame | Self::EveryFrame | Self::Sync),
            TickContext::Physics => {
                matches!(self, Self::NextPhysicsUpdate | Self::EveryPhysicsUpdate)
            }
            TickContext::Async => self.is_async(),
        }
    }
}

/// Context passed to [`Scheduler::tick`](crate::core::Scheduler::tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickContext {
    /// One frame / simulation step.
    Sync,
    /// One physics step.
    Physics,
    /// One async cycle, executed on the calling thread.
    Async,
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TaskState {
    /// Built and offered to the admission gate, not yet decided.
    Pending = 0,
    /// Admitted and waiting for (another) eligible run.
    Scheduled = 1,
    /// Cancelled explicitly or vetoed at admission. Terminal.
    Cancelled = 2,
    /// Completed, expired, or purged. Terminal.
    Finished = 3,
}

impl TaskState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Pending,
            1 => Self::Scheduled,
            2 => Self::Cancelled,
            _ => Self::Finished,
        }
    }
}

/// Deferred work carried by a task.
///
/// Implemented for every `Fn()` closure. Use [`fallible`] for closures that
/// report failure through `anyhow::Result`.
pub trait TaskAction: Send + Sync + 'static {
    /// Run the work once.
    ///
    /// # Errors
    ///
    /// Any error is logged by the scheduler and otherwise ignored.
    fn run(&self) -> AppResult<()>;
}

impl<F> TaskAction for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn run(&self) -> AppResult<()> {
        self();
        Ok(())
    }
}

/// Adapter produced by [`fallible`].
pub struct Fallible<F>(F);

/// Wrap a closure returning `anyhow::Result<()>` so it can be scheduled.
pub fn fallible<F>(action: F) -> Fallible<F>
where
    F: Fn() -> AppResult<()> + Send + Sync + 'static,
{
    Fallible(action)
}

impl<F> TaskAction for Fallible<F>
where
    F: Fn() -> AppResult<()> + Send + Sync + 'static,
{
    fn run(&self) -> AppResult<()> {
        (self.0)()
    }
}

/// Capability of a task owner to report whether it still exists.
pub trait OwnerLiveness: Send + Sync {
    /// `false` once the owner has been deactivated or torn down.
    fn is_alive(&self) -> bool;
}

/// Minimal owner backed by a flag, for hosts without their own lifecycle type.
#[derive(Debug)]
pub struct LifecycleToken {
    alive: AtomicBool,
}

impl LifecycleToken {
    /// Create a live token.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
        }
    }

    /// Mark the owner dead. Its tasks stop running and are eventually purged.
    pub fn deactivate(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Default for LifecycleToken {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnerLiveness for LifecycleToken {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// Description of a task to schedule.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    /// Diagnostic label.
    pub name: String,
    /// When the task runs.
    pub target: ExecutionTarget,
    /// Minimum spacing between runs; makes `Sync`/`Async` targets periodic.
    pub period: Option<Duration>,
    /// Do not run before this instant.
    pub start: Option<Instant>,
    /// Finalize instead of running once this instant is reached.
    pub end: Option<Instant>,
}

impl TaskSpec {
    /// One-shot spec with no timing constraints.
    pub fn new(name: impl Into<String>, target: ExecutionTarget) -> Self {
        Self {
            name: name.into(),
            target,
            period: None,
            start: None,
            end: None,
        }
    }

    /// Set the period.
    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = Some(period);
        self
    }

    /// Set the start instant.
    #[must_use]
    pub fn with_start(mut self, start: Instant) -> Self {
        self.start = Some(start);
        self
    }

    /// Set the end instant.
    #[must_use]
    pub fn with_end(mut self, end: Instant) -> Self {
        self.end = Some(end);
        self
    }

    /// Reject zero periods and windows that end before they start.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidPeriod`] or [`SchedulerError::InvalidWindow`].
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.period.is_some_and(|p| p.is_zero()) {
            return Err(SchedulerError::InvalidPeriod {
                name: self.name.clone(),
            });
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(SchedulerError::InvalidWindow {
                    name: self.name.clone(),
                    gap: start - end,
                });
            }
        }
        Ok(())
    }
}

/// Outcome of the timing guards evaluated before each run attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Eligibility {
    /// Start not reached or period not elapsed.
    Wait,
    /// End reached; finalize without running.
    Expired,
    /// Run now.
    Ready,
}

#[derive(Debug)]
struct Timing {
    /// Last successful invocation.
    last_run: Option<Instant>,
    /// Last invocation, successful or not; the period anchor.
    last_attempt: Option<Instant>,
    end: Option<Instant>,
}

/// One scheduled unit of work.
pub struct Task {
    id: TaskId,
    name: String,
    owner: Weak<dyn OwnerLiveness>,
    action: Box<dyn TaskAction>,
    target: ExecutionTarget,
    period: Option<Duration>,
    start: Option<Instant>,
    created_at: Instant,
    timing: Mutex<Timing>,
    state: AtomicU8,
    in_flight: AtomicBool,
}

impl Task {
    pub(crate) fn new(
        owner: Weak<dyn OwnerLiveness>,
        action: Box<dyn TaskAction>,
        spec: TaskSpec,
        created_at: Instant,
    ) -> Self {
        Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            name: spec.name,
            owner,
            action,
            target: spec.target,
            period: spec.period,
            start: spec.start,
            created_at,
            timing: Mutex::new(Timing {
                last_run: None,
                last_attempt: None,
                end: spec.end,
            }),
            state: AtomicU8::new(TaskState::Pending as u8),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Unique identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Diagnostic label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execution target.
    #[must_use]
    pub const fn target(&self) -> ExecutionTarget {
        self.target
    }

    /// Period, if any.
    #[must_use]
    pub const fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Earliest run instant, if any.
    #[must_use]
    pub const fn start_time(&self) -> Option<Instant> {
        self.start
    }

    /// Expiry instant; after finalization, the finalization instant.
    #[must_use]
    pub fn end_time(&self) -> Option<Instant> {
        self.timing.lock().end
    }

    /// Instant of the last successful run.
    #[must_use]
    pub fn last_run_time(&self) -> Option<Instant> {
        self.timing.lock().last_run
    }

    /// Construction instant per the scheduler clock.
    #[must_use]
    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Cancelled explicitly or vetoed at admission.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state() == TaskState::Cancelled
    }

    /// Cancelled or finalized; a finished task is never in the registry.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state(), TaskState::Cancelled | TaskState::Finished)
    }

    /// Whether the owner still exists and reports itself alive.
    #[must_use]
    pub fn is_owner_alive(&self) -> bool {
        self.owner.upgrade().is_some_and(|owner| owner.is_alive())
    }

    /// Whether running the task finalizes it.
    pub(crate) const fn finalizes_after_run(&self) -> bool {
        self.target.is_run_once() || (!self.target.is_every() && self.period.is_none())
    }

    /// Evaluate start, end and period guards, in that order.
    pub(crate) fn eligibility(&self, now: Instant) -> Eligibility {
        if self.start.is_some_and(|start| now < start) {
            return Eligibility::Wait;
        }
        let timing = self.timing.lock();
        if timing.end.is_some_and(|end| now >= end) {
            return Eligibility::Expired;
        }
        if let Some(period) = self.period {
            // Without an explicit start the first run waits one full period.
            let anchor = timing
                .last_attempt
                .or_else(|| self.start.is_none().then_some(self.created_at));
            if anchor.is_some_and(|anchor| now.saturating_duration_since(anchor) < period) {
                return Eligibility::Wait;
            }
        }
        Eligibility::Ready
    }

    /// Invoke the action, turning panics into errors.
    pub(crate) fn invoke(&self) -> AppResult<()> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.action.run())) {
            Ok(result) => result,
            Err(payload) => Err(anyhow::anyhow!(
                "task panicked: {}",
                panic_message(payload.as_ref())
            )),
        }
    }

    /// Stamp an invocation at `now`, successful or not.
    pub(crate) fn record_attempt(&self, now: Instant) {
        self.timing.lock().last_attempt = Some(now);
    }

    pub(crate) fn record_run(&self, now: Instant) {
        self.timing.lock().last_run = Some(now);
    }

    /// Claim exclusive execution. `None` if another context is running it.
    /// The claim is released when the guard drops, unwinding included.
    pub(crate) fn try_claim(&self) -> Option<ClaimGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ClaimGuard { task: self })
    }

    /// `Pending -> Scheduled`.
    pub(crate) fn mark_scheduled(&self) -> bool {
        self.transition(&[TaskState::Pending], TaskState::Scheduled)
    }

    /// `Pending | Scheduled -> Cancelled`. True exactly once.
    pub(crate) fn mark_cancelled(&self) -> bool {
        self.transition(
            &[TaskState::Pending, TaskState::Scheduled],
            TaskState::Cancelled,
        )
    }

    /// `Scheduled -> Finished`, stamping the end time. True exactly once.
    pub(crate) fn mark_finished(&self, now: Instant) -> bool {
        if !self.transition(&[TaskState::Scheduled], TaskState::Finished) {
            return false;
        }
        let mut timing = self.timing.lock();
        if timing.end.is_none_or(|end| end > now) {
            timing.end = Some(now);
        }
        true
    }

    fn transition(&self, from: &[TaskState], to: TaskState) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if !from.contains(&TaskState::from_u8(current)) {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Exclusive execution claim on a task, see [`Task::try_claim`].
pub(crate) struct ClaimGuard<'a> {
    task: &'a Task,
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.task.in_flight.store(false, Ordering::Release);
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("target", &self.target)
            .field("period", &self.period)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Build a task owned by `owner`.
pub(crate) fn build_task<O, A>(owner: &Arc<O>, action: A, spec: TaskSpec, now: Instant) -> Task
where
    O: OwnerLiveness + 'static,
    A: TaskAction,
{
    let owner: Arc<dyn OwnerLiveness> = owner.clone();
    Task::new(Arc::downgrade(&owner), Box::new(action), spec, now)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
