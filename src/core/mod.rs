//! Core scheduling abstractions: tasks, admission, registry, execution.

pub mod admission;
pub mod audit;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod stats;
pub mod task;
pub mod worker_pool;

pub use admission::{AdmissionGate, Admission, AdmitAll, PredicateGate, ToggleGate};
pub use audit::{AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, build_audit_event};
pub use error::{AppResult, SchedulerError};
pub use registry::TaskRegistry;
pub use scheduler::Scheduler;
pub use stats::SchedulerStats;
pub use task::{
    ExecutionTarget, Fallible, LifecycleToken, OwnerLiveness, Task, TaskAction, TaskId, TaskSpec,
    TaskState, TickContext, fallible,
};
pub use worker_pool::{AsyncWorkerPool, WakeSignal};
