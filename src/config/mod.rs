//! Configuration models for the scheduler and its async worker.

pub mod scheduler;

pub use scheduler::SchedulerConfig;
