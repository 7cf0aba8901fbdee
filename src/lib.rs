//! # Frame Scheduler
//!
//! Deferred, delayed and periodic task execution for frame-driven hosts such
//! as game loops, simulations and plugin runtimes.
//!
//! Work is scheduled against an [`ExecutionTarget`](core::ExecutionTarget):
//! the next or every frame tick, the next or every physics step, or a
//! dedicated background thread for asynchronous work. The host drives the
//! synchronous contexts by calling [`Scheduler::tick`](core::Scheduler::tick);
//! the background worker runs on its own cadence.
//!
//! ## Key Features
//!
//! - **One-shot, delayed and periodic tasks** with optional start and end
//!   instants
//! - **Admission gate**: an injected policy can admit, veto or defer every
//!   newly scheduled task
//! - **Cooperative cancellation**: `cancel` is idempotent and never interrupts
//!   a running action
//! - **Owner liveness**: tasks belonging to a dead owner are hidden, skipped,
//!   and swept out of the registry
//! - **Failure isolation**: a panicking or failing action is logged and never
//!   stops the tick or the worker
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use frame_scheduler::builders::SchedulerBuilder;
//! use frame_scheduler::config::SchedulerConfig;
//! use frame_scheduler::core::{ExecutionTarget, LifecycleToken, TickContext, ToggleGate};
//!
//! let gate = Arc::new(ToggleGate::new());
//! let scheduler = SchedulerBuilder::new()
//!     .with_config(SchedulerConfig::from_env()?)
//!     .with_gate(gate.clone())
//!     .build()?;
//! scheduler.start()?;
//!
//! let owner = Arc::new(LifecycleToken::new());
//! let task = scheduler.schedule_periodically(
//!     &owner,
//!     || refresh_cache(),
//!     "refresh-cache",
//!     Duration::from_secs(5),
//!     None,
//!     true,
//! )?;
//!
//! // once per frame
//! scheduler.tick(TickContext::Sync);
//!
//! scheduler.cancel(&task);
//! scheduler.shutdown();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Tasks, admission, registry, scheduler and async worker.
pub mod core;
/// Scheduler configuration.
pub mod config;
/// Builders wiring a scheduler from configuration and collaborators.
pub mod builders;
/// Runtime adapters and diagnostics API surface.
pub mod runtime;
/// Shared utilities: clocks and telemetry.
pub mod util;
