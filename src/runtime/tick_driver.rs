//! Tokio-driven tick source for hosts without their own frame loop.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::core::{Scheduler, SchedulerError, TickContext};

/// Calls [`Scheduler::tick`] on a fixed interval from a tokio task.
///
/// Actions run on the runtime worker that polls the driver; keep them short
/// or schedule heavy work on an async target instead.
#[derive(Debug)]
pub struct TickDriver {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<u64>,
}

impl TickDriver {
    /// Spawn on the current runtime. Must be called from within a tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::Config`] for a zero interval.
    pub fn spawn(
        scheduler: Scheduler,
        context: TickContext,
        every: Duration,
    ) -> Result<Self, SchedulerError> {
        Self::spawn_on(&tokio::runtime::Handle::current(), scheduler, context, every)
    }

    /// Spawn on `handle`.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::Config`] for a zero interval.
    pub fn spawn_on(
        handle: &tokio::runtime::Handle,
        scheduler: Scheduler,
        context: TickContext,
        every: Duration,
    ) -> Result<Self, SchedulerError> {
        if every.is_zero() {
            return Err(SchedulerError::Config(
                "tick interval must be greater than 0".into(),
            ));
        }
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let handle = handle.spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks = 0_u64;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        scheduler.tick(context);
                        ticks += 1;
                    }
                }
            }
            debug!(?context, ticks, "tick driver stopped");
            ticks
        });
        Ok(Self {
            stop: Some(stop_tx),
            handle,
        })
    }

    /// Stop ticking and wait for the driver task. Returns the number of ticks
    /// delivered.
    pub async fn stop(mut self) -> u64 {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        (&mut self.handle).await.unwrap_or(0)
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        if self.stop.is_some() {
            self.handle.abort();
        }
    }
}
