//! Background worker draining async-targeted tasks.
//!
//! A single dedicated OS thread runs for the life of a started scheduler,
//! independent of the host's tick cadence. Each cycle snapshots the registry
//! and runs, in two passes, `EveryAsyncFrame` tasks and then `NextAsyncFrame`
//! / `Async` tasks, through the same run procedure the tick path uses.
//!
//! # Design
//!
//! - **Idle blocks**: with no async tasks registered the thread blocks on the
//!   wake signal instead of spinning.
//! - **Busy polls**: with async tasks registered it waits `poll_interval`
//!   between cycles, because start/end/period guards need re-checking even
//!   when nothing new is admitted. The wait ends early on a wake.
//! - **Weak handle**: the thread never keeps the scheduler alive; dropping the
//!   last `Scheduler` handle disconnects the wake channel and the thread exits.

use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, warn};

use crate::core::scheduler::SchedulerInner;

/// Auto-reset wake event. Signals coalesce while one is pending.
#[derive(Debug)]
pub struct WakeSignal {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl WakeSignal {
    /// Create an unset signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    /// Set the signal; a no-op if it is already set.
    pub fn notify(&self) {
        let _ = self.tx.try_send(());
    }

    /// Receiving end for a waiter. Disconnects once the signal is dropped.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<()> {
        self.rx.clone()
    }
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the async worker thread.
#[derive(Debug)]
pub struct AsyncWorkerPool {
    handle: Option<JoinHandle<()>>,
}

impl AsyncWorkerPool {
    /// Spawn the worker thread for `scheduler`.
    pub(crate) fn spawn(scheduler: &Arc<SchedulerInner>) -> std::io::Result<Self> {
        let config = scheduler.config();
        let weak = Arc::downgrade(scheduler);
        let wake = scheduler.wake().subscribe();
        let poll_interval = config.poll_interval();

        let handle = thread::Builder::new()
            .name(config.worker_thread_name.clone())
            .stack_size(config.worker_stack_size)
            .spawn(move || worker_loop(&weak, &wake, poll_interval))?;

        debug!(
            thread = %config.worker_thread_name,
            poll_interval_ms = config.poll_interval_ms,
            "async worker started"
        );
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait up to `timeout` for the thread to exit. The caller must already
    /// have told it to stop.
    ///
    /// Called from the worker thread itself (shutdown from inside an async
    /// action) this returns immediately; the loop exits once the action does.
    pub(crate) fn join(mut self, timeout: Duration) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            debug!("shutdown requested from the async worker; not joining");
            return;
        }

        let (tx, rx) = bounded(1);
        let joiner = thread::spawn(move || {
            let _ = tx.send(handle.join().is_ok());
        });

        match rx.recv_timeout(timeout) {
            Ok(true) => {
                debug!("async worker joined");
                let _ = joiner.join();
            }
            Ok(false) => {
                warn!("async worker panicked");
                let _ = joiner.join();
            }
            Err(_) => {
                warn!(
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "async worker did not exit within timeout - detaching"
                );
            }
        }
    }

    /// Whether the thread is still running.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

fn worker_loop(scheduler: &Weak<SchedulerInner>, wake: &Receiver<()>, poll_interval: Duration) {
    debug!("async worker loop entered");
    loop {
        let Some(inner) = scheduler.upgrade() else {
            break;
        };
        if inner.is_shut_down() {
            break;
        }
        let pending = inner.run_async_cycle();
        drop(inner);

        let woke = if pending == 0 {
            wake.recv().map_err(|_| RecvTimeoutError::Disconnected)
        } else {
            wake.recv_timeout(poll_interval)
        };
        if matches!(woke, Err(RecvTimeoutError::Disconnected)) {
            break;
        }
    }
    debug!("async worker loop exiting");
}
