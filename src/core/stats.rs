//! Scheduler statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time counters describing scheduler activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Tasks admitted into the registry.
    pub admitted: u64,
    /// Tasks vetoed at admission.
    pub vetoed: u64,
    /// Successful action invocations.
    pub runs: u64,
    /// Failed action invocations.
    pub failures: u64,
    /// Tasks finalized by completion or end time.
    pub finished: u64,
    /// Tasks cancelled.
    pub cancelled: u64,
    /// Tasks removed by the dead-owner sweep.
    pub purged: u64,
    /// Tasks currently in the registry, dead owners included.
    pub registered: usize,
}

/// Internal counters (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub admitted: AtomicU64,
    pub vetoed: AtomicU64,
    pub runs: AtomicU64,
    pub failures: AtomicU64,
    pub finished: AtomicU64,
    pub cancelled: AtomicU64,
    pub purged: AtomicU64,
}

impl SchedulerCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, registered: usize) -> SchedulerStats {
        SchedulerStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            vetoed: self.vetoed.load(Ordering::Relaxed),
            runs: self.runs.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            finished: self.finished.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            purged: self.purged.load(Ordering::Relaxed),
            registered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = SchedulerStats::default();
        assert_eq!(stats.runs, 0);
        assert_eq!(stats.registered, 0);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = SchedulerCounters::default();
        SchedulerCounters::bump(&counters.admitted);
        SchedulerCounters::bump(&counters.admitted);
        SchedulerCounters::bump(&counters.runs);

        let stats = counters.snapshot(2);
        assert_eq!(stats.admitted, 2);
        assert_eq!(stats.runs, 1);
        assert_eq!(stats.failures, 0);
        assert_eq!(stats.registered, 2);
    }
}
