//! Queue statistics.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Statistics for monitoring queue behaviour.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueueStats {
    /// `submit` calls received
    pub submitted: u64,
    /// Submissions dropped because the key was already in flight
    pub deduplicated: u64,
    /// Outcomes handed to a completion callback (including `Cancelled` from `cancel`)
    pub delivered: u64,
    /// Tasks cancelled through `cancel` or `cancel_all`
    pub cancelled: u64,
    /// Outcomes produced after their table entry was gone
    pub discarded: u64,
    /// Fetches running right now
    pub running: usize,
    /// Highest number of simultaneously running fetches observed
    pub peak_running: usize,
}

impl QueueStats {
    /// Returns the share of submissions that were deduplicated (0.0 to 1.0).
    pub fn dedup_ratio(&self) -> f64 {
        if self.submitted == 0 {
            0.0
        } else {
            self.deduplicated as f64 / self.submitted as f64
        }
    }
}

/// Lock-free counters behind [`QueueStats`].
#[derive(Debug, Default)]
pub(super) struct StatsCounters {
    submitted: AtomicU64,
    deduplicated: AtomicU64,
    delivered: AtomicU64,
    cancelled: AtomicU64,
    discarded: AtomicU64,
    running: AtomicUsize,
    peak_running: AtomicUsize,
}

impl StatsCounters {
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deduplicated(&self) {
        self.deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self, count: u64) {
        self.cancelled.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks one fetch as running until the returned guard drops.
    pub fn start_running(&self) -> RunningGuard<'_> {
        let current = self.running.fetch_add(1, Ordering::SeqCst) + 1;

        let mut peak = self.peak_running.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_running.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }

        RunningGuard {
            running: &self.running,
        }
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> QueueStats {
        QueueStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            running: self.running(),
            peak_running: self.peak_running.load(Ordering::Relaxed),
        }
    }
}

/// Decrements the running count on drop.
pub(super) struct RunningGuard<'a> {
    running: &'a AtomicUsize,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }
}
