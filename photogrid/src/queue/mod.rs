//! Keyed, deduplicating, concurrency-bounded fetch queue.
//!
//! [`KeyedFetchQueue`] admits at most one fetch per [`PositionKey`], runs at
//! most `capacity` fetches at a time in admission order, and reports each
//! admitted fetch's outcome to the caller's completion callback.
//!
//! # Architecture
//!
//! ```text
//! submit(key) ──► in-flight table ──► FIFO channel ──► dispatcher ──► worker
//!                 (one Mutex)                         (waits for      (FetchTask::run)
//!                      ▲                               a slot)             │
//!                      └───────── remove if still mine ◄──────────────────┘
//!                                        │
//!                                        ▼
//!                                  on_complete(outcome)
//! ```
//!
//! # Delivery rules
//!
//! - A worker removes its table entry before invoking the callback, so a
//!   callback that resubmits the same key is admitted.
//! - A worker whose entry is gone (cancelled, or replaced after a cancel)
//!   drops its outcome. This is how `cancel_all` suppresses callbacks.
//! - `cancel(key)` removes the entry and invokes its callback with
//!   [`FetchOutcome::Cancelled`] on the calling thread.
//! - `submit` and `cancel_all` serialize on the table lock: a submit that
//!   takes the lock first is cancelled with the batch, one that takes it
//!   afterwards is admitted normally.
//!
//! Callbacks run on a tokio worker thread (or the thread calling `cancel`)
//! and must hand results to their own rendering context.

mod stats;

pub use stats::QueueStats;

use crate::config::FetchConfig;
use crate::fetch::{AsyncHttpClient, FetchOutcome, FetchTask, TaskState};
use crate::key::PositionKey;
use stats::StatsCounters;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Completion callback invoked with a fetch's outcome.
pub type Completion = Box<dyn FnOnce(FetchOutcome) + Send + 'static>;

/// One admitted fetch in the in-flight table.
struct Entry {
    /// Admission id; distinguishes this fetch from later ones for the same key
    id: u64,
    state: TaskState,
    token: CancellationToken,
    on_complete: Completion,
}

#[derive(Default)]
struct Table {
    entries: HashMap<PositionKey, Entry>,
    next_id: u64,
}

/// A fetch waiting in the dispatch channel.
struct Job {
    id: u64,
    task: FetchTask,
}

struct Shared<C> {
    client: C,
    timeout: Duration,
    capacity: usize,
    slots: Arc<Semaphore>,
    table: Mutex<Table>,
    stats: StatsCounters,
}

impl<C: AsyncHttpClient> Shared<C> {
    fn lock_table(&self) -> MutexGuard<'_, Table> {
        // Table operations never panic mid-update, so a poisoned lock still
        // holds a consistent table.
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves an entry from `Pending` to `Running` if it is still ours.
    fn mark_running(&self, key: PositionKey, id: u64) -> bool {
        let mut table = self.lock_table();
        match table.entries.get_mut(&key) {
            Some(entry) if entry.id == id => {
                entry.state = TaskState::Running;
                true
            }
            _ => false,
        }
    }

    /// Removes the entry if it is still ours, then delivers the outcome.
    fn complete(&self, key: PositionKey, id: u64, outcome: FetchOutcome) {
        let entry = {
            let mut table = self.lock_table();
            match table.entries.get(&key) {
                Some(entry) if entry.id == id => table.entries.remove(&key),
                _ => None,
            }
        };

        match entry {
            Some(entry) => {
                debug!(
                    key = %key,
                    state = ?outcome.terminal_state(),
                    success = outcome.is_success(),
                    "Fetch finished"
                );
                self.stats.record_delivered();
                (entry.on_complete)(outcome);
            }
            None => {
                self.stats.record_discarded();
                debug!(key = %key, "Discarding outcome for fetch no longer in flight");
            }
        }
    }

    async fn run_job(self: Arc<Self>, job: Job, permit: OwnedSemaphorePermit) {
        let key = job.task.key();
        if !self.mark_running(key, job.id) {
            return;
        }

        let outcome = {
            let _running = self.stats.start_running();
            job.task.run(&self.client, self.timeout).await
        };
        drop(permit);

        self.complete(key, job.id, outcome);
    }
}

/// Pops jobs in admission order and starts each one when a slot frees up.
async fn dispatch<C: AsyncHttpClient>(
    shared: Arc<Shared<C>>,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    handle: Handle,
) {
    while let Some(job) = jobs.recv().await {
        if job.task.is_cancelled() {
            continue;
        }

        let permit = tokio::select! {
            biased;
            _ = job.task.token().cancelled() => continue,
            permit = shared.slots.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        handle.spawn(Arc::clone(&shared).run_job(job, permit));
    }
    debug!("Fetch dispatcher stopped");
}

/// Deduplicating fetch queue keyed by grid position.
///
/// Owns the transport client, the worker slots and the dispatcher. Dropping
/// the queue cancels everything still in flight without delivering outcomes.
pub struct KeyedFetchQueue<C: AsyncHttpClient> {
    shared: Arc<Shared<C>>,
    jobs: mpsc::UnboundedSender<Job>,
}

impl<C: AsyncHttpClient> KeyedFetchQueue<C> {
    /// Creates a queue on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime; use
    /// [`with_handle`](Self::with_handle) from plain threads.
    pub fn new(client: C, config: &FetchConfig) -> Self {
        Self::with_handle(Handle::current(), client, config)
    }

    /// Creates a queue whose dispatcher and workers run on `handle`.
    pub fn with_handle(handle: Handle, client: C, config: &FetchConfig) -> Self {
        let capacity = config.max_concurrent().max(1);
        let shared = Arc::new(Shared {
            client,
            timeout: config.timeout(),
            capacity,
            slots: Arc::new(Semaphore::new(capacity)),
            table: Mutex::new(Table::default()),
            stats: StatsCounters::default(),
        });

        let (jobs, rx) = mpsc::unbounded_channel();
        handle.spawn(dispatch(Arc::clone(&shared), rx, handle.clone()));

        debug!(
            capacity = capacity,
            timeout = ?config.timeout(),
            "Fetch queue created"
        );

        Self { shared, jobs }
    }

    /// Requests a fetch of `source` for `key`.
    ///
    /// If `key` is already in flight this is a no-op: `on_complete` is dropped
    /// without being called and `false` is returned. Otherwise the fetch is
    /// admitted, `on_complete` will be called at most once, and `true` is
    /// returned. Never blocks on I/O.
    pub fn submit<F>(&self, key: PositionKey, source: impl Into<String>, on_complete: F) -> bool
    where
        F: FnOnce(FetchOutcome) + Send + 'static,
    {
        self.shared.stats.record_submitted();

        let mut table = self.shared.lock_table();
        if table.entries.contains_key(&key) {
            self.shared.stats.record_deduplicated();
            debug!(key = %key, "Fetch already in flight, ignoring submission");
            return false;
        }

        let id = table.next_id;
        table.next_id += 1;

        let task = FetchTask::new(key, source);
        table.entries.insert(
            key,
            Entry {
                id,
                state: TaskState::Pending,
                token: task.token().clone(),
                on_complete: Box::new(on_complete),
            },
        );

        // Sent under the lock so channel order matches admission order.
        if self.jobs.send(Job { id, task }).is_err() {
            let entry = table.entries.remove(&key);
            drop(table);
            warn!(key = %key, "Fetch dispatcher is gone, cancelling submission");
            if let Some(entry) = entry {
                self.shared.stats.record_cancelled(1);
                self.shared.stats.record_delivered();
                (entry.on_complete)(FetchOutcome::Cancelled);
            }
            return true;
        }

        debug!(key = %key, in_flight = table.entries.len(), "Fetch admitted");
        true
    }

    /// Cancels the fetch for `key`, if any.
    ///
    /// The removed fetch's callback is invoked with
    /// [`FetchOutcome::Cancelled`] before this returns; whatever the task
    /// itself produces later is discarded. Returns `false` if `key` was not
    /// in flight.
    pub fn cancel(&self, key: PositionKey) -> bool {
        let entry = {
            let mut table = self.shared.lock_table();
            let entry = table.entries.remove(&key);
            if let Some(entry) = &entry {
                entry.token.cancel();
            }
            entry
        };

        match entry {
            Some(entry) => {
                debug!(key = %key, state = ?entry.state, "Fetch cancelled");
                self.shared.stats.record_cancelled(1);
                self.shared.stats.record_delivered();
                (entry.on_complete)(FetchOutcome::Cancelled);
                true
            }
            None => false,
        }
    }

    /// Cancels every in-flight fetch and empties the table.
    ///
    /// No callback of a fetch cancelled this way is ever invoked. Returns the
    /// number of fetches cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Entry> = {
            let mut table = self.shared.lock_table();
            let drained: Vec<Entry> = table.entries.drain().map(|(_, entry)| entry).collect();
            for entry in &drained {
                entry.token.cancel();
            }
            drained
        };

        let count = drained.len();
        if count > 0 {
            self.shared.stats.record_cancelled(count as u64);
            debug!(cancelled = count, "Cancelled all in-flight fetches");
        }
        // Callbacks are dropped here, outside the lock.
        drop(drained);
        count
    }

    /// Returns true if a fetch for `key` is admitted and not yet finished.
    pub fn is_in_flight(&self, key: PositionKey) -> bool {
        self.shared.lock_table().entries.contains_key(&key)
    }

    /// Returns the lifecycle state of the fetch for `key`, if in flight.
    pub fn task_state(&self, key: PositionKey) -> Option<TaskState> {
        self.shared.lock_table().entries.get(&key).map(|e| e.state)
    }

    /// Number of admitted, unfinished fetches (queued and running).
    pub fn in_flight_count(&self) -> usize {
        self.shared.lock_table().entries.len()
    }

    /// Sorted snapshot of the in-flight keys.
    pub fn in_flight_keys(&self) -> Vec<PositionKey> {
        let mut keys: Vec<PositionKey> = self.shared.lock_table().entries.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Number of fetches currently holding a worker slot.
    pub fn running_count(&self) -> usize {
        self.shared.stats.running()
    }

    /// Maximum number of simultaneously running fetches.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.shared.timeout
    }

    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> QueueStats {
        self.shared.stats.snapshot()
    }

    /// Logs current statistics.
    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            submitted = stats.submitted,
            deduplicated = stats.deduplicated,
            delivered = stats.delivered,
            cancelled = stats.cancelled,
            discarded = stats.discarded,
            in_flight = self.in_flight_count(),
            peak_running = stats.peak_running,
            capacity = self.capacity(),
            "Fetch queue statistics"
        );
    }
}

impl<C: AsyncHttpClient> Drop for KeyedFetchQueue<C> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl<C: AsyncHttpClient> fmt::Debug for KeyedFetchQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedFetchQueue")
            .field("capacity", &self.capacity())
            .field("in_flight", &self.in_flight_count())
            .field("running", &self.running_count())
            .finish()
    }
}
